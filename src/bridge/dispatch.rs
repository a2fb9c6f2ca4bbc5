//! Routing of transformed samples to the matching push call.

use crate::core::{BridgeError, QueryType, Result, TransformedSample};
use crate::push::PushClient;
use crate::telemetry::{PushedKey, Telemetry, REASON_FAILED_PUSH};
use std::sync::Arc;

/// Issues exactly one push call per sample and records the outcome.
#[derive(Clone)]
pub struct Dispatcher {
    push: Arc<dyn PushClient>,
    telemetry: Arc<Telemetry>,
}

impl Dispatcher {
    /// Create a dispatcher over `push`, counting into `telemetry`.
    pub fn new(push: Arc<dyn PushClient>, telemetry: Arc<Telemetry>) -> Self {
        Self { push, telemetry }
    }

    /// Push `sample` as `kind`.
    ///
    /// Counter values are truncated towards zero. A failed push is counted
    /// under `failed-push` and returned to the caller.
    pub async fn dispatch(&self, sample: &TransformedSample, kind: QueryType) -> Result<()> {
        let TransformedSample { name, value, tags } = sample;

        let pushed = match kind {
            QueryType::Gauge => self.push.gauge(name, *value, tags).await,
            #[allow(clippy::cast_possible_truncation)]
            QueryType::Counter => self.push.count(name, *value as i64, tags).await,
            QueryType::Histogram => self.push.histogram(name, *value, tags).await,
            QueryType::Milliseconds => self.push.timing_ms(name, *value, tags).await,
            QueryType::Set => return Err(BridgeError::UnsupportedType(kind)),
        };

        match pushed {
            Ok(()) => {
                self.telemetry.record_pushed(&PushedKey::new(name, kind));
                Ok(())
            },
            Err(e) => {
                self.telemetry.record_failed_push(REASON_FAILED_PUSH);
                Err(e)
            },
        }
    }
}
