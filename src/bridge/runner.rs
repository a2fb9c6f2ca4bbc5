//! Execution of a single query for one tick.

use super::dispatch::Dispatcher;
use super::transform::transform;
use crate::backend::QueryBackend;
use crate::core::{Query, Result};
use crate::push::PushClient;
use crate::telemetry::{Telemetry, REASON_INVALID_NAME};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Runs queries against the backend and forwards their series.
#[derive(Clone)]
pub struct QueryRunner {
    backend: Arc<dyn QueryBackend>,
    dispatcher: Dispatcher,
    telemetry: Arc<Telemetry>,
}

impl QueryRunner {
    /// Create a runner wired to the given backend, push client and counters.
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        push: Arc<dyn PushClient>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::new(push, Arc::clone(&telemetry)),
            telemetry,
        }
    }

    /// Evaluate `query` at `at` and push every returned series.
    ///
    /// Series are handled in backend order. The first failing series ends
    /// the run and its error is returned; series after it are not pushed.
    pub async fn run(&self, query: &Query, at: DateTime<Utc>) -> Result<usize> {
        let results = match self.backend.query(query.query(), at).await {
            Ok(results) => results,
            Err(e) => {
                self.telemetry.record_failed_query(query.query());
                return Err(e);
            },
        };

        let mut pushed = 0;
        for series in &results {
            let sample = match transform(series, query) {
                Ok(sample) => sample,
                Err(e) => {
                    self.telemetry.record_failed_push(REASON_INVALID_NAME);
                    return Err(e);
                },
            };

            self.dispatcher.dispatch(&sample, query.kind()).await?;
            pushed += 1;
        }

        tracing::debug!(query = query.query(), series = results.len(), pushed, "query complete");
        Ok(pushed)
    }
}
