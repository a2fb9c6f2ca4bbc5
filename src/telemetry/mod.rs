//! Self-telemetry: outcome counters exposed for scraping.
//!
//! A [`Telemetry`] handle owns its own `prometheus::Registry` instead of
//! the process-global default, so every test can build an isolated one.

use crate::core::{QueryType, Result};
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Failure reason for a series whose resolved name is empty.
pub const REASON_INVALID_NAME: &str = "invalid-name";
/// Failure reason for a push call that returned an error.
pub const REASON_FAILED_PUSH: &str = "failed-push";

/// Label values of the pushed-metrics counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedKey {
    /// Name the series was read as
    pub source: String,
    /// Name the value was pushed as
    pub destination: String,
    /// Query type string
    pub kind: &'static str,
}

impl PushedKey {
    /// Key for a sample pushed under its resolved name.
    ///
    /// There is no remapping step, so source and destination coincide.
    pub fn new(name: &str, kind: QueryType) -> Self {
        Self {
            source: name.to_string(),
            destination: name.to_string(),
            kind: kind.as_str(),
        }
    }

    fn label_values(&self) -> [&str; 3] {
        [&self.source, &self.destination, self.kind]
    }

    fn label_pairs(&self) -> [(&str, &str); 3] {
        [
            ("source", &self.source),
            ("destination", &self.destination),
            ("type", self.kind),
        ]
    }
}

/// Outcome counters of the bridge.
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    pushed_metrics: IntCounterVec,
    failed_queries: IntCounterVec,
    failed_pushed_metrics: IntCounterVec,
}

impl Telemetry {
    /// Create the counters and register them in a fresh registry.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let pushed_metrics = IntCounterVec::new(
            Opts::new("pushed_metrics_total", "Metrics pushed to the collector")
                .namespace("prom2statsd"),
            &["source", "destination", "type"],
        )?;

        let failed_queries = IntCounterVec::new(
            Opts::new("failed_queries_total", "Backend queries that returned an error")
                .namespace("prom2statsd"),
            &["query"],
        )?;

        let failed_pushed_metrics = IntCounterVec::new(
            Opts::new("failed_pushed_metrics_total", "Series that could not be pushed")
                .namespace("prom2statsd"),
            &["reason"],
        )?;

        registry.register(Box::new(pushed_metrics.clone()))?;
        registry.register(Box::new(failed_queries.clone()))?;
        registry.register(Box::new(failed_pushed_metrics.clone()))?;

        Ok(Self {
            registry,
            pushed_metrics,
            failed_queries,
            failed_pushed_metrics,
        })
    }

    /// Count one successful push.
    pub fn record_pushed(&self, key: &PushedKey) {
        self.pushed_metrics.with_label_values(&key.label_values()).inc();
    }

    /// Count one failed backend query.
    pub fn record_failed_query(&self, query: &str) {
        self.failed_queries.with_label_values(&[query]).inc();
    }

    /// Count one series that was not pushed.
    pub fn record_failed_push(&self, reason: &str) {
        self.failed_pushed_metrics.with_label_values(&[reason]).inc();
    }

    /// Current value of the pushed-metrics counter for `key`.
    pub fn pushed(&self, key: &PushedKey) -> u64 {
        read_counter(&self.pushed_metrics, &key.label_pairs())
    }

    /// Current value of the failed-queries counter for `query`.
    pub fn failed_queries(&self, query: &str) -> u64 {
        read_counter(&self.failed_queries, &[("query", query)])
    }

    /// Current value of the failed-push counter for `reason`.
    pub fn failed_pushes(&self, reason: &str) -> u64 {
        read_counter(&self.failed_pushed_metrics, &[("reason", reason)])
    }

    /// Encode all counters in the Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Read a counter child without creating it, so lookups never add series
/// to the scrape output. Unset label sets read as zero.
fn read_counter(vec: &IntCounterVec, labels: &[(&str, &str)]) -> u64 {
    vec.collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            let pairs = metric.get_label();
            pairs.len() == labels.len()
                && labels.iter().all(|(name, value)| {
                    pairs
                        .iter()
                        .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
                })
        })
        .map_or(0, |metric| {
            #[allow(clippy::cast_possible_truncation)]
            let value = metric.get_counter().get_value() as u64;
            value
        })
}
