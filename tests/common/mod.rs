//! Common test utilities and fixtures.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use prom2statsd_lib::backend::QueryBackend;
use prom2statsd_lib::core::{BridgeError, QueryType, ResultSeries, Result};
use prom2statsd_lib::push::PushClient;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// One call received by [`RecordingPush`].
#[derive(Debug, Clone, PartialEq)]
pub enum PushCall {
    Gauge { name: String, value: f64, tags: Vec<String> },
    Count { name: String, value: i64, tags: Vec<String> },
    Histogram { name: String, value: f64, tags: Vec<String> },
    Timing { name: String, value: f64, tags: Vec<String> },
}

impl PushCall {
    pub fn name(&self) -> &str {
        match self {
            PushCall::Gauge { name, .. }
            | PushCall::Count { name, .. }
            | PushCall::Histogram { name, .. }
            | PushCall::Timing { name, .. } => name,
        }
    }

    pub fn kind(&self) -> QueryType {
        match self {
            PushCall::Gauge { .. } => QueryType::Gauge,
            PushCall::Count { .. } => QueryType::Counter,
            PushCall::Histogram { .. } => QueryType::Histogram,
            PushCall::Timing { .. } => QueryType::Milliseconds,
        }
    }
}

/// Push client that records every call and can fail one metric type.
#[derive(Default)]
pub struct RecordingPush {
    calls: Mutex<Vec<PushCall>>,
    failing: Option<QueryType>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every push of `kind`. Failed calls are not recorded.
    pub fn failing(kind: QueryType) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Some(kind),
        }
    }

    pub fn calls(&self) -> Vec<PushCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PushCall) -> Result<()> {
        if self.failing == Some(call.kind()) {
            return Err(BridgeError::push(call.name(), "agent unreachable"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PushClient for RecordingPush {
    async fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.record(PushCall::Gauge { name: name.to_string(), value, tags: tags.to_vec() })
    }

    async fn count(&self, name: &str, value: i64, tags: &[String]) -> Result<()> {
        self.record(PushCall::Count { name: name.to_string(), value, tags: tags.to_vec() })
    }

    async fn histogram(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.record(PushCall::Histogram { name: name.to_string(), value, tags: tags.to_vec() })
    }

    async fn timing_ms(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.record(PushCall::Timing { name: name.to_string(), value, tags: tags.to_vec() })
    }
}

/// Backend answering from a fixed table of expressions.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: HashMap<String, Vec<ResultSeries>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `expr` with `series`.
    pub fn respond(mut self, expr: &str, series: Vec<ResultSeries>) -> Self {
        self.responses.insert(expr.to_string(), series);
        self
    }

    /// Fail every evaluation of `expr`.
    pub fn fail(mut self, expr: &str) -> Self {
        self.failing.insert(expr.to_string());
        self
    }

    /// Expressions evaluated so far, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
    }
}

#[async_trait::async_trait]
impl QueryBackend for ScriptedBackend {
    async fn query(&self, expr: &str, at: DateTime<Utc>) -> Result<Vec<ResultSeries>> {
        self.calls.lock().unwrap().push((expr.to_string(), at));
        if self.failing.contains(expr) {
            return Err(BridgeError::query(expr, "connection refused"));
        }
        Ok(self.responses.get(expr).cloned().unwrap_or_default())
    }
}

/// Build a series from label pairs.
pub fn series(labels: &[(&str, &str)], value: f64) -> ResultSeries {
    let labels: BTreeMap<String, String> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ResultSeries::new(labels, value, Utc::now())
}
