//! Query backend seam and the Prometheus HTTP API client.

use crate::core::{BridgeError, ResultSeries, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Source of instant-query results.
#[async_trait::async_trait]
pub trait QueryBackend: Send + Sync {
    /// Evaluate `expr` at `at` and return the resulting series in
    /// backend order.
    async fn query(&self, expr: &str, at: DateTime<Utc>) -> Result<Vec<ResultSeries>>;
}

/// Client for the Prometheus `/api/v1/query` endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    status: String,
    data: Option<QueryData>,
    error_type: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

impl PrometheusClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into();
        tracing::debug!(base_url = %base_url, ?timeout, "Prometheus client initialized");

        Ok(Self { client, base_url })
    }

    fn query_url(&self) -> String {
        format!("{}/api/v1/query", self.base_url)
    }
}

#[async_trait::async_trait]
impl QueryBackend for PrometheusClient {
    async fn query(&self, expr: &str, at: DateTime<Utc>) -> Result<Vec<ResultSeries>> {
        let time = format!("{:.3}", at.timestamp_millis() as f64 / 1000.0);

        let resp = self
            .client
            .get(self.query_url())
            .query(&[("query", expr), ("time", time.as_str())])
            .send()
            .await
            .map_err(|e| BridgeError::query(expr, e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| BridgeError::query(expr, e.to_string()))?;

        let parsed: ApiResponse = serde_json::from_slice(&body).map_err(|e| {
            BridgeError::query(expr, format!("unexpected response (HTTP {}): {}", status, e))
        })?;

        decode_response(expr, at, parsed)
    }
}

fn decode_response(expr: &str, at: DateTime<Utc>, resp: ApiResponse) -> Result<Vec<ResultSeries>> {
    if resp.status != "success" {
        return Err(BridgeError::query(
            expr,
            format!(
                "{}: {}",
                resp.error_type.as_deref().unwrap_or("error"),
                resp.error.as_deref().unwrap_or("unknown error")
            ),
        ));
    }

    let data = resp
        .data
        .ok_or_else(|| BridgeError::query(expr, "response carried no data"))?;

    if data.result_type != "vector" {
        return Err(BridgeError::query(
            expr,
            format!("expected a vector result, got '{}'", data.result_type),
        ));
    }

    let samples: Vec<VectorSample> = serde_json::from_value(data.result)
        .map_err(|e| BridgeError::query(expr, format!("malformed vector result: {}", e)))?;

    samples
        .into_iter()
        .map(|sample| {
            let (ts, raw) = sample.value;
            let value = parse_sample_value(&raw)
                .ok_or_else(|| BridgeError::query(expr, format!("invalid sample value '{}'", raw)))?;
            #[allow(clippy::cast_possible_truncation)]
            let timestamp = DateTime::from_timestamp_millis((ts * 1000.0).round() as i64).unwrap_or(at);
            Ok(ResultSeries::new(sample.metric, value, timestamp))
        })
        .collect()
}

/// Parse a sample value as Prometheus renders it (`1`, `NaN`, `+Inf`, ...).
fn parse_sample_value(raw: &str) -> Option<f64> {
    match raw {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}
