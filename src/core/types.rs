//! Domain types shared by the bridge pipeline.

use crate::core::{BridgeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label key that carries a series' own metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Metric type a query's results are pushed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum QueryType {
    /// Point-in-time value
    Gauge,
    /// Integer increment
    Counter,
    /// Sampled distribution
    Histogram,
    /// Unique-value set. Recognised but never accepted.
    Set,
    /// Timing in milliseconds
    Milliseconds,
}

impl QueryType {
    /// Lowercase name used in configuration and telemetry labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Gauge => "gauge",
            QueryType::Counter => "counter",
            QueryType::Histogram => "histogram",
            QueryType::Set => "set",
            QueryType::Milliseconds => "milliseconds",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gauge" => Ok(QueryType::Gauge),
            "counter" => Ok(QueryType::Counter),
            "histogram" => Ok(QueryType::Histogram),
            "milliseconds" => Ok(QueryType::Milliseconds),
            "set" => Err(BridgeError::UnsupportedType(QueryType::Set)),
            other => Err(BridgeError::UnknownType(other.to_string())),
        }
    }
}

impl TryFrom<String> for QueryType {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// One configured query. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    #[serde(rename = "type")]
    kind: QueryType,
    name: String,
    query: String,
}

#[derive(Deserialize)]
struct RawQuery {
    #[serde(rename = "type")]
    kind: QueryType,
    #[serde(default)]
    name: String,
    query: String,
}

impl TryFrom<RawQuery> for Query {
    type Error = BridgeError;

    fn try_from(raw: RawQuery) -> Result<Self> {
        Query::new(raw.kind, raw.name, raw.query)
    }
}

impl Query {
    /// Build a query, rejecting `set` and empty expressions.
    pub fn new(kind: QueryType, name: impl Into<String>, query: impl Into<String>) -> Result<Self> {
        if kind == QueryType::Set {
            return Err(BridgeError::config(BridgeError::UnsupportedType(kind).to_string()));
        }

        let query = query.into();
        if query.trim().is_empty() {
            return Err(BridgeError::config(format!(
                "query expression for {kind} query must not be empty"
            )));
        }

        Ok(Self {
            kind,
            name: name.into(),
            query,
        })
    }

    /// Parse the command-line form `TYPE:EXPR` or `TYPE/NAME:EXPR`.
    ///
    /// Only the first `:` separates the type from the expression, so
    /// recording-rule names such as `job:up:sum` survive intact.
    pub fn from_flag(value: &str) -> Result<Self> {
        let (head, expr) = value.split_once(':').ok_or_else(|| {
            BridgeError::config(format!(
                "query '{value}' must be in the form TYPE:EXPR or TYPE/NAME:EXPR"
            ))
        })?;

        let (kind, name) = match head.split_once('/') {
            Some((kind, name)) => (kind, name),
            None => (head, ""),
        };

        let kind = kind
            .parse::<QueryType>()
            .map_err(|e| BridgeError::config(format!("{e} ({value})")))?;

        Query::new(kind, name, expr)
    }

    /// Declared metric type.
    pub fn kind(&self) -> QueryType {
        self.kind
    }

    /// Default metric name, used when a series carries no `__name__`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend query expression.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// One series of an instant query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSeries {
    /// Label set identifying the series
    pub labels: BTreeMap<String, String>,
    /// Sample value at the query timestamp
    pub value: f64,
    /// Timestamp the value was sampled at
    pub timestamp: DateTime<Utc>,
}

impl ResultSeries {
    /// Create a series from its labels, value and sample time.
    pub fn new(labels: BTreeMap<String, String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            labels,
            value,
            timestamp,
        }
    }
}

/// A series reduced to what the push client needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedSample {
    /// Resolved, trimmed metric name
    pub name: String,
    /// Sample value
    pub value: f64,
    /// `key:value` tags, one per non-name label
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_parsing() {
        assert_eq!("gauge".parse::<QueryType>().unwrap(), QueryType::Gauge);
        assert_eq!("Counter".parse::<QueryType>().unwrap(), QueryType::Counter);
        assert_eq!("milliseconds".parse::<QueryType>().unwrap(), QueryType::Milliseconds);
        assert!(matches!(
            "set".parse::<QueryType>(),
            Err(BridgeError::UnsupportedType(QueryType::Set))
        ));
        assert!(matches!("timer".parse::<QueryType>(), Err(BridgeError::UnknownType(t)) if t == "timer"));
    }

    #[test]
    fn test_set_query_rejected() {
        let err = Query::new(QueryType::Set, "users", "count(up)").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
        assert!(err.to_string().contains("cannot handle query type 'set' (yet)"));
    }

    #[test]
    fn test_empty_expression_rejected() {
        assert!(Query::new(QueryType::Gauge, "x", "  ").is_err());
    }

    #[test]
    fn test_flag_without_name() {
        let query = Query::from_flag("gauge:up{job=\"prometheus\"}").unwrap();
        assert_eq!(query.kind(), QueryType::Gauge);
        assert_eq!(query.name(), "");
        assert_eq!(query.query(), "up{job=\"prometheus\"}");
    }

    #[test]
    fn test_flag_with_name_keeps_colons_in_expression() {
        let query = Query::from_flag("counter/reqs:job:http_requests:rate5m").unwrap();
        assert_eq!(query.kind(), QueryType::Counter);
        assert_eq!(query.name(), "reqs");
        assert_eq!(query.query(), "job:http_requests:rate5m");
    }

    #[test]
    fn test_flag_errors() {
        assert!(matches!(Query::from_flag("up"), Err(BridgeError::Config(_))));
        let err = Query::from_flag("set:count(up)").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
        assert!(err.to_string().contains("'set'"));
        let err = Query::from_flag("timer:up").unwrap_err();
        assert!(err.to_string().contains("unknown query type 'timer'"));
    }
}
