use crate::core::types::QueryType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query '{query}' failed: {message}")]
    QueryExecution { query: String, message: String },

    #[error("Query '{query}' resolved an empty metric name")]
    InvalidMetricName { query: String },

    #[error("Failed to push metric '{name}': {message}")]
    Push { name: String, message: String },

    #[error("cannot handle query type '{0}' (yet)")]
    UnsupportedType(QueryType),

    #[error("unknown query type '{0}'")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] prometheus::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new query execution error
    pub fn query<Q: Into<String>, S: Into<String>>(query: Q, msg: S) -> Self {
        Self::QueryExecution {
            query: query.into(),
            message: msg.into(),
        }
    }

    /// Creates a new push error
    pub fn push<N: Into<String>, S: Into<String>>(name: N, msg: S) -> Self {
        Self::Push {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Returns true if this error only affects the current tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::QueryExecution { .. }
            | Self::InvalidMetricName { .. }
            | Self::Push { .. }
            | Self::UnsupportedType(_)
            | Self::UnknownType(_) => true,
            Self::Io(e) => !matches!(e.kind(), std::io::ErrorKind::AddrInUse),
            _ => false,
        }
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::QueryExecution { .. } => "query",
            Self::InvalidMetricName { .. } => "invalid-name",
            Self::Push { .. } => "push",
            Self::UnsupportedType(_) | Self::UnknownType(_) => "type",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Telemetry(_) => "telemetry",
            Self::Join(_) => "async",
        }
    }
}
