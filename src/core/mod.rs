//! Core domain models, configuration and errors.
//!
//! This module contains the fundamental types shared by the query
//! pipeline, the clients and the command-line front end.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder};
pub use error::{BridgeError, Result};
pub use types::{Query, QueryType, ResultSeries, TransformedSample, METRIC_NAME_LABEL};
