//! prom2statsd - Prometheus to DogStatsD metrics bridge.
//!
//! prom2statsd evaluates a fixed set of Prometheus instant queries on an
//! interval and pushes every resulting series to a DogStatsD agent as a
//! gauge, counter, histogram or timing, tagged with the series' labels.
//!
//! # Architecture
//!
//! - `core`: Domain types, configuration and errors
//! - `bridge`: Transform, dispatch, per-query runner and scheduler
//! - `backend`: Query backend trait and Prometheus HTTP client
//! - `push`: Push client trait and DogStatsD UDP client
//! - `telemetry`: The bridge's own outcome counters
//! - `api`: HTTP scrape endpoint for those counters
//! - `cli`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use prom2statsd_lib::core::{ConfigBuilder, Query, QueryType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new()
//!         .query(Query::new(QueryType::Gauge, "", "up")?)
//!         .build()?;
//!     prom2statsd_lib::cli::run(config).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod backend;
pub mod bridge;
pub mod cli;
pub mod core;
pub mod push;
pub mod telemetry;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
