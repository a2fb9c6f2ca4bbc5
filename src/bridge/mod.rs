//! The per-tick query pipeline.
//!
//! Each tick the [`Scheduler`] hands every configured query, in order, to
//! the [`QueryRunner`]. The runner fetches the query's series, turns each
//! one into a sample with [`transform`] and pushes it through the
//! [`Dispatcher`]. Errors end the current query only.

pub mod dispatch;
pub mod runner;
pub mod scheduler;
pub mod transform;

pub use dispatch::Dispatcher;
pub use runner::QueryRunner;
pub use scheduler::{Scheduler, SchedulerHandle, TickSummary};
pub use transform::transform;
