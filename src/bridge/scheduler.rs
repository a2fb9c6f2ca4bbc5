//! Fixed-interval tick loop over the configured queries.

use super::runner::QueryRunner;
use crate::core::{Query, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Queries run
    pub queries: usize,
    /// Queries that ended with an error
    pub failed: usize,
    /// Series pushed across all queries
    pub pushed: usize,
}

/// Drives the query runner on a fixed interval.
pub struct Scheduler {
    runner: QueryRunner,
    queries: Arc<[Query]>,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler for `queries`, ticking every `interval`.
    pub fn new(runner: QueryRunner, queries: Vec<Query>, interval: Duration) -> Self {
        Self {
            runner,
            queries: queries.into(),
            interval,
        }
    }

    /// Run every query once, in configuration order.
    ///
    /// A failing query is logged and does not stop the ones after it.
    pub async fn run_tick(&self, at: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();
        tracing::debug!(at = %at, queries = self.queries.len(), "tick started");

        for query in self.queries.iter() {
            summary.queries += 1;
            match self.runner.run(query, at).await {
                Ok(pushed) => summary.pushed += pushed,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        query = query.query(),
                        category = e.category(),
                        error = %e,
                        "query failed"
                    );
                },
            }
        }

        tracing::debug!(
            pushed = summary.pushed,
            failed = summary.failed,
            "tick finished"
        );
        summary
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first tick fires one interval after start. Shutdown is only
    /// observed between ticks, so a running tick always completes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.run_tick(Utc::now()).await;
                }
            }
        }

        tracing::info!("scheduler stopped");
    }

    /// Run the loop on a background task.
    pub fn spawn(self) -> SchedulerHandle {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SchedulerHandle { shutdown: tx, task }
    }
}

/// Handle to a spawned scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop accepting ticks, let the current one drain and wait for the task.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.task.await?;
        Ok(())
    }
}
