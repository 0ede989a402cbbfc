//! Shutdown driver.
//!
//! Stops every active listener concurrently and waits for all of them, but
//! never past the deadline.

use std::future::Future;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::time::Instant;

/// Failure of a single listener's graceful stop.
#[derive(Debug, Error)]
pub enum StopError {
    /// The serving task panicked.
    #[error("listener task panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Something that can be drained and stopped.
pub trait Stoppable: Send + 'static {
    /// Human-readable identity for logs.
    fn label(&self) -> String;

    /// Stop accepting, let in-flight work finish within `grace`, then return.
    ///
    /// An already-closed target must return `Ok(())`.
    fn stop(self, grace: Duration) -> impl Future<Output = Result<(), StopError>> + Send;
}

/// Outcome of [`shutdown_all`]. Only ever logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub stopped: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.timed_out == 0
    }
}

/// Stop all `targets` concurrently, returning once all finished or the
/// deadline passed.
///
/// A failing stop is logged and does not affect the others. Stops still
/// running at the deadline are abandoned.
pub async fn shutdown_all<T: Stoppable>(deadline: Instant, targets: Vec<T>) -> ShutdownReport {
    let mut pending: FuturesUnordered<_> = targets
        .into_iter()
        .map(|target| async move {
            let label = target.label();
            let grace = deadline.saturating_duration_since(Instant::now());
            tracing::info!(addr = %label, "shutting down");

            match target.stop(grace).await {
                Ok(()) => {
                    tracing::info!(addr = %label, "stopped");
                    true
                }
                Err(e) => {
                    tracing::error!(addr = %label, error = %e, "shutdown error");
                    false
                }
            }
        })
        .collect();

    let mut report = ShutdownReport::default();
    loop {
        match tokio::time::timeout_at(deadline, pending.next()).await {
            Ok(Some(true)) => report.stopped += 1,
            Ok(Some(false)) => report.failed += 1,
            Ok(None) => break,
            Err(_) => {
                report.timed_out = pending.len();
                tracing::warn!(abandoned = report.timed_out, "shutdown deadline exceeded");
                break;
            }
        }
    }
    report
}
