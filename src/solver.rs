use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// A solved level: the complete LURD trace from the starting board to the
/// solved board, and the name of the level it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub name: String,
    pub lurd: String,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    #[error("search space exhausted without a solution")]
    NoSolution,
    #[error("search cancelled")]
    Cancelled,
    #[error("free memory fell below the search floor")]
    OutOfMemory,
    #[error("level is deadlocked before the first push")]
    DeadlockAtStart,
}

/// Cooperative cancellation flag shared between a solver and its caller.
/// Solvers probe it between expansions; cancellation takes effect within
/// one expansion per worker.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives human-readable solver status lines.
pub trait ProgressSink: Sync {
    fn publish(&self, status: &str);
}

/// Forwards status lines to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn publish(&self, status: &str) {
        log::info!("{status}");
    }
}

/// Discards all status lines.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _status: &str) {}
}
