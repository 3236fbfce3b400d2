//! Error taxonomy
//!
//! Three failure classes cover the whole run: configuration rejected before
//! any worker starts, per-worker IO failures (logged at the worker boundary,
//! never fatal to the process), and a broken rendezvous barrier (one party
//! failed to arrive, all waiters fail).

use thiserror::Error;

/// Errors produced by the benchmark core
#[derive(Debug, Error)]
pub enum MeterError {
    /// Configuration rejected during validation, before any worker starts
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO failure inside a worker phase; degrades that worker's contribution
    /// to the report instead of aborting the run
    #[error("{phase} failed: {source}")]
    Io {
        phase: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A barrier party failed to arrive; every waiter on that barrier fails
    #[error("barrier broken during {0}")]
    BarrierBroken(&'static str),
}

impl MeterError {
    /// Wrap an IO error with the phase it occurred in
    pub fn io(phase: &'static str, source: std::io::Error) -> Self {
        MeterError::Io { phase, source }
    }
}
