//! iomark - Concurrent local-disk throughput and IOPS benchmark
//!
//! iomark drives a configurable number of worker threads; each worker creates
//! its own large test file and then measures sequential-read and random-read
//! throughput against it. All workers advance in lockstep through the run
//! phases so the OS page cache is in a comparable state for every measurement.
//!
//! # Architecture
//!
//! - **Two-phase barrier protocol**: no read test starts before every worker
//!   has finished creating its file, and reporting never observes a partially
//!   finished run
//! - **Shared IOPS counter**: per-second operation counts across all workers,
//!   two-level locking with atomic buckets so the common-case increment never
//!   blocks on the creation locks
//! - **Deferred reporting**: a guard around the run aggregates and prints the
//!   final report even when the run unwinds early

pub mod config;
pub mod coordinator;
pub mod error;
pub mod output;
pub mod stats;
pub mod sync;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::MeterError;

/// Result type used throughout iomark
pub type Result<T> = anyhow::Result<T>;
