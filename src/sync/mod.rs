//! Synchronization primitives

pub mod barrier;

pub use barrier::{Barrier, BrokenBarrier};
