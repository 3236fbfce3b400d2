//! Run configuration
//!
//! Immutable for the whole run. The derived values (`available_slots`,
//! `seeks_per_worker`) are pure functions of the configured sizes and are
//! computed on demand; validation guarantees they are well defined.

pub mod cli;
pub mod validator;

use std::path::PathBuf;

/// Number of random-read slots reserved at the tail of each file so no seek
/// reads past end-of-file.
const SLOT_MARGIN: u64 = 2;

/// Minimum number of seek-and-read iterations per worker in the random phase.
const MIN_SEEKS: u64 = 5000;

/// Immutable configuration for one benchmark run
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker threads, each with its own test file
    pub threads: usize,
    /// Target size of each test file in bytes
    pub file_size: u64,
    /// Buffer/block size in bytes for all reads and writes
    pub buffer_size: usize,
    /// Directory the test files are created in
    pub dir: PathBuf,
    /// Emit the final report as JSON instead of text
    pub json: bool,
    /// Leave test files on disk after the run
    pub keep_files: bool,
}

impl Config {
    /// Default worker count: twice the available parallelism
    pub fn default_threads() -> usize {
        num_cpus::get() * 2
    }

    /// Buffer-aligned random-access positions usable in each file
    ///
    /// A margin of two slots is reserved so no random seek reads past EOF.
    pub fn available_slots(&self) -> u64 {
        (self.file_size / self.buffer_size as u64).saturating_sub(SLOT_MARGIN)
    }

    /// Seek-and-read iterations each worker performs in the random phase
    pub fn seeks_per_worker(&self) -> u64 {
        (self.available_slots() / 1000).max(MIN_SEEKS)
    }

    /// Path of the test file owned by worker `id`
    pub fn file_path(&self, id: usize) -> PathBuf {
        self.dir.join(format!("bench{}.dat", id))
    }
}
