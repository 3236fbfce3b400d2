//! CLI argument parsing using clap

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// iomark - Concurrent local-disk throughput and IOPS benchmark
#[derive(Parser, Debug)]
#[command(name = "iomark")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of worker threads (default: 2x available parallelism)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Size of each worker's test file in MB
    #[arg(short = 's', long, default_value = "2048")]
    pub file_size: u64,

    /// Buffer/block size in bytes
    #[arg(short = 'b', long, default_value = "4096")]
    pub buffer_size: usize,

    /// Directory to create test files in
    #[arg(short = 'd', long, default_value = ".")]
    pub dir: PathBuf,

    /// Emit the final report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Keep test files on disk after the run
    #[arg(long)]
    pub keep_files: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the run configuration from the parsed arguments
    pub fn to_config(&self) -> Config {
        Config {
            threads: self.threads.unwrap_or_else(Config::default_threads),
            file_size: self.file_size * 1024 * 1024,
            buffer_size: self.buffer_size,
            dir: self.dir.clone(),
            json: self.json,
            keep_files: self.keep_files,
        }
    }
}
