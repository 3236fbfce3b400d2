//! Timestamped log lines
//!
//! All user-visible progress output goes through a single `log` entry point
//! that prefixes each line with a wall-clock timestamp and the emitting
//! thread's name, so interleaved worker output stays attributable.

use chrono::Local;

/// Emit one timestamped, thread-attributed log line to stderr
///
/// Format: `yymmdd-HH:MM:SS.mmm [thread-name] message`. Diagnostics go to
/// stderr so the report on stdout stays machine-readable in JSON mode.
pub fn log(message: &str) {
    let timestamp = Local::now().format("%y%m%d-%H:%M:%S%.3f");
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("?");
    eprintln!("{} [{}] {}", timestamp, name, message);
}
