//! Configuration validation
//!
//! Rejects configurations before any worker starts. In particular the random
//! read phase needs at least one usable slot: with `file_size / buffer_size`
//! below 3, `available_slots` is zero and the phase is ill-defined.

use crate::config::Config;
use crate::error::MeterError;

/// Validate a run configuration
pub fn validate_config(config: &Config) -> Result<(), MeterError> {
    if config.threads < 1 {
        return Err(MeterError::InvalidConfig(
            "threads must be at least 1".into(),
        ));
    }

    if config.buffer_size == 0 {
        return Err(MeterError::InvalidConfig(
            "buffer size must be positive".into(),
        ));
    }

    if config.file_size <= config.buffer_size as u64 {
        return Err(MeterError::InvalidConfig(format!(
            "file size ({} bytes) must exceed buffer size ({} bytes)",
            config.file_size, config.buffer_size
        )));
    }

    if config.available_slots() < 1 {
        return Err(MeterError::InvalidConfig(format!(
            "file size must hold at least 3 buffers of {} bytes, got {} bytes",
            config.buffer_size, config.file_size
        )));
    }

    if !config.dir.is_dir() {
        return Err(MeterError::InvalidConfig(format!(
            "test file directory does not exist: {}",
            config.dir.display()
        )));
    }

    Ok(())
}
