//! Utility modules

pub mod fill;
pub mod log;
pub mod time;
