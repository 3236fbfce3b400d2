//! Report output

pub mod json;
pub mod text;
