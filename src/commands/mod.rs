//! CLI command handlers that sit outside the build pipeline.

pub mod clean;
pub mod doctor;
