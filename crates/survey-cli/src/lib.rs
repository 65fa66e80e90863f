//! CLI library components for the survey scorer.

pub mod config;
pub mod logging;
pub mod pipeline;
