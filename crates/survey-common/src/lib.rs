//! Shared utilities for the survey scoring crates.
//!
//! This crate provides common utilities used across the workspace,
//! mostly Polars value conversions and column extraction helpers.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use self::polars::{
    any_to_f64, any_to_string, column_f64, column_strings, format_numeric, has_column, parse_f64,
    series_f64, series_strings,
};
