//! Survey data model definitions.
//!
//! Types shared by the transformation crates and the CLI:
//!
//! - **value**: [`RawValue`], the hashable key used to match raw responses
//! - **options**: [`MatchMode`] and [`CodeType`]
//! - **naming**: [`NameSequence`] for generated encoder/label/scoring names
//! - **error**: [`SurveyError`] and the crate [`Result`] alias

pub mod error;
pub mod naming;
pub mod options;
pub mod value;

pub use error::{Result, SurveyError};
pub use naming::NameSequence;
pub use options::{CodeType, MatchMode, MatchOptions, TransformOptions};
pub use value::RawValue;
