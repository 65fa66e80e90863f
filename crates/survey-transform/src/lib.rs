//! Survey response transformation.
//!
//! This crate turns raw survey answers into numeric scores and categorical labels:
//!
//! - **encoder**: [`Encoder`], a value-to-code mapping with optional default and neutral code
//! - **matching**: observed-value sets and the `any`/`strict` membership tests
//! - **multi_encoder**: [`MultiEncoder`], first-match selection among several encoders
//! - **label**: [`Label`], interval and quantile classification of scores
//! - **scoring**: [`Scoring`], encoder bindings aggregated into one score per respondent
//! - **questionnaire**: [`Questionnaire`], cached transform/score/label views over a table

pub mod encoder;
pub mod label;
pub mod matching;
pub mod multi_encoder;
pub mod questionnaire;
pub mod scoring;

pub use encoder::{Encoded, Encoder, EncoderBuilder, EncodingRules, NEUTRAL_COUNT_COLUMN};
pub use label::{Interval, Label, LabelRule};
pub use multi_encoder::MultiEncoder;
pub use questionnaire::{DEFAULT_KEY_COLUMN, Questionnaire};
pub use scoring::{Binding, Scoring, ScoringBuilder, ScoringSource};
