use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("expected argument 'encoding' or a template encoder")]
    MissingEncoding,

    #[error("encoder {name} has an empty encoding")]
    EmptyEncoding { name: String },

    #[error("encoder {name}: {field} {value} is not a whole number but the dtype is int")]
    NonIntegralCode {
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("expected at least one encoder")]
    EmptyMultiEncoder,

    #[error("scoring {name} needs either encoder bindings or raw columns")]
    MissingScoringSource { name: String },

    #[error("scoring {name} accepts encoder bindings or raw columns, not both")]
    ConflictingScoringSource { name: String },

    #[error("column {column} is bound more than once in scoring {scoring}")]
    OverlappingBinding { scoring: String, column: String },

    #[error("scoring {name} appears more than once")]
    DuplicateScoring { name: String },

    #[error("derived column '{column}' is produced twice or collides with the key column")]
    DerivedColumnClash { column: String },

    #[error("matching mode can only be 'strict' or 'any', got '{mode}'")]
    InvalidMode { mode: String },

    #[error("unsupported code type '{value}' (expected int or float)")]
    InvalidCodeType { value: String },

    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("label {name} has no categories")]
    EmptyLabel { name: String },

    #[error("label {label}: interval for {category} is invalid ([{low}, {high}])")]
    InvalidInterval {
        label: String,
        category: String,
        low: f64,
        high: f64,
    },

    #[error("label {label}: cannot build quantile bins ({message})")]
    QuantileBins { label: String, message: String },

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
