//! Configuration options for encoding survey columns.

use std::fmt;
use std::str::FromStr;

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Membership rule deciding whether an encoder applies to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every observed value must be a known response (subset test).
    #[default]
    Any,
    /// The observed values must be exactly the known responses (set equality).
    Strict,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Any => "any",
            MatchMode::Strict => "strict",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(MatchMode::Any),
            "strict" => Ok(MatchMode::Strict),
            other => Err(SurveyError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Output dtype of an encoded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    #[serde(alias = "int64")]
    Int,
    #[default]
    #[serde(alias = "float64")]
    Float,
}

impl CodeType {
    pub fn data_type(self) -> DataType {
        match self {
            CodeType::Int => DataType::Int64,
            CodeType::Float => DataType::Float64,
        }
    }
}

impl FromStr for CodeType {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "int64" => Ok(CodeType::Int),
            "float" | "float64" => Ok(CodeType::Float),
            other => Err(SurveyError::InvalidCodeType {
                value: other.to_string(),
            }),
        }
    }
}

/// Options for encoding a whole table with a single encoder.
///
/// When `columns` is set, exactly those columns are encoded and `mode` is not
/// consulted. `ignore` always applies, whether columns are explicit or matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub columns: Option<Vec<String>>,
    pub ignore: Vec<String>,
    pub mode: MatchMode,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore.iter().any(|name| name == column)
    }
}

/// Options for auto-matching a table against several encoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub ignore: Vec<String>,
    pub mode: MatchMode,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore.iter().any(|name| name == column)
    }
}
