//! Raw response values.
//!
//! Survey answers arrive as whatever dtype the ingested column carries. For
//! matching against an encoding they are reduced to a [`RawValue`], which is
//! hashable and totally ordered. Missing values have no `RawValue`: they map to
//! `None`.

use std::fmt;

use polars::prelude::AnyValue;
use serde::{Deserialize, Serialize};
use survey_common::format_numeric;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl RawValue {
    /// Converts a cell value into a matching key. Returns `None` for nulls.
    ///
    /// Integral floats become [`RawValue::Integer`] so that `4.0` read from a
    /// float column matches an encoding keyed by `4`. Other floats become their
    /// shortest decimal text.
    ///
    /// # Examples
    ///
    /// ```
    /// use polars::prelude::AnyValue;
    /// use survey_model::RawValue;
    ///
    /// assert_eq!(RawValue::from_any(AnyValue::Null), None);
    /// assert_eq!(RawValue::from_any(AnyValue::Float64(4.0)), Some(RawValue::Integer(4)));
    /// assert_eq!(
    ///     RawValue::from_any(AnyValue::String("Agree")),
    ///     Some(RawValue::from("Agree"))
    /// );
    /// ```
    pub fn from_any(value: AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::Null => None,
            AnyValue::Boolean(v) => Some(RawValue::Boolean(v)),
            AnyValue::Int8(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::Int16(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::Int32(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::Int64(v) => Some(RawValue::Integer(v)),
            AnyValue::UInt8(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::UInt16(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::UInt32(v) => Some(RawValue::Integer(i64::from(v))),
            AnyValue::UInt64(v) => Some(match i64::try_from(v) {
                Ok(v) => RawValue::Integer(v),
                Err(_) => RawValue::Text(v.to_string()),
            }),
            AnyValue::Float32(v) => Some(Self::from_float(f64::from(v))),
            AnyValue::Float64(v) => Some(Self::from_float(v)),
            AnyValue::String(s) => Some(RawValue::Text(s.to_string())),
            AnyValue::StringOwned(s) => Some(RawValue::Text(s.to_string())),
            other => Some(RawValue::Text(other.to_string())),
        }
    }

    fn from_float(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
            RawValue::Integer(v as i64)
        } else {
            RawValue::Text(format_numeric(v))
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Boolean(v) => write!(f, "{v}"),
            RawValue::Integer(v) => write!(f, "{v}"),
            RawValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Integer(i64::from(value))
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Integer(i64::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}
