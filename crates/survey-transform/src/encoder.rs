//! Value-to-code encoders.
//!
//! An [`Encoder`] replaces known raw responses with numeric codes. It can be
//! applied to a single series, to an explicit list of columns, or to every
//! column of a table whose observed values match its target set.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};
use survey_common::any_to_f64;
use survey_model::{CodeType, MatchMode, NameSequence, RawValue, Result, SurveyError, TransformOptions};
use tracing::{debug, warn};

use crate::matching::{admits, observed_values};

/// Name of the per-row neutral tally produced by `count_neutral_frame`.
pub const NEUTRAL_COUNT_COLUMN: &str = "Neutral count";

/// Maps a fixed set of raw responses to numeric codes.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoder {
    name: String,
    encoding: BTreeMap<RawValue, f64>,
    default: Option<f64>,
    neutral: Option<f64>,
    dtype: CodeType,
}

/// Builder for [`Encoder`].
///
/// Either an encoding or a template encoder is required. A template supplies
/// its encoding, and its default, neutral code, and dtype unless those are set
/// on the builder. An explicit encoding takes precedence over the template's.
#[derive(Debug, Clone, Default)]
pub struct EncoderBuilder {
    name: Option<String>,
    encoding: Option<BTreeMap<RawValue, f64>>,
    template: Option<Encoder>,
    default: Option<f64>,
    neutral: Option<f64>,
    dtype: Option<CodeType>,
    inverse: bool,
}

impl EncoderBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn encoding<I, K>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<RawValue>,
    {
        self.encoding = Some(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    pub fn template(mut self, template: &Encoder) -> Self {
        self.template = Some(template.clone());
        self
    }

    /// Fill value for missing and unmapped responses.
    pub fn default_code(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    pub fn neutral(mut self, neutral: f64) -> Self {
        self.neutral = Some(neutral);
        self
    }

    pub fn dtype(mut self, dtype: CodeType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Invert the scale once the encoder is built.
    pub fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Builds the encoder, drawing a name from `names` when none was given.
    pub fn build(self, names: &mut NameSequence) -> Result<Encoder> {
        let EncoderBuilder {
            name,
            encoding,
            template,
            default,
            neutral,
            dtype,
            inverse,
        } = self;
        let name = name.unwrap_or_else(|| names.next_name());

        let mut encoder = match (encoding, template) {
            (Some(encoding), template) => Encoder {
                name,
                encoding,
                default: default.or_else(|| template.as_ref().and_then(|t| t.default)),
                neutral: neutral.or_else(|| template.as_ref().and_then(|t| t.neutral)),
                dtype: dtype
                    .or_else(|| template.as_ref().map(|t| t.dtype))
                    .unwrap_or_default(),
            },
            (None, Some(template)) => Encoder {
                name,
                encoding: template.encoding,
                default: default.or(template.default),
                neutral: neutral.or(template.neutral),
                dtype: dtype.unwrap_or(template.dtype),
            },
            (None, None) => return Err(SurveyError::MissingEncoding),
        };
        if encoder.encoding.is_empty() {
            return Err(SurveyError::EmptyEncoding { name: encoder.name });
        }
        if encoder.dtype == CodeType::Int {
            encoder.check_integral()?;
        }
        if inverse {
            encoder.inverse();
        }
        Ok(encoder)
    }
}

impl Encoder {
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::default()
    }

    /// Shorthand for a named encoder with no default or neutral code.
    pub fn new<I, K>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<RawValue>,
    {
        let mut names = NameSequence::encoders();
        Self::builder().name(name).encoding(pairs).build(&mut names)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> &BTreeMap<RawValue, f64> {
        &self.encoding
    }

    /// The raw values this encoder knows about.
    pub fn target(&self) -> BTreeSet<&RawValue> {
        self.encoding.keys().collect()
    }

    pub fn default_code(&self) -> Option<f64> {
        self.default
    }

    pub fn neutral(&self) -> Option<f64> {
        self.neutral
    }

    pub fn dtype(&self) -> CodeType {
        self.dtype
    }

    pub fn code(&self, value: &RawValue) -> Option<f64> {
        self.encoding.get(value).copied()
    }

    /// Int encoders cast their output, so every code they can emit must be a
    /// whole number.
    fn check_integral(&self) -> Result<()> {
        let codes = self
            .encoding
            .values()
            .map(|code| ("code", *code))
            .chain(self.default.map(|code| ("default", code)))
            .chain(self.neutral.map(|code| ("neutral", code)));
        for (field, value) in codes {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(SurveyError::NonIntegralCode {
                    name: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Returns true when a column with these observed values may be encoded.
    pub fn admits(&self, observed: &BTreeSet<RawValue>, mode: MatchMode) -> bool {
        admits(observed, &self.encoding, mode)
    }

    /// Reverses the polarity of the scale while keeping the category order.
    ///
    /// Categories are ordered by code, highest first, and re-paired with the
    /// codes in ascending order: on a 1..5 scale 5 becomes 1, 4 becomes 2 and
    /// 3 stays 3. Ties keep their key order.
    pub fn inverse(&mut self) {
        let mut pairs: Vec<(RawValue, f64)> = self
            .encoding
            .iter()
            .map(|(value, code)| (value.clone(), *code))
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut codes: Vec<f64> = pairs.iter().map(|(_, code)| *code).collect();
        codes.sort_by(f64::total_cmp);
        self.encoding = pairs
            .into_iter()
            .map(|(value, _)| value)
            .zip(codes)
            .collect();
    }

    /// Encodes one series. Known values become codes, everything else becomes
    /// missing, then missing slots take the default when one is configured.
    pub fn transform_series(&self, series: &Series) -> Result<Series> {
        let mut codes = Vec::with_capacity(series.len());
        for idx in 0..series.len() {
            let value = series.get(idx).unwrap_or(AnyValue::Null);
            let code = RawValue::from_any(value).and_then(|key| self.code(&key));
            codes.push(code.or(self.default));
        }
        let encoded = Series::new(series.name().clone(), codes);
        Ok(encoded.cast(&self.dtype.data_type())?)
    }

    /// Encodes the columns of a table selected by `options`.
    ///
    /// The input is left untouched. The returned rules record this encoder's
    /// name for every column it was applied to.
    pub fn transform_frame(&self, df: &DataFrame, options: &TransformOptions) -> Result<Encoded> {
        let mut frame = df.clone();
        let mut rules = EncodingRules::for_frame(df);

        if let Some(columns) = &options.columns {
            for name in columns {
                if !df.get_column_names().iter().any(|c| c.as_str() == name) {
                    warn!(encoder = %self.name, column = %name, "requested column not present");
                }
            }
        }

        for column in df.get_columns() {
            let name = column.name().as_str();
            if options.is_ignored(name) {
                continue;
            }
            let series = column.as_materialized_series();
            let apply = match &options.columns {
                Some(columns) => columns.iter().any(|c| c == name),
                None => self.admits(&observed_values(series), options.mode),
            };
            if apply {
                debug!(encoder = %self.name, column = %name, mode = %options.mode, "encoding column");
                frame.with_column(self.transform_series(series)?)?;
                rules.assign(name, &self.name);
            }
        }
        Ok(Encoded { frame, rules })
    }

    /// Marks neutral responses in a series with 1, everything else with 0.
    ///
    /// Returns `None` (and logs a warning) when the encoder has no neutral code.
    pub fn count_neutral_series(&self, series: &Series) -> Result<Option<Series>> {
        let Some(neutral) = self.neutral_or_warn() else {
            return Ok(None);
        };
        let encoded = self.transform_series(series)?;
        let flags: Vec<i64> = (0..encoded.len())
            .map(|idx| {
                let code = any_to_f64(encoded.get(idx).unwrap_or(AnyValue::Null));
                i64::from(code == Some(neutral))
            })
            .collect();
        Ok(Some(Series::new(series.name().clone(), flags)))
    }

    /// Counts neutral responses per row over the columns this encoder matched.
    ///
    /// Columns left unencoded are not on this encoder's scale and never count.
    /// Returns `None` (and logs a warning) when the encoder has no neutral code.
    pub fn count_neutral_frame(
        &self,
        df: &DataFrame,
        options: &TransformOptions,
    ) -> Result<Option<Series>> {
        let Some(neutral) = self.neutral_or_warn() else {
            return Ok(None);
        };
        let encoded = self.transform_frame(df, options)?;
        let matched: Vec<&str> = encoded.rules.matched().map(|(column, _)| column).collect();
        let mut totals = vec![0i64; df.height()];
        for name in matched {
            let column = encoded.frame.column(name)?;
            for (idx, total) in totals.iter_mut().enumerate() {
                let code = any_to_f64(column.get(idx).unwrap_or(AnyValue::Null));
                *total += i64::from(code == Some(neutral));
            }
        }
        Ok(Some(Series::new(NEUTRAL_COUNT_COLUMN.into(), totals)))
    }

    fn neutral_or_warn(&self) -> Option<f64> {
        if self.neutral.is_none() {
            warn!(
                encoder = %self.name,
                "encoder has no neutral code, count_neutral returns nothing"
            );
        }
        self.neutral
    }
}

/// Result of encoding a table: the new table plus the rule record.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub frame: DataFrame,
    pub rules: EncodingRules,
}

/// Which encoder, if any, was applied to each column of a table.
///
/// Entries follow the table's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingRules {
    entries: Vec<(String, Option<String>)>,
}

impl EncodingRules {
    /// One unassigned entry per column of `df`.
    pub fn for_frame(df: &DataFrame) -> Self {
        Self {
            entries: df
                .get_columns()
                .iter()
                .map(|column| (column.name().to_string(), None))
                .collect(),
        }
    }

    pub(crate) fn assign(&mut self, column: &str, encoder: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some((_, rule)) => *rule = Some(encoder.to_string()),
            None => self
                .entries
                .push((column.to_string(), Some(encoder.to_string()))),
        }
    }

    /// Encoder applied to `column`, or `None` when the column was left as is
    /// or is unknown.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, rule)| rule.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, rule)| (name.as_str(), rule.as_deref()))
    }

    /// Columns that were encoded, with the encoder used.
    pub fn matched(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, rule)| rule.as_deref().map(|rule| (name.as_str(), rule)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two-column table (`column`, `encoder`) with nulls for unmatched columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let columns: Vec<&str> = self.entries.iter().map(|(name, _)| name.as_str()).collect();
        let encoders: Vec<Option<&str>> = self
            .entries
            .iter()
            .map(|(_, rule)| rule.as_deref())
            .collect();
        Ok(DataFrame::new(vec![
            Series::new("column".into(), columns).into(),
            Series::new("encoder".into(), encoders).into(),
        ])?)
    }
}
