//! First-match encoding with several encoders.

use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};
use survey_common::any_to_f64;
use survey_model::{MatchMode, MatchOptions, Result, SurveyError};
use tracing::debug;

use crate::encoder::{Encoded, Encoder, EncodingRules, NEUTRAL_COUNT_COLUMN};
use crate::matching::observed_values;

/// An ordered list of encoders.
///
/// For each column the first encoder whose target admits the column's observed
/// values is applied. Targets may overlap; list order breaks the tie.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiEncoder {
    rules: Vec<Encoder>,
}

/// Columns of a table paired with the index of the encoder resolved for them.
type Resolution = Vec<(String, Option<usize>)>;

impl MultiEncoder {
    pub fn new(rules: Vec<Encoder>) -> Result<Self> {
        if rules.is_empty() {
            return Err(SurveyError::EmptyMultiEncoder);
        }
        Ok(Self { rules })
    }

    pub fn encoders(&self) -> &[Encoder] {
        &self.rules
    }

    /// First encoder, in list order, admitting the series' observed values.
    pub fn resolve(&self, series: &Series, mode: MatchMode) -> Option<&Encoder> {
        self.resolve_index(series, mode).map(|idx| &self.rules[idx])
    }

    fn resolve_index(&self, series: &Series, mode: MatchMode) -> Option<usize> {
        let observed = observed_values(series);
        self.rules
            .iter()
            .position(|encoder| encoder.admits(&observed, mode))
    }

    /// Encodes a single series with its resolved encoder, or returns it
    /// unchanged when no encoder applies.
    pub fn transform_series(&self, series: &Series, mode: MatchMode) -> Result<Series> {
        match self.resolve(series, mode) {
            Some(encoder) => encoder.transform_series(series),
            None => Ok(series.clone()),
        }
    }

    /// Encodes every non-ignored column with its first matching encoder.
    ///
    /// Unmatched columns pass through unchanged and carry no rule.
    pub fn transform_frame(&self, df: &DataFrame, options: &MatchOptions) -> Result<Encoded> {
        let (frame, resolution) = self.encode(df, options)?;
        let mut rules = EncodingRules::for_frame(df);
        for (column, idx) in &resolution {
            if let Some(idx) = idx {
                rules.assign(column, self.rules[*idx].name());
            }
        }
        Ok(Encoded { frame, rules })
    }

    fn encode(&self, df: &DataFrame, options: &MatchOptions) -> Result<(DataFrame, Resolution)> {
        let mut frame = df.clone();
        let mut resolution = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let name = column.name().as_str();
            if options.is_ignored(name) {
                resolution.push((name.to_string(), None));
                continue;
            }
            let series = column.as_materialized_series();
            let idx = self.resolve_index(series, options.mode);
            if let Some(idx) = idx {
                let encoder = &self.rules[idx];
                debug!(encoder = %encoder.name(), column = %name, mode = %options.mode, "encoding column");
                frame.with_column(encoder.transform_series(series)?)?;
            }
            resolution.push((name.to_string(), idx));
        }
        Ok((frame, resolution))
    }

    /// Neutral indicator for a single series, using its resolved encoder.
    ///
    /// Returns `None` when no encoder applies or the resolved encoder has no
    /// neutral code.
    pub fn count_neutral_series(&self, series: &Series, mode: MatchMode) -> Result<Option<Series>> {
        match self.resolve(series, mode) {
            Some(encoder) if encoder.neutral().is_some() => {
                let counts = encoder.count_neutral_series(series)?;
                Ok(counts.map(|s| s.with_name(NEUTRAL_COUNT_COLUMN.into())))
            }
            _ => Ok(None),
        }
    }

    /// Per-row neutral tally across all matched columns.
    ///
    /// Each column is compared with the neutral code of its own resolved
    /// encoder. Columns without a resolved encoder, or whose encoder has no
    /// neutral code, contribute nothing. Returns `None` when no column
    /// contributes at all.
    pub fn count_neutral_frame(&self, df: &DataFrame, options: &MatchOptions) -> Result<Option<Series>> {
        let (frame, resolution) = self.encode(df, options)?;
        let mut totals = vec![0i64; df.height()];
        let mut contributing = 0usize;
        for (name, idx) in &resolution {
            let Some(neutral) = idx.and_then(|idx| self.rules[idx].neutral()) else {
                continue;
            };
            contributing += 1;
            let column = frame.column(name)?;
            for (row, total) in totals.iter_mut().enumerate() {
                let code = any_to_f64(column.get(row).unwrap_or(AnyValue::Null));
                *total += i64::from(code == Some(neutral));
            }
        }
        if contributing == 0 {
            return Ok(None);
        }
        Ok(Some(Series::new(NEUTRAL_COUNT_COLUMN.into(), totals)))
    }
}

impl From<Encoder> for MultiEncoder {
    fn from(encoder: Encoder) -> Self {
        Self {
            rules: vec![encoder],
        }
    }
}
