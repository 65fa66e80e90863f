//! Aggregate scores over groups of survey columns.

use std::collections::HashSet;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use survey_common::column_f64;
use survey_model::{NameSequence, Result, SurveyError};
use tracing::{debug, warn};

use crate::encoder::Encoder;
use crate::label::Label;

/// An encoder bound to the columns it encodes within a scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub encoder: Encoder,
    pub columns: Vec<String>,
}

/// Where a scoring's numeric item values come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringSource {
    /// Raw answers encoded by the bound encoders.
    Encoded(Vec<Binding>),
    /// Columns that already hold comparable numeric values.
    Raw(Vec<String>),
}

/// Sums a group of items into one score per respondent and labels it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    name: String,
    source: ScoringSource,
    columns: Vec<String>,
    labels: Vec<Label>,
}

/// Builder for [`Scoring`]. Exactly one of [`bind`](Self::bind) or
/// [`raw_columns`](Self::raw_columns) must be used.
#[derive(Debug, Clone, Default)]
pub struct ScoringBuilder {
    name: Option<String>,
    bindings: Vec<Binding>,
    raw: Option<Vec<String>>,
    labels: Vec<Label>,
}

impl ScoringBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Binds `encoder` to `columns`. Columns must not be bound twice.
    pub fn bind<I, S>(mut self, encoder: Encoder, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings.push(Binding {
            encoder,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Uses already-encoded columns as the items.
    pub fn raw_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn labels(mut self, labels: impl IntoIterator<Item = Label>) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Builds the scoring, drawing a name from `names` when none was given.
    pub fn build(self, names: &mut NameSequence) -> Result<Scoring> {
        let name = self.name.unwrap_or_else(|| names.next_name());
        let has_bound_columns = self
            .bindings
            .iter()
            .any(|binding| !binding.columns.is_empty());
        let source = match self.raw {
            Some(_) if !self.bindings.is_empty() => {
                return Err(SurveyError::ConflictingScoringSource { name });
            }
            Some(columns) if !columns.is_empty() => ScoringSource::Raw(columns),
            None if has_bound_columns => ScoringSource::Encoded(self.bindings),
            _ => return Err(SurveyError::MissingScoringSource { name }),
        };

        let columns: Vec<String> = match &source {
            ScoringSource::Encoded(bindings) => bindings
                .iter()
                .flat_map(|binding| binding.columns.iter().cloned())
                .collect(),
            ScoringSource::Raw(columns) => columns.clone(),
        };
        let mut seen = HashSet::new();
        if let Some(column) = columns.iter().find(|column| !seen.insert(column.as_str())) {
            return Err(SurveyError::OverlappingBinding {
                scoring: name,
                column: column.clone(),
            });
        }

        Ok(Scoring {
            name,
            source,
            columns,
            labels: self.labels,
        })
    }
}

impl Scoring {
    pub fn builder() -> ScoringBuilder {
        ScoringBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ScoringSource {
        &self.source
    }

    /// Every bound item column, in binding order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Name of the score column, `"<name> score"`.
    pub fn score_column(&self) -> String {
        format!("{} score", self.name)
    }

    /// Name of the column produced by `label`, `"<name> - Label <label>"`.
    pub fn label_column(&self, label: &Label) -> String {
        format!("{} - Label {}", self.name, label.name())
    }

    /// Applies each bound encoder to its columns. Other columns pass through.
    ///
    /// A scoring over raw columns returns the input unchanged.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let bindings = match &self.source {
            ScoringSource::Encoded(bindings) => bindings,
            ScoringSource::Raw(_) => {
                warn!(scoring = %self.name, "no encoder configured, using raw column values");
                return Ok(df.clone());
            }
        };
        let mut frame = df.clone();
        for binding in bindings {
            for name in &binding.columns {
                let column = item_column(df, name)?;
                debug!(scoring = %self.name, encoder = %binding.encoder.name(), column = %name, "encoding item");
                frame.with_column(binding.encoder.transform_series(column.as_materialized_series())?)?;
            }
        }
        Ok(frame)
    }

    /// Row-wise sum of the transformed items.
    ///
    /// A missing item makes that respondent's score missing; configure a
    /// default on the encoders to score incomplete answers.
    pub fn score(&self, df: &DataFrame) -> Result<Series> {
        let transformed = self.transform(df)?;
        let mut totals: Vec<Option<f64>> = vec![Some(0.0); df.height()];
        for name in &self.columns {
            let values = column_f64(item_column(&transformed, name)?);
            for (total, value) in totals.iter_mut().zip(values) {
                *total = match (*total, value) {
                    (Some(sum), Some(value)) => Some(sum + value),
                    _ => None,
                };
            }
        }
        Ok(Series::new(self.score_column().as_str().into(), totals))
    }

    /// Applies every label to `score_column` of `df`, one output column per
    /// label in label order.
    pub fn label(&self, df: &DataFrame, score_column: &str) -> Result<DataFrame> {
        let scores = item_column(df, score_column)?.as_materialized_series();
        let mut columns: Vec<Column> = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            let labeled = label
                .label(scores)?
                .with_name(self.label_column(label).as_str().into());
            columns.push(labeled.into_column());
        }
        Ok(DataFrame::new(columns)?)
    }
}

fn item_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| SurveyError::ColumnNotFound {
        column: name.to_string(),
    })
}
