//! Cached survey views.
//!
//! A [`Questionnaire`] owns a private copy of the response table and a list of
//! scorings. Transformed items, scores, and labels are computed on first
//! access and kept until the table changes shape.
//!
//! # Cache states
//!
//! Each of the three derived tables is either absent or cached. Access methods
//! enforce the dependency order transform, score, label: asking for labels
//! computes scores first when needed. [`Questionnaire::drop`] resets every
//! cell, since scores and labels are computed over the full row set.
//!
//! Every derived table starts with the key column so that rows stay
//! identifiable after rows are dropped.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, IntoColumn, NamedFrom, NewChunkedArray, Series,
};
use survey_common::{column_f64, column_strings, has_column};
use survey_model::{RawValue, Result, SurveyError};
use tracing::{debug, info, info_span, warn};

use crate::scoring::Scoring;

/// Key column added when the caller does not name one.
pub const DEFAULT_KEY_COLUMN: &str = "index";

#[derive(Debug, Clone)]
pub struct Questionnaire {
    data: DataFrame,
    key_column: String,
    scorings: Vec<Scoring>,
    cache: DerivedCache,
}

#[derive(Debug, Clone)]
struct DerivedCache {
    transform: Option<DataFrame>,
    score: Option<DataFrame>,
    label: Option<DataFrame>,
    /// Original columns plus every score and label column computed so far.
    view: DataFrame,
}

impl DerivedCache {
    fn new(data: &DataFrame) -> Self {
        Self {
            transform: None,
            score: None,
            label: None,
            view: data.clone(),
        }
    }
}

impl Questionnaire {
    /// Creates a questionnaire keyed by row position.
    ///
    /// A `"index"` column holding 0, 1, 2, ... is added unless the table
    /// already has one, in which case that column is used as the key.
    pub fn new(data: &DataFrame, scorings: Vec<Scoring>) -> Result<Self> {
        let data = if has_column(data, DEFAULT_KEY_COLUMN) {
            data.clone()
        } else {
            data.with_row_index(DEFAULT_KEY_COLUMN.into(), None)?
        };
        Self::from_parts(data, DEFAULT_KEY_COLUMN.to_string(), scorings)
    }

    /// Creates a questionnaire keyed by an existing column.
    pub fn with_key_column(data: &DataFrame, key_column: &str, scorings: Vec<Scoring>) -> Result<Self> {
        if !has_column(data, key_column) {
            return Err(SurveyError::ColumnNotFound {
                column: key_column.to_string(),
            });
        }
        Self::from_parts(data.clone(), key_column.to_string(), scorings)
    }

    fn from_parts(data: DataFrame, key_column: String, scorings: Vec<Scoring>) -> Result<Self> {
        check_derived_names(&key_column, &scorings)?;
        let cache = DerivedCache::new(&data);
        Ok(Self {
            data,
            key_column,
            scorings,
            cache,
        })
    }

    /// The owned response table (including the key column).
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Original columns plus the score and label columns computed so far.
    pub fn view(&self) -> &DataFrame {
        &self.cache.view
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn scorings(&self) -> &[Scoring] {
        &self.scorings
    }

    pub fn is_transform_cached(&self) -> bool {
        self.cache.transform.is_some()
    }

    pub fn is_score_cached(&self) -> bool {
        self.cache.score.is_some()
    }

    pub fn is_label_cached(&self) -> bool {
        self.cache.label.is_some()
    }

    fn key(&self) -> Result<Column> {
        self.data
            .column(&self.key_column)
            .cloned()
            .map_err(|_| SurveyError::ColumnNotFound {
                column: self.key_column.clone(),
            })
    }

    /// Encoded item columns of every scoring, keyed.
    ///
    /// A column bound by more than one scoring keeps the first scoring's
    /// encoding.
    pub fn transform(&mut self) -> Result<&DataFrame> {
        let transformed = match self.cache.transform.take() {
            Some(cached) => cached,
            None => self.compute_transform()?,
        };
        Ok(self.cache.transform.insert(transformed))
    }

    fn compute_transform(&self) -> Result<DataFrame> {
        let _span = info_span!("transform", scorings = self.scorings.len()).entered();
        let mut columns = vec![self.key()?];
        let mut seen: HashSet<&str> = HashSet::from([self.key_column.as_str()]);
        for scoring in &self.scorings {
            let transformed = scoring.transform(&self.data)?;
            for name in scoring.columns() {
                if !seen.insert(name.as_str()) {
                    warn!(scoring = %scoring.name(), column = %name, "column already transformed by an earlier scoring");
                    continue;
                }
                let column = transformed
                    .column(name)
                    .map_err(|_| SurveyError::ColumnNotFound {
                        column: name.clone(),
                    })?;
                columns.push(column.clone());
            }
        }
        let frame = DataFrame::new(columns)?;
        info!(columns = frame.width() - 1, rows = frame.height(), "transformed items");
        Ok(frame)
    }

    /// One score column per scoring, keyed. Scores are also appended to the view.
    pub fn score(&mut self) -> Result<&DataFrame> {
        let scores = match self.cache.score.take() {
            Some(cached) => cached,
            None => {
                let scores = self.compute_scores()?;
                self.merge_into_view(&scores)?;
                scores
            }
        };
        Ok(self.cache.score.insert(scores))
    }

    fn compute_scores(&self) -> Result<DataFrame> {
        let _span = info_span!("score", scorings = self.scorings.len()).entered();
        let mut columns = vec![self.key()?];
        for scoring in &self.scorings {
            let score = scoring.score(&self.data)?;
            debug!(scoring = %scoring.name(), nulls = score.null_count(), "scored");
            columns.push(score.into_column());
        }
        let frame = DataFrame::new(columns)?;
        info!(scores = frame.width() - 1, rows = frame.height(), "computed scores");
        Ok(frame)
    }

    /// Every label of every scoring, keyed. Computes scores first when they are
    /// not cached. Labels are also appended to the view.
    pub fn label(&mut self) -> Result<&DataFrame> {
        let labels = match self.cache.label.take() {
            Some(cached) => cached,
            None => {
                self.score()?;
                let labels = self.compute_labels()?;
                self.merge_into_view(&labels)?;
                labels
            }
        };
        Ok(self.cache.label.insert(labels))
    }

    fn compute_labels(&self) -> Result<DataFrame> {
        let _span = info_span!("label", scorings = self.scorings.len()).entered();
        let mut columns = vec![self.key()?];
        for scoring in &self.scorings {
            let labels = scoring.label(&self.cache.view, &scoring.score_column())?;
            columns.extend(labels.get_columns().iter().cloned());
        }
        let frame = DataFrame::new(columns)?;
        info!(labels = frame.width() - 1, rows = frame.height(), "computed labels");
        Ok(frame)
    }

    /// Adds the non-key columns of a derived table to the view. An input column
    /// with the same name, such as a score exported by an earlier run, is
    /// replaced.
    fn merge_into_view(&mut self, derived: &DataFrame) -> Result<()> {
        for column in &derived.get_columns()[1..] {
            if has_column(&self.cache.view, column.name().as_str()) {
                warn!(column = %column.name(), "replacing input column with derived values");
            }
            self.cache.view.with_column(column.clone())?;
        }
        Ok(())
    }

    /// Removes the rows whose key is in `keys` and clears every cached view.
    ///
    /// Returns the number of rows removed.
    pub fn drop(&mut self, keys: &[RawValue]) -> Result<usize> {
        let keys: HashSet<&RawValue> = keys.iter().collect();
        let key = self.key()?;
        let keep: Vec<bool> = (0..key.len())
            .map(|idx| {
                RawValue::from_any(key.get(idx).unwrap_or(AnyValue::Null))
                    .is_none_or(|value| !keys.contains(&value))
            })
            .collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let before = self.data.height();
        self.data = self.data.filter(&mask)?;
        let removed = before - self.data.height();
        info!(removed, remaining = self.data.height(), "dropped rows");
        self.reset_cache();
        Ok(removed)
    }

    /// Forgets every derived table.
    pub fn reset_cache(&mut self) {
        self.cache = DerivedCache::new(&self.data);
    }

    /// Looks a column up by name among the original, score, and label columns.
    ///
    /// On a miss, labels (and therefore scores) are computed and the lookup is
    /// retried. Score and label names always resolve to derived values, even
    /// when the input carried a column of the same name.
    pub fn column(&mut self, name: &str) -> Result<Column> {
        if !self.is_derived(name)
            && let Ok(column) = self.cache.view.column(name)
        {
            return Ok(column.clone());
        }
        self.label()?;
        self.cache
            .view
            .column(name)
            .cloned()
            .map_err(|_| SurveyError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    fn is_derived(&self, name: &str) -> bool {
        self.scorings.iter().any(|scoring| {
            scoring.score_column() == name
                || scoring
                    .labels()
                    .iter()
                    .any(|label| scoring.label_column(label) == name)
        })
    }

    /// Names of the transformed item columns.
    pub fn item_columns(&mut self) -> Result<Vec<String>> {
        let key = self.key_column.clone();
        Ok(non_key_names(self.transform()?, &key))
    }

    /// Names of the score columns.
    pub fn score_columns(&mut self) -> Result<Vec<String>> {
        let key = self.key_column.clone();
        Ok(non_key_names(self.score()?, &key))
    }

    /// Names of the label columns.
    pub fn label_columns(&mut self) -> Result<Vec<String>> {
        let key = self.key_column.clone();
        Ok(non_key_names(self.label()?, &key))
    }

    /// Mean difference of every transformed item between groups.
    ///
    /// Groups are the distinct non-null values of `group_column` (any original,
    /// score, or label column), sorted. The result has an `item` column and one
    /// `"<a> - <b>"` column per pair of groups holding `mean(a) - mean(b)`.
    pub fn diff(&mut self, group_column: &str) -> Result<DataFrame> {
        let groups = column_strings(&self.column(group_column)?);
        let names: Vec<String> = groups
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let key = self.key_column.clone();
        let items = self.transform()?.clone();

        let mut item_names = Vec::new();
        let mut means: Vec<BTreeMap<&str, f64>> = Vec::new();
        for column in items.get_columns() {
            if column.name().as_str() == key {
                continue;
            }
            item_names.push(column.name().to_string());
            means.push(group_means(&column_f64(column), &groups));
        }

        let mut columns: Vec<Column> = vec![Series::new("item".into(), item_names).into_column()];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                let diffs: Vec<Option<f64>> = means
                    .iter()
                    .map(|m| Some(m.get(a.as_str())? - m.get(b.as_str())?))
                    .collect();
                columns.push(Series::new(format!("{a} - {b}").as_str().into(), diffs).into_column());
            }
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Rejects scorings whose derived columns would collide with each other or
/// with the key column.
fn check_derived_names(key_column: &str, scorings: &[Scoring]) -> Result<()> {
    let mut scoring_names = HashSet::new();
    let mut derived = HashSet::from([key_column.to_string()]);
    for scoring in scorings {
        if !scoring_names.insert(scoring.name()) {
            return Err(SurveyError::DuplicateScoring {
                name: scoring.name().to_string(),
            });
        }
        let names = std::iter::once(scoring.score_column())
            .chain(scoring.labels().iter().map(|label| scoring.label_column(label)));
        for column in names {
            if derived.contains(&column) {
                return Err(SurveyError::DerivedColumnClash { column });
            }
            derived.insert(column);
        }
    }
    Ok(())
}

fn non_key_names(df: &DataFrame, key: &str) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != key)
        .map(|name| name.to_string())
        .collect()
}

fn group_means<'a>(values: &[Option<f64>], groups: &'a [Option<String>]) -> BTreeMap<&'a str, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (value, group) in values.iter().zip(groups) {
        if let (Some(value), Some(group)) = (value, group) {
            let entry = sums.entry(group.as_str()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(group, (sum, count))| (group, sum / count as f64))
        .collect()
}
