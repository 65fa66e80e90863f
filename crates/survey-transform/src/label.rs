//! Score labeling.
//!
//! A [`Label`] turns a numeric score series into a categorical one. Interval
//! rules test inclusive `[low, high]` membership in definition order and the
//! last matching interval wins. Quantile rules split the observed scores into
//! equal-frequency bins.

use polars::prelude::{NamedFrom, Series};
use survey_common::series_f64;
use survey_model::{NameSequence, Result, SurveyError};

/// A named inclusive score range.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub category: String,
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn new(category: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            category: category.into(),
            low,
            high,
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.low <= score && score <= self.high
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabelRule {
    /// Ordered intervals; on overlap the later interval wins.
    Intervals(Vec<Interval>),
    /// Category names for equal-frequency bins, lowest scores first.
    Quantiles(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    name: String,
    rule: LabelRule,
}

impl Label {
    pub fn new(name: impl Into<String>, rule: LabelRule) -> Result<Self> {
        let name = name.into();
        match &rule {
            LabelRule::Intervals(intervals) => {
                if intervals.is_empty() {
                    return Err(SurveyError::EmptyLabel { name });
                }
                if let Some(bad) = intervals
                    .iter()
                    .find(|i| i.low.is_nan() || i.high.is_nan() || i.low > i.high)
                {
                    return Err(SurveyError::InvalidInterval {
                        label: name,
                        category: bad.category.clone(),
                        low: bad.low,
                        high: bad.high,
                    });
                }
            }
            LabelRule::Quantiles(categories) => {
                if categories.is_empty() {
                    return Err(SurveyError::EmptyLabel { name });
                }
            }
        }
        Ok(Self { name, rule })
    }

    /// Builds a label whose name is drawn from `names`.
    pub fn unnamed(rule: LabelRule, names: &mut NameSequence) -> Result<Self> {
        Self::new(names.next_name(), rule)
    }

    /// Interval label from `(category, [low, high])` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use polars::prelude::{NamedFrom, Series};
    /// use survey_transform::Label;
    ///
    /// let label = Label::intervals("band", [("Low", [0.0, 10.0]), ("Mid", [5.0, 15.0])]).unwrap();
    /// let labels = label.label(&Series::new("score".into(), [7.0])).unwrap();
    /// assert_eq!(labels.str().unwrap().get(0), Some("Mid"));
    /// ```
    pub fn intervals<I, S>(name: impl Into<String>, intervals: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, [f64; 2])>,
        S: Into<String>,
    {
        let intervals = intervals
            .into_iter()
            .map(|(category, [low, high])| Interval::new(category, low, high))
            .collect();
        Self::new(name, LabelRule::Intervals(intervals))
    }

    pub fn quantiles<I, S>(name: impl Into<String>, categories: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories.into_iter().map(Into::into).collect();
        Self::new(name, LabelRule::Quantiles(categories))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &LabelRule {
        &self.rule
    }

    /// Classifies every score. Unmatched and missing scores stay null.
    ///
    /// The result is a string series named after the label.
    pub fn label(&self, scores: &Series) -> Result<Series> {
        let values = series_f64(scores);
        let labels = match &self.rule {
            LabelRule::Intervals(intervals) => label_intervals(&values, intervals),
            LabelRule::Quantiles(categories) => self.label_quantiles(&values, categories)?,
        };
        Ok(Series::new(self.name.as_str().into(), labels))
    }

    fn label_quantiles(&self, values: &[Option<f64>], categories: &[String]) -> Result<Vec<Option<String>>> {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        if sorted.is_empty() {
            return Ok(vec![None; values.len()]);
        }
        sorted.sort_by(f64::total_cmp);
        let bins = categories.len();
        let edges: Vec<f64> = (0..=bins)
            .map(|i| quantile(&sorted, i as f64 / bins as f64))
            .collect();
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SurveyError::QuantileBins {
                label: self.name.clone(),
                message: format!("bin edges must be unique, got {edges:?}"),
            });
        }
        Ok(values
            .iter()
            .map(|value| {
                let score = (*value)?;
                let bin = (0..bins).find(|&i| {
                    let above_low = if i == 0 {
                        score >= edges[0]
                    } else {
                        score > edges[i]
                    };
                    above_low && score <= edges[i + 1]
                })?;
                Some(categories[bin].clone())
            })
            .collect())
    }
}

fn label_intervals(values: &[Option<f64>], intervals: &[Interval]) -> Vec<Option<String>> {
    let mut labels: Vec<Option<String>> = vec![None; values.len()];
    for interval in intervals {
        for (label, value) in labels.iter_mut().zip(values) {
            if value.is_some_and(|score| interval.contains(score)) {
                *label = Some(interval.category.clone());
            }
        }
    }
    labels
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}
