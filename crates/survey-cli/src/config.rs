//! Survey definition files.
//!
//! A survey definition is a TOML document listing encoders and scorings:
//!
//! ```toml
//! key_column = "respondent"
//!
//! [[encoders]]
//! name = "agreement"
//! default = 3
//! neutral = 3
//! codes = [
//!     { value = "Disagree", code = 1 },
//!     { value = "Neutral", code = 3 },
//!     { value = "Agree", code = 5 },
//! ]
//!
//! [[encoders]]
//! name = "agreement-reversed"
//! template = "agreement"
//! inverse = true
//!
//! [[scorings]]
//! name = "wellbeing"
//! bindings = [
//!     { encoder = "agreement", columns = ["q1", "q2"] },
//!     { encoder = "agreement-reversed", columns = ["q3"] },
//! ]
//!
//! [[scorings.labels]]
//! name = "band"
//! intervals = [
//!     { category = "Low", low = 0, high = 7 },
//!     { category = "High", low = 8, high = 15 },
//! ]
//! ```
//!
//! Encoders are referenced by name. A template must be defined before the
//! encoder that uses it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use survey_model::{CodeType, NameSequence, RawValue};
use survey_transform::{Encoder, Interval, Label, LabelRule, Scoring};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Existing column identifying respondents. Rows are keyed by position otherwise.
    #[serde(default)]
    pub key_column: Option<String>,
    #[serde(default)]
    pub encoders: Vec<EncoderConfig>,
    #[serde(default)]
    pub scorings: Vec<ScoringConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncoderConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
    pub default: Option<f64>,
    pub neutral: Option<f64>,
    pub dtype: Option<CodeType>,
    pub template: Option<String>,
    #[serde(default)]
    pub inverse: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeEntry {
    pub value: RawValue,
    pub code: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
    pub raw_columns: Option<Vec<String>>,
    #[serde(default)]
    pub labels: Vec<LabelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub encoder: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub intervals: Vec<IntervalConfig>,
    /// Category names for equal-frequency bins, lowest first.
    #[serde(default)]
    pub quantiles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalConfig {
    pub category: String,
    pub low: f64,
    pub high: f64,
}

/// A resolved survey definition.
#[derive(Debug, Clone)]
pub struct Survey {
    pub key_column: Option<String>,
    /// Every configured encoder, in file order.
    pub encoders: Vec<Encoder>,
    pub scorings: Vec<Scoring>,
}

impl SurveyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds encoders, labels, and scorings, resolving encoder references by name.
    pub fn build(&self) -> Result<Survey> {
        let mut encoder_names = NameSequence::encoders();
        let mut label_names = NameSequence::labels();
        let mut scoring_names = NameSequence::scorings();

        let mut encoders: Vec<Encoder> = Vec::with_capacity(self.encoders.len());
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for entry in &self.encoders {
            let encoder = build_encoder(entry, &encoders, &by_name, &mut encoder_names)?;
            if by_name
                .insert(encoder.name().to_string(), encoders.len())
                .is_some()
            {
                bail!("encoder '{}' is defined more than once", encoder.name());
            }
            encoders.push(encoder);
        }

        let mut scorings = Vec::with_capacity(self.scorings.len());
        for entry in &self.scorings {
            let mut builder = Scoring::builder();
            if let Some(name) = &entry.name {
                builder = builder.name(name);
            }
            for binding in &entry.bindings {
                let idx = by_name
                    .get(&binding.encoder)
                    .ok_or_else(|| anyhow!("unknown encoder '{}'", binding.encoder))?;
                builder = builder.bind(encoders[*idx].clone(), binding.columns.iter().cloned());
            }
            if let Some(columns) = &entry.raw_columns {
                builder = builder.raw_columns(columns.iter().cloned());
            }
            for label in &entry.labels {
                builder = builder.label(build_label(label, &mut label_names)?);
            }
            scorings.push(builder.build(&mut scoring_names)?);
        }

        Ok(Survey {
            key_column: self.key_column.clone(),
            encoders,
            scorings,
        })
    }
}

fn build_encoder(
    entry: &EncoderConfig,
    defined: &[Encoder],
    by_name: &HashMap<String, usize>,
    names: &mut NameSequence,
) -> Result<Encoder> {
    let mut builder = Encoder::builder().inverse(entry.inverse);
    if let Some(name) = &entry.name {
        builder = builder.name(name);
    }
    if !entry.codes.is_empty() {
        builder = builder.encoding(
            entry
                .codes
                .iter()
                .map(|code| (code.value.clone(), code.code)),
        );
    }
    if let Some(template) = &entry.template {
        let idx = by_name
            .get(template)
            .ok_or_else(|| anyhow!("unknown template encoder '{template}'"))?;
        builder = builder.template(&defined[*idx]);
    }
    if let Some(default) = entry.default {
        builder = builder.default_code(default);
    }
    if let Some(neutral) = entry.neutral {
        builder = builder.neutral(neutral);
    }
    if let Some(dtype) = entry.dtype {
        builder = builder.dtype(dtype);
    }
    Ok(builder.build(names)?)
}

fn build_label(entry: &LabelConfig, names: &mut NameSequence) -> Result<Label> {
    let rule = match (entry.intervals.is_empty(), entry.quantiles.is_empty()) {
        (false, true) => LabelRule::Intervals(
            entry
                .intervals
                .iter()
                .map(|i| Interval::new(i.category.clone(), i.low, i.high))
                .collect(),
        ),
        (true, false) => LabelRule::Quantiles(entry.quantiles.clone()),
        (false, false) => bail!("a label takes either intervals or quantiles, not both"),
        (true, true) => bail!("a label needs intervals or quantiles"),
    };
    let label = match &entry.name {
        Some(name) => Label::new(name.clone(), rule)?,
        None => Label::unnamed(rule, names)?,
    };
    Ok(label)
}
