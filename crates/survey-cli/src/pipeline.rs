//! Command pipelines: ingest a response file, run the survey, collect results.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::{
    Column, CsvReadOptions, CsvWriter, DataFrame, IntoColumn, NamedFrom, SerReader, SerWriter,
    Series,
};
use serde::Serialize;
use survey_model::{MatchOptions, RawValue};
use survey_transform::{MultiEncoder, Questionnaire};
use tracing::{info, info_span};

use crate::config::Survey;

/// Reads a CSV response file with a header row.
pub fn read_responses(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("open {}", path.display()))?
        .finish()
        .with_context(|| format!("parse {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded responses");
    Ok(df)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "wrote results");
    Ok(())
}

/// Interprets a command-line row key: integers match numeric keys, anything
/// else matches text keys.
pub fn parse_key(value: &str) -> RawValue {
    match value.trim().parse::<i64>() {
        Ok(number) => RawValue::Integer(number),
        Err(_) => RawValue::Text(value.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// Key column, then every score column, then every label column.
    pub table: DataFrame,
    pub dropped: usize,
    pub key_column: String,
}

/// Scores and labels every respondent, after removing the rows keyed by `drop_keys`.
pub fn run_score(data: &DataFrame, survey: &Survey, drop_keys: &[RawValue]) -> Result<ScoreResult> {
    let _span = info_span!("score", scorings = survey.scorings.len()).entered();
    let mut questionnaire = match &survey.key_column {
        Some(key) => Questionnaire::with_key_column(data, key, survey.scorings.clone())?,
        None => Questionnaire::new(data, survey.scorings.clone())?,
    };
    let dropped = if drop_keys.is_empty() {
        0
    } else {
        questionnaire.drop(drop_keys)?
    };

    let scores = questionnaire.score()?.clone();
    let labels = questionnaire.label()?.clone();
    let mut columns: Vec<Column> = scores.get_columns().to_vec();
    columns.extend(labels.get_columns().iter().skip(1).cloned());

    Ok(ScoreResult {
        table: DataFrame::new(columns)?,
        dropped,
        key_column: questionnaire.key_column().to_string(),
    })
}

/// One row of the rule record: a column and the encoder applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRow {
    pub column: String,
    pub encoder: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EncodeResult {
    pub rules: Vec<RuleRow>,
    pub encoded: DataFrame,
    /// Per-respondent neutral tally, absent when no matched encoder has a neutral code.
    pub neutral_counts: Option<Series>,
}

/// Matches every column against all configured encoders, first match wins.
pub fn run_encode(data: &DataFrame, survey: &Survey, options: &MatchOptions) -> Result<EncodeResult> {
    let _span = info_span!("encode", encoders = survey.encoders.len(), mode = %options.mode).entered();
    let multi = MultiEncoder::new(survey.encoders.clone()).context("no encoders configured")?;
    let encoded = multi.transform_frame(data, options)?;
    let neutral_counts = multi.count_neutral_frame(data, options)?;
    let rules: Vec<RuleRow> = encoded
        .rules
        .iter()
        .map(|(column, encoder)| RuleRow {
            column: column.to_string(),
            encoder: encoder.map(str::to_string),
        })
        .collect();
    info!(
        matched = rules.iter().filter(|row| row.encoder.is_some()).count(),
        columns = rules.len(),
        "matched columns"
    );
    Ok(EncodeResult {
        rules,
        encoded: encoded.frame,
        neutral_counts,
    })
}

/// The neutral tally as a table next to the row position.
pub fn neutral_table(counts: &Series) -> Result<DataFrame> {
    let positions: Vec<u32> = (0..counts.len() as u32).collect();
    Ok(DataFrame::new(vec![
        Series::new("row".into(), positions).into_column(),
        counts.clone().into_column(),
    ])?)
}
