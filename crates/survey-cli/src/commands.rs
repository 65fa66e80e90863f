use anyhow::{Context, Result};
use survey_cli::config::SurveyConfig;
use survey_cli::pipeline::{
    EncodeResult, ScoreResult, parse_key, read_responses, run_encode, run_score, write_csv,
};
use survey_model::{MatchMode, MatchOptions, RawValue};
use tracing::info_span;

use crate::cli::{EncodeArgs, ModeArg, ScoreArgs};

pub fn run_score_command(args: &ScoreArgs) -> Result<ScoreResult> {
    let _span = info_span!("score_command", data = %args.data.display()).entered();
    let survey = SurveyConfig::load(&args.config)?
        .build()
        .context("build survey definition")?;
    let data = read_responses(&args.data)?;
    let keys: Vec<RawValue> = args.drop.iter().map(|key| parse_key(key)).collect();
    let mut result = run_score(&data, &survey, &keys)?;
    if let Some(path) = &args.output {
        write_csv(&mut result.table, path)?;
    }
    Ok(result)
}

pub fn run_encode_command(args: &EncodeArgs) -> Result<EncodeResult> {
    let _span = info_span!("encode_command", data = %args.data.display()).entered();
    let survey = SurveyConfig::load(&args.config)?
        .build()
        .context("build survey definition")?;
    let data = read_responses(&args.data)?;
    let mode = match args.mode {
        ModeArg::Any => MatchMode::Any,
        ModeArg::Strict => MatchMode::Strict,
    };
    let options = MatchOptions::new()
        .with_ignore(args.ignore.iter().cloned())
        .with_mode(mode);
    let mut result = run_encode(&data, &survey, &options)?;
    if let Some(path) = &args.output {
        write_csv(&mut result.encoded, path)?;
    }
    Ok(result)
}
