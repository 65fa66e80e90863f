//! CLI argument definitions for the survey scorer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Encode, score, and label survey responses",
    long_about = "Encode raw survey answers into numeric codes, sum them into scores,\n\
                  and label the scores, as described by a TOML survey definition."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score and label every respondent of a response file.
    Score(ScoreArgs),

    /// Show which encoder matches each column, and neutral answer counts.
    Encode(EncodeArgs),
}

#[derive(Parser)]
pub struct ScoreArgs {
    /// CSV file with one row per respondent.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// TOML survey definition.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Remove the respondents with these keys before scoring.
    #[arg(long = "drop", value_name = "KEY", num_args = 1..)]
    pub drop: Vec<String>,

    /// Also write the result table to this CSV file.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct EncodeArgs {
    /// CSV file with one row per respondent.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// TOML survey definition.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// How observed answers must relate to an encoder's known values.
    #[arg(long = "mode", value_enum, default_value = "any")]
    pub mode: ModeArg,

    /// Columns never considered for encoding.
    #[arg(long = "ignore", value_name = "COLUMN", num_args = 1..)]
    pub ignore: Vec<String>,

    /// Also write the encoded table to this CSV file.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Observed answers are a subset of the known values.
    Any,
    /// Observed answers are exactly the known values.
    Strict,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
