//! CLI definition and dispatch

mod score;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which records of the input get scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoreMode {
    /// Every row; prints an array of records
    Batch,
    /// First row only; prints one object
    Single,
}

/// bariatric-anomaly - flag unusual pre/post weight-loss records
#[derive(Parser, Debug)]
#[command(name = "bariatric-anomaly")]
#[command(
    version,
    about = "Score clinical records for anomalies against a training population",
    long_about = "Fits a robust-scaled isolation forest and a z-score distance detector on \
the training spreadsheet, then scores the new data read from stdin (or a file).\n\n\
Required columns (case-insensitive): patientnumber, length, weightpre, weightpost, \
bmipre, bmipost, waistpre, waistpost, pulsepre, pulsepost.\n\n\
Output is a single JSON value on stdout. Failures print {\"error\": ...} and exit 1.",
    after_help = "\
Examples:
  bariatric-anomaly train.xlsx - < new.xlsx           Score every row from stdin
  bariatric-anomaly train.xlsx new.csv                Score a file
  bariatric-anomaly train.xlsx --mode single < one.xlsx   Score the first row only
  RUST_LOG=debug bariatric-anomaly train.csv < new.csv    Verbose logs on stderr"
)]
pub struct Cli {
    /// Training data (xlsx, xls, ods or csv)
    pub training: PathBuf,

    /// Data to score; `-` reads from stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Score every row (batch) or only the first (single)
    #[arg(long, value_enum, default_value_t = ScoreMode::Batch)]
    pub mode: ScoreMode,

    /// Config file (default: ./bariatric-anomaly.toml, then the user config dir)
    #[arg(long, env = "BARIATRIC_ANOMALY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,
}

/// Run the CLI and return the JSON text to print
pub fn run(cli: &Cli) -> Result<String> {
    score::run(cli)
}
