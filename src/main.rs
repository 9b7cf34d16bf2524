//! bariatric-anomaly - score clinical records against a training population
//!
//! Prints exactly one JSON value on stdout. Failures are reported as
//! `{"error": ...}` with a non-zero exit code; logs go to stderr.

mod cli;

use std::process::ExitCode;

use bariatric_anomaly::reporters::json;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            println!("{}", json::render_error(e.to_string().trim_end()));
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; RUST_LOG takes precedence over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli::run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!("Scoring failed: {e:?}");
            println!("{}", json::render_error(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}
