//! Score command - fit on the training file, score the new data

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{Cli, ScoreMode};
use bariatric_anomaly::config::load_config;
use bariatric_anomaly::reporters::json;
use bariatric_anomaly::table::{read_table, read_table_file};
use bariatric_anomaly::EngineState;

pub fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;
    debug!("Using config {:?}", config);

    let training = read_table_file(&cli.training, config.input.training_sheet.as_deref())
        .with_context(|| format!("Error loading training data {}", cli.training.display()))?;
    info!(
        "Loaded {} training rows from {}",
        training.len(),
        cli.training.display()
    );

    let engine = EngineState::fit(&training, &config).context("Error training models")?;

    let buffer = read_input(&cli.input)?;
    let table = read_table(&buffer, config.input.scoring_sheet.as_deref())
        .context("Error assessing new data")?;

    match cli.mode {
        ScoreMode::Batch => {
            let records = engine
                .score_batch(&table)
                .context("Error assessing new data")?;
            json::render_batch(&records, cli.pretty)
        }
        ScoreMode::Single => {
            let record = engine
                .score_single(&table)
                .context("Error assessing new data")?;
            json::render_single(&record, cli.pretty)
        }
    }
}

/// Read the whole scoring input up front: stdin for `-`, otherwise a file
fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .context("Failed to read stdin")?;
        debug!("Read {} bytes from stdin", buffer.len());
        Ok(buffer)
    } else {
        let path = Path::new(input);
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
