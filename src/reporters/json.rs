//! JSON reporter
//!
//! Compact single-line output by default, which is what callers parse.
//! Pretty output is available for humans reading a terminal.

use anyhow::Result;
use serde::Serialize;

use crate::models::ScoredRecord;

/// Render batch results as an array of records (with `Patient`)
pub fn render_batch(records: &[ScoredRecord], pretty: bool) -> Result<String> {
    render(records, pretty)
}

/// Render a single-record result as one object (without `Patient`)
pub fn render_single(record: &ScoredRecord, pretty: bool) -> Result<String> {
    render(&record.without_patient(), pretty)
}

/// Render the error object emitted on any failure
pub fn render_error(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}
