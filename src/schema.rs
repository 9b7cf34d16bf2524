//! Canonical column schema
//!
//! The column list is fixed and ordered. It drives validation, the order
//! features are stored in, and the order z-scores are written out.

use crate::error::{EngineError, EngineResult};
use crate::table::{Cell, RawTable};

/// Identifier column, carried through but never scored
pub const IDENTIFIER_COLUMN: &str = "patientnumber";

/// Number of scored features
pub const FEATURE_COUNT: usize = 9;

/// Number of canonical columns (identifier + features)
pub const COLUMN_COUNT: usize = FEATURE_COUNT + 1;

/// Scored features in output order
pub const NUMERIC_FEATURES: [&str; FEATURE_COUNT] = [
    "length",
    "weightpre",
    "weightpost",
    "bmipre",
    "bmipost",
    "waistpre",
    "waistpost",
    "pulsepre",
    "pulsepost",
];

/// All required columns, identifier first
pub const CANONICAL_COLUMNS: [&str; COLUMN_COUNT] = [
    IDENTIFIER_COLUMN,
    "length",
    "weightpre",
    "weightpost",
    "bmipre",
    "bmipost",
    "waistpre",
    "waistpost",
    "pulsepre",
    "pulsepost",
];

/// Index of a numeric feature by name
pub fn feature_index(name: &str) -> Option<usize> {
    NUMERIC_FEATURES.iter().position(|f| *f == name)
}

/// A row reduced to the canonical columns, in canonical order
pub type CanonicalRow = [Cell; COLUMN_COUNT];

/// Check that every canonical column is present and project each row onto
/// them. Extra columns are dropped.
pub fn validate(table: &RawTable) -> EngineResult<Vec<CanonicalRow>> {
    let mut positions = [0usize; COLUMN_COUNT];
    let mut missing = Vec::new();

    for (slot, name) in CANONICAL_COLUMNS.iter().enumerate() {
        match table.column_index(name) {
            Some(idx) => positions[slot] = idx,
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(EngineError::Schema { missing });
    }

    Ok(table
        .rows()
        .iter()
        .map(|row| {
            std::array::from_fn(|slot| row.get(positions[slot]).cloned().unwrap_or(Cell::Empty))
        })
        .collect())
}
