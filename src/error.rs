//! Error kinds for the scoring engine
//!
//! Every failure is terminal for the invocation. The CLI turns any of these
//! into a single `{"error": ...}` object and a non-zero exit code.

use std::fmt;
use thiserror::Error;

/// Which input a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Training,
    Scoring,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRole::Training => write!(f, "training data"),
            InputRole::Scoring => write!(f, "scoring input"),
        }
    }
}

/// Errors raised while loading, fitting or scoring
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Degenerate feature '{feature}': {reason}")]
    DegenerateFeature { feature: String, reason: &'static str },

    #[error("Could not read tabular data: {0}")]
    InputFormat(String),

    #[error("The {input} contains no data rows")]
    EmptyInput { input: InputRole },

    #[error("Training data has {found} row(s), at least {required} are needed")]
    TooFewRows { found: usize, required: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn degenerate(feature: &str, reason: &'static str) -> Self {
        EngineError::DegenerateFeature {
            feature: feature.to_string(),
            reason,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
