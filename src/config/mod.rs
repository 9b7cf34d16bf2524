//! Engine configuration
//!
//! Loads settings from a TOML file. Every field has a default, so an empty
//! file (or no file at all) gives the reference behaviour.
//!
//! # Configuration Format
//!
//! ```toml
//! # bariatric-anomaly.toml
//!
//! [forest]
//! contamination = 0.23
//! trees = 100
//! max_samples = 256
//! seed = 42
//!
//! [distance]
//! z_threshold = 2.0
//! aggregation = "mean"   # or "any"
//!
//! [input]
//! training_sheet = "Ark1"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Expected share of anomalies in the training corpus
pub const DEFAULT_CONTAMINATION: f64 = 0.23;

/// z-score above which the distance detector fires
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// How per-feature z-scores are reduced to one verdict
pub const DEFAULT_DISTANCE_AGGREGATION: DistanceAggregation = DistanceAggregation::Mean;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TREES: usize = 100;
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Project-local config file name
pub const CONFIG_FILE_NAME: &str = "bariatric-anomaly.toml";

/// Reduction applied to the z-score vector before comparing to the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceAggregation {
    /// Mean of all z-scores exceeds the threshold
    Mean,
    /// Any single z-score exceeds the threshold
    Any,
}

impl DistanceAggregation {
    pub fn exceeds(&self, z_scores: &[f64], threshold: f64) -> bool {
        match self {
            DistanceAggregation::Mean => {
                if z_scores.is_empty() {
                    return false;
                }
                z_scores.iter().sum::<f64>() / z_scores.len() as f64 > threshold
            }
            DistanceAggregation::Any => z_scores.iter().any(|z| *z > threshold),
        }
    }
}

/// Isolation forest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForestConfig {
    /// Fraction of training points treated as anomalous, in (0, 0.5]
    pub contamination: f64,
    pub trees: usize,
    /// Upper bound on each tree's subsample size
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            trees: DEFAULT_TREES,
            max_samples: DEFAULT_MAX_SAMPLES,
            seed: DEFAULT_SEED,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> EngineResult<()> {
        let c = self.contamination;
        if !(c > 0.0 && c <= 0.5) {
            return Err(EngineError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {c}"
            )));
        }
        if self.trees == 0 {
            return Err(EngineError::InvalidConfig("trees must be at least 1".into()));
        }
        if self.max_samples < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        Ok(())
    }
}

/// z-score detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistanceConfig {
    pub z_threshold: f64,
    pub aggregation: DistanceAggregation,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            aggregation: DEFAULT_DISTANCE_AGGREGATION,
        }
    }
}

/// Which worksheet to read from workbook inputs (first sheet when unset)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub training_sheet: Option<String>,
    pub scoring_sheet: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub forest: ForestConfig,
    pub distance: DistanceConfig,
    pub input: InputConfig,
}

impl Config {
    /// Parse from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Range checks run before fitting
    pub fn validate(&self) -> EngineResult<()> {
        self.forest.validate()?;
        let z = self.distance.z_threshold;
        if !(z.is_finite() && z > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "z_threshold must be a positive number, got {z}"
            )));
        }
        Ok(())
    }
}

/// Get the user-level config path (~/.config/bariatric-anomaly/config.toml)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bariatric-anomaly").join("config.toml"))
}

/// Load configuration.
///
/// Searches in this order:
/// 1. `explicit` path (errors are fatal)
/// 2. `bariatric-anomaly.toml` in the working directory
/// 3. the user config file
///
/// Returns defaults if nothing is found. The result is validated.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => discover_config(),
    };
    config.validate()?;
    Ok(config)
}

fn discover_config() -> Config {
    let candidates = std::iter::once(PathBuf::from(CONFIG_FILE_NAME)).chain(user_config_path());
    for path in candidates {
        if !path.exists() {
            continue;
        }
        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No config file found, using defaults");
    Config::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Config::from_toml(&content)
}
