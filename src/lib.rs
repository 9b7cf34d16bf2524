//! Bariatric anomaly scoring
//!
//! Scores pre/post weight-loss clinical records against a reference
//! population. Two detectors run side by side:
//!
//! - an isolation forest over robust-scaled features
//! - a z-score distance detector over the raw features
//!
//! ```rust,ignore
//! use bariatric_anomaly::{config::Config, table, EngineState};
//!
//! let training = table::read_table_file(path, None)?;
//! let engine = EngineState::fit(&training, &Config::default())?;
//! let records = engine.score_batch(&table::read_table(&buffer, None)?)?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod reporters;
pub mod schema;
pub mod table;

pub use engine::EngineState;
pub use error::{EngineError, EngineResult, InputRole};
pub use models::{FeatureRow, FeatureStatistics, ScoredRecord};
