//! Anomaly scoring engine
//!
//! `EngineState::fit` validates and cleans a training table, then fits the
//! robust scaler, the isolation forest and the distance detector. The
//! result is immutable; scoring only reads from it, so one fitted state can
//! be shared by reference across threads.
//!
//! Pipeline: raw rows → schema check → cleaning (training medians) →
//! {robust scaling → isolation forest, z-scores → distance verdict} →
//! combined record.

pub mod cleaner;
pub mod combiner;
pub mod distance;
pub mod forest;
pub mod scaler;
pub mod stats;

pub use cleaner::ColumnMedians;
pub use distance::DistanceDetector;
pub use forest::IsolationForest;
pub use scaler::RobustScaler;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{EngineError, EngineResult, InputRole};
use crate::models::{FeatureRow, FeatureStatistics, ScoredRecord};
use crate::schema::{self, FEATURE_COUNT};
use crate::table::RawTable;

/// Everything learned from the training corpus
#[derive(Debug, Clone)]
pub struct EngineState {
    medians: ColumnMedians,
    scaler: RobustScaler,
    forest: IsolationForest,
    distance: DistanceDetector,
    training_rows: usize,
}

impl EngineState {
    /// Fit every component on a training table
    pub fn fit(training: &RawTable, config: &Config) -> EngineResult<Self> {
        config.validate()?;

        let canonical = schema::validate(training)?;
        match canonical.len() {
            0 => {
                return Err(EngineError::EmptyInput {
                    input: InputRole::Training,
                })
            }
            1 => return Err(EngineError::TooFewRows { found: 1, required: 2 }),
            _ => {}
        }

        let coerced = cleaner::coerce(&canonical);
        let medians = ColumnMedians::fit(&coerced)?;
        let rows = medians.fill_all(&coerced);

        Self::fit_rows(medians, &rows, config)
    }

    /// Fit the models on rows that are already clean
    pub fn fit_rows(medians: ColumnMedians, rows: &[FeatureRow], config: &Config) -> EngineResult<Self> {
        let scaler = RobustScaler::fit(rows)?;
        let distance = DistanceDetector::fit(rows, &config.distance)?;
        let scaled = scaler.transform_rows(rows);
        let forest = IsolationForest::fit(&scaled, &config.forest)?;

        info!(
            "Fitted engine on {} training rows ({} trees, contamination {}, {:?} z-score rule)",
            rows.len(),
            forest.tree_count(),
            config.forest.contamination,
            distance.aggregation()
        );

        Ok(Self {
            medians,
            scaler,
            forest,
            distance,
            training_rows: rows.len(),
        })
    }

    /// Validate and clean a scoring table against the training medians
    pub fn clean(&self, table: &RawTable) -> EngineResult<Vec<FeatureRow>> {
        let canonical = schema::validate(table)?;
        let coerced = cleaner::coerce(&canonical);
        Ok(self.medians.fill_all(&coerced))
    }

    /// Score one clean row
    pub fn score_row(&self, row: &FeatureRow) -> ScoredRecord {
        let scaled = self.scaler.transform(&row.features);
        let ensemble_anomaly = self.forest.is_anomaly(&scaled);
        let z_scores = self.distance.z_scores(&row.features);
        let distance_anomaly = self.distance.is_anomaly(&z_scores);
        combiner::combine(row.patient_id, ensemble_anomaly, distance_anomaly, z_scores)
    }

    /// Score every row, preserving order. Zero rows give an empty result.
    pub fn score_batch(&self, table: &RawTable) -> EngineResult<Vec<ScoredRecord>> {
        let rows = self.clean(table)?;
        let records: Vec<ScoredRecord> = rows.iter().map(|r| self.score_row(r)).collect();

        let ensemble = records.iter().filter(|r| r.ensemble_anomaly).count();
        let distance = records.iter().filter(|r| r.distance_anomaly).count();
        info!(
            "Scored {} records: {} ensemble anomalies, {} distance anomalies",
            records.len(),
            ensemble,
            distance
        );
        Ok(records)
    }

    /// Score only the first row of the table
    pub fn score_single(&self, table: &RawTable) -> EngineResult<ScoredRecord> {
        let rows = self.clean(table)?;
        let row = rows.first().ok_or(EngineError::EmptyInput {
            input: InputRole::Scoring,
        })?;
        if table.len() > 1 {
            debug!("Single-record mode: ignoring {} trailing rows", table.len() - 1);
        }
        Ok(self.score_row(row))
    }

    /// Fitted statistics per feature, canonical order
    pub fn feature_statistics(&self) -> [FeatureStatistics; FEATURE_COUNT] {
        std::array::from_fn(|i| FeatureStatistics {
            center: self.scaler.centers()[i],
            spread: self.scaler.spreads()[i],
            mean: self.distance.means()[i],
            std: self.distance.stds()[i],
        })
    }

    pub fn medians(&self) -> &ColumnMedians {
        &self.medians
    }

    pub fn scaler(&self) -> &RobustScaler {
        &self.scaler
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }

    pub fn distance(&self) -> &DistanceDetector {
        &self.distance
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }
}
