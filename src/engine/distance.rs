//! Statistical distance detector
//!
//! Per-feature absolute z-scores against the training mean and sample
//! standard deviation. The z-scores are always returned as diagnostics;
//! the verdict reduces them with the configured aggregation.

use super::stats;
use crate::config::{DistanceAggregation, DistanceConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{FeatureRow, FeatureVector};
use crate::schema::{FEATURE_COUNT, NUMERIC_FEATURES};

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceDetector {
    means: FeatureVector,
    stds: FeatureVector,
    threshold: f64,
    aggregation: DistanceAggregation,
}

impl DistanceDetector {
    /// Fit on cleaned, unscaled training rows
    pub fn fit(rows: &[FeatureRow], config: &DistanceConfig) -> EngineResult<Self> {
        let mut means = [0.0; FEATURE_COUNT];
        let mut stds = [0.0; FEATURE_COUNT];

        for (i, name) in NUMERIC_FEATURES.iter().enumerate() {
            let values: Vec<f64> = rows.iter().map(|r| r.features[i]).collect();
            let (Some(mean), Some(std)) = (stats::mean(&values), stats::sample_std(&values)) else {
                return Err(EngineError::degenerate(
                    name,
                    "standard deviation needs at least two values",
                ));
            };
            if std == 0.0 || !std.is_finite() {
                return Err(EngineError::degenerate(name, "zero standard deviation"));
            }
            means[i] = mean;
            stds[i] = std;
        }

        Ok(Self {
            means,
            stds,
            threshold: config.z_threshold,
            aggregation: config.aggregation,
        })
    }

    /// `|x - mean| / std` for every feature
    pub fn z_scores(&self, features: &FeatureVector) -> FeatureVector {
        std::array::from_fn(|i| (features[i] - self.means[i]).abs() / self.stds[i])
    }

    pub fn is_anomaly(&self, z_scores: &FeatureVector) -> bool {
        self.aggregation.exceeds(z_scores, self.threshold)
    }

    pub fn means(&self) -> &FeatureVector {
        &self.means
    }

    pub fn stds(&self) -> &FeatureVector {
        &self.stds
    }

    pub fn aggregation(&self) -> DistanceAggregation {
        self.aggregation
    }
}
