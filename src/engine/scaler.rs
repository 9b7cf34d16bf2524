//! Robust scaling: `(x - median) / IQR` per feature

use super::stats;
use crate::error::{EngineError, EngineResult};
use crate::models::{FeatureRow, FeatureVector};
use crate::schema::{FEATURE_COUNT, NUMERIC_FEATURES};

#[derive(Debug, Clone, PartialEq)]
pub struct RobustScaler {
    centers: FeatureVector,
    spreads: FeatureVector,
}

impl RobustScaler {
    /// Fit centers and spreads on cleaned training rows.
    ///
    /// Fails on the first feature whose interquartile range is zero.
    pub fn fit(rows: &[FeatureRow]) -> EngineResult<Self> {
        let mut centers = [0.0; FEATURE_COUNT];
        let mut spreads = [0.0; FEATURE_COUNT];

        for (i, name) in NUMERIC_FEATURES.iter().enumerate() {
            let values: Vec<f64> = rows.iter().map(|r| r.features[i]).collect();
            let sorted = stats::sorted(&values);
            let (Some(q1), Some(q2), Some(q3)) = (
                stats::quantile(&sorted, 0.25),
                stats::quantile(&sorted, 0.5),
                stats::quantile(&sorted, 0.75),
            ) else {
                return Err(EngineError::degenerate(name, "no values to scale"));
            };
            let spread = q3 - q1;
            if spread == 0.0 || !spread.is_finite() {
                return Err(EngineError::degenerate(name, "zero interquartile range"));
            }
            centers[i] = q2;
            spreads[i] = spread;
        }

        Ok(Self { centers, spreads })
    }

    /// Apply the stored parameters; never refits
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        std::array::from_fn(|i| (features[i] - self.centers[i]) / self.spreads[i])
    }

    pub fn transform_rows(&self, rows: &[FeatureRow]) -> Vec<FeatureVector> {
        rows.iter().map(|r| self.transform(&r.features)).collect()
    }

    pub fn inverse_transform(&self, scaled: &FeatureVector) -> FeatureVector {
        std::array::from_fn(|i| scaled[i] * self.spreads[i] + self.centers[i])
    }

    pub fn centers(&self) -> &FeatureVector {
        &self.centers
    }

    pub fn spreads(&self) -> &FeatureVector {
        &self.spreads
    }
}
