//! Merge detector outputs into one record

use crate::models::{FeatureVector, ScoredRecord};

pub fn combine(
    patient_id: Option<f64>,
    ensemble_anomaly: bool,
    distance_anomaly: bool,
    z_scores: FeatureVector,
) -> ScoredRecord {
    ScoredRecord {
        patient_id,
        ensemble_anomaly,
        distance_anomaly,
        z_scores,
    }
}
