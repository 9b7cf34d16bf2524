//! Core data models
//!
//! Rows flowing through the engine and the scored records handed back to
//! the caller.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::{feature_index, FEATURE_COUNT, NUMERIC_FEATURES};

/// Feature values in canonical feature order
pub type FeatureVector = [f64; FEATURE_COUNT];

/// A cleaned, fully numeric record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// `patientnumber`; excluded from scoring
    pub patient_id: Option<f64>,
    pub features: FeatureVector,
}

impl FeatureRow {
    pub fn new(patient_id: Option<f64>, features: FeatureVector) -> Self {
        Self {
            patient_id,
            features,
        }
    }

    /// Value of a feature by column name
    pub fn get(&self, feature: &str) -> Option<f64> {
        feature_index(feature).map(|i| self.features[i])
    }
}

/// Per-feature statistics fitted on the training corpus
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureStatistics {
    /// Median (robust scaler center)
    pub center: f64,
    /// Interquartile range (robust scaler spread)
    pub spread: f64,
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
}

/// Verdicts and diagnostics for one scored record
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub patient_id: Option<f64>,
    pub ensemble_anomaly: bool,
    pub distance_anomaly: bool,
    /// Absolute z-score per feature, canonical order
    pub z_scores: FeatureVector,
}

impl ScoredRecord {
    /// z-score of a feature by column name
    pub fn z_score(&self, feature: &str) -> Option<f64> {
        feature_index(feature).map(|i| self.z_scores[i])
    }

    /// Either detector fired
    pub fn is_anomalous(&self) -> bool {
        self.ensemble_anomaly || self.distance_anomaly
    }

    /// View that serializes without the `Patient` key (single-record output)
    pub fn without_patient(&self) -> SingleRecord<'_> {
        SingleRecord(self)
    }

    fn serialize_fields<M: SerializeMap>(&self, map: &mut M, with_patient: bool) -> Result<(), M::Error> {
        if with_patient {
            map.serialize_entry("Patient", &PatientId(self.patient_id))?;
        }
        map.serialize_entry("Isolation_Forest_Anomaly", &self.ensemble_anomaly)?;
        map.serialize_entry("Distance_Based_Anomaly", &self.distance_anomaly)?;
        for (name, z) in NUMERIC_FEATURES.iter().zip(self.z_scores.iter()) {
            map.serialize_entry(&format!("{name}_Z_Score"), z)?;
        }
        Ok(())
    }
}

impl Serialize for ScoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 3))?;
        self.serialize_fields(&mut map, true)?;
        map.end()
    }
}

/// Borrowed single-record view of a [`ScoredRecord`]
#[derive(Debug, Clone, Copy)]
pub struct SingleRecord<'a>(&'a ScoredRecord);

impl Serialize for SingleRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 2))?;
        self.0.serialize_fields(&mut map, false)?;
        map.end()
    }
}

/// Integral identifiers go out as JSON integers
struct PatientId(Option<f64>);

impl Serialize for PatientId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
        match self.0 {
            Some(v) if v.fract() == 0.0 && v.abs() <= MAX_EXACT => serializer.serialize_i64(v as i64),
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(patient_id: Option<f64>) -> ScoredRecord {
        let mut z_scores = [0.5; FEATURE_COUNT];
        z_scores[1] = 3.25;
        ScoredRecord {
            patient_id,
            ensemble_anomaly: false,
            distance_anomaly: true,
            z_scores,
        }
    }

    #[test]
    fn test_feature_row_lookup() {
        let mut features = [0.0; FEATURE_COUNT];
        features[2] = 71.0;
        let row = FeatureRow::new(Some(4.0), features);
        assert_eq!(row.get("weightpost"), Some(71.0));
        assert_eq!(row.get("patientnumber"), None);
    }

    #[test]
    fn test_scored_record_key_order() {
        let json = serde_json::to_string(&record(Some(17.0))).unwrap();
        assert!(json.starts_with(
            r#"{"Patient":17,"Isolation_Forest_Anomaly":false,"Distance_Based_Anomaly":true,"length_Z_Score":0.5,"weightpre_Z_Score":3.25"#
        ));
        assert!(json.ends_with(r#""pulsepost_Z_Score":0.5}"#));
    }

    #[test]
    fn test_single_view_omits_patient() {
        let value = serde_json::to_value(record(Some(3.0)).without_patient()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("Patient"));
        assert_eq!(obj.len(), FEATURE_COUNT + 2);
        assert_eq!(obj["weightpre_Z_Score"], 3.25);
    }

    #[test]
    fn test_patient_id_shapes() {
        let v = serde_json::to_value(record(Some(12.5))).unwrap();
        assert_eq!(v["Patient"], 12.5);
        let v = serde_json::to_value(record(None)).unwrap();
        assert!(v["Patient"].is_null());
    }

    #[test]
    fn test_is_anomalous() {
        let mut r = record(None);
        assert!(r.is_anomalous());
        r.distance_anomaly = false;
        assert!(!r.is_anomalous());
        assert_eq!(r.z_score("weightpre"), Some(3.25));
    }
}
