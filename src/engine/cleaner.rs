//! Numeric coercion and median imputation
//!
//! Missing or non-numeric cells are filled with the training median of
//! their column. The medians come from the training corpus only, so a
//! single scored record always has a defined fill value.

use tracing::debug;

use super::stats;
use crate::error::{EngineError, EngineResult};
use crate::models::{FeatureRow, FeatureVector};
use crate::schema::{CanonicalRow, CANONICAL_COLUMNS, COLUMN_COUNT, FEATURE_COUNT, NUMERIC_FEATURES};

/// One canonical row after coercion; `None` marks a missing value
pub type CoercedRow = [Option<f64>; COLUMN_COUNT];

/// Convert every canonical cell to a number or a missing marker
pub fn coerce(rows: &[CanonicalRow]) -> Vec<CoercedRow> {
    rows.iter()
        .map(|row| std::array::from_fn(|i| row[i].to_number()))
        .collect()
}

/// Training medians for all canonical columns
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMedians {
    patient_id: Option<f64>,
    features: FeatureVector,
}

impl ColumnMedians {
    /// Compute medians over the observed values of each column.
    ///
    /// A feature column with no numeric value at all cannot be imputed and
    /// is reported as degenerate.
    pub fn fit(rows: &[CoercedRow]) -> EngineResult<Self> {
        let column_median = |col: usize| -> Option<f64> {
            let observed: Vec<f64> = rows.iter().filter_map(|r| r[col]).collect();
            stats::median(&observed)
        };

        let patient_id = column_median(0);
        let mut features = [0.0; FEATURE_COUNT];
        for (i, name) in NUMERIC_FEATURES.iter().enumerate() {
            features[i] = column_median(i + 1)
                .ok_or_else(|| EngineError::degenerate(name, "no numeric values in training data"))?;
        }

        debug!(
            "Fitted medians for {} columns over {} rows",
            CANONICAL_COLUMNS.len(),
            rows.len()
        );
        Ok(Self {
            patient_id,
            features,
        })
    }

    pub fn patient_id(&self) -> Option<f64> {
        self.patient_id
    }

    pub fn feature(&self, idx: usize) -> f64 {
        self.features[idx]
    }

    /// Fill the gaps of one row
    pub fn fill(&self, row: &CoercedRow) -> FeatureRow {
        let patient_id = row[0].or(self.patient_id);
        let features = std::array::from_fn(|i| row[i + 1].unwrap_or(self.features[i]));
        FeatureRow::new(patient_id, features)
    }

    pub fn fill_all(&self, rows: &[CoercedRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.fill(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn coerced(id: Option<f64>, value: Option<f64>) -> CoercedRow {
        let mut row = [value; COLUMN_COUNT];
        row[0] = id;
        row
    }

    #[test]
    fn test_coerce_maps_cells() {
        let mut row: CanonicalRow = std::array::from_fn(|_| Cell::Number(1.0));
        row[1] = Cell::Text("abc".into());
        row[2] = Cell::Empty;
        row[3] = Cell::Text("7.5".into());
        let out = coerce(&[row]);
        assert_eq!(out[0][0], Some(1.0));
        assert_eq!(out[0][1], None);
        assert_eq!(out[0][2], None);
        assert_eq!(out[0][3], Some(7.5));
    }

    #[test]
    fn test_medians_skip_missing() {
        let rows = vec![
            coerced(Some(1.0), Some(10.0)),
            coerced(Some(2.0), None),
            coerced(Some(3.0), Some(30.0)),
        ];
        let medians = ColumnMedians::fit(&rows).unwrap();
        assert_eq!(medians.patient_id(), Some(2.0));
        assert_eq!(medians.feature(0), 20.0);
    }

    #[test]
    fn test_fill_uses_training_medians() {
        let training = vec![
            coerced(Some(1.0), Some(10.0)),
            coerced(Some(2.0), Some(20.0)),
            coerced(Some(3.0), Some(60.0)),
        ];
        let medians = ColumnMedians::fit(&training).unwrap();

        let mut new_row = coerced(None, Some(99.0));
        new_row[2] = None;
        let filled = medians.fill(&new_row);
        assert_eq!(filled.patient_id, Some(2.0));
        assert_eq!(filled.features[0], 99.0);
        assert_eq!(filled.features[1], 20.0);
    }

    #[test]
    fn test_all_missing_feature_is_degenerate() {
        let mut row = coerced(Some(1.0), Some(5.0));
        row[4] = None;
        let err = ColumnMedians::fit(&[row, row]).unwrap_err();
        match err {
            EngineError::DegenerateFeature { feature, .. } => assert_eq!(feature, "bmipre"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_all_missing_identifier_stays_missing() {
        let rows = vec![coerced(None, Some(1.0)), coerced(None, Some(2.0))];
        let medians = ColumnMedians::fit(&rows).unwrap();
        assert_eq!(medians.fill(&rows[0]).patient_id, None);
    }
}
