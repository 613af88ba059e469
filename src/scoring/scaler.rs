//! Frozen standardization transform
//!
//! Parameters are fitted once at training time and stored as JSON with the
//! feature names in fitted order. Those names are the frozen feature order the
//! rest of the pipeline is checked against.

use serde::Deserialize;
use std::path::Path;

use crate::algorithm::reconcile::FeatureMatrix;
use crate::error::util::read_artifact;
use crate::error::{Error, Result};
use crate::schema::FrozenSchema;
use crate::utils::logging::log_warning;

#[derive(Debug, Deserialize)]
struct ScalerArtifact {
    #[serde(alias = "feature_names_in_")]
    feature_names: Vec<String>,
    #[serde(alias = "mean_")]
    mean: Vec<f64>,
    #[serde(alias = "scale_")]
    scale: Vec<f64>,
}

/// Per-column `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters
    ///
    /// A zero scale is replaced by one so constant columns are only centred.
    pub fn new(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != feature_names.len() || scale.len() != feature_names.len() {
            return Err(Error::Schema(format!(
                "Scaler has {} feature names, {} means and {} scales",
                feature_names.len(),
                mean.len(),
                scale.len()
            )));
        }
        let scale = scale
            .into_iter()
            .zip(&feature_names)
            .map(|(s, name)| {
                if s == 0.0 {
                    log_warning("Zero scale for scaler column, using 1", Some(name));
                    1.0
                } else {
                    s
                }
            })
            .collect();
        Ok(Self {
            feature_names,
            mean,
            scale,
        })
    }

    /// Load fitted parameters from a JSON artifact
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_artifact(path, "standardization parameters")?;
        Self::from_json_str(&content).map_err(|e| Error::artifact(path, e.to_string()))
    }

    /// Parse fitted parameters from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let artifact: ScalerArtifact = serde_json::from_str(content)?;
        Self::new(artifact.feature_names, artifact.mean, artifact.scale)
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    /// The feature order the scaler was fitted on
    #[must_use]
    pub fn frozen_schema(&self) -> FrozenSchema {
        FrozenSchema::new(self.feature_names.clone())
    }

    /// Standardize every row of the matrix in place
    pub fn transform(&self, matrix: &mut FeatureMatrix) -> Result<()> {
        self.frozen_schema().verify(matrix.column_names())?;
        for row in matrix.rows_mut() {
            for ((value, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *value = (*value - mean) / scale;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(columns: &[&str], rows: Vec<Vec<f64>>) -> FeatureMatrix {
        FeatureMatrix::new(
            (0..rows.len()).map(|i| format!("C{i}")).collect(),
            vec!["P1".to_string(); rows.len()],
            columns.iter().map(ToString::to_string).collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_transform_standardizes() {
        let scaler = StandardScaler::from_json_str(
            r#"{"feature_names": ["a", "b"], "mean": [1.0, 10.0], "scale": [2.0, 0.0]}"#,
        )
        .unwrap();
        let mut m = matrix(&["a", "b"], vec![vec![5.0, 12.0]]);
        scaler.transform(&mut m).unwrap();
        assert_eq!(m.rows(), &[vec![2.0, 2.0]]);
    }

    #[test]
    fn test_fitted_attribute_aliases() {
        let scaler = StandardScaler::from_json_str(
            r#"{"feature_names_in_": ["a"], "mean_": [0.0], "scale_": [1.0]}"#,
        )
        .unwrap();
        assert_eq!(scaler.feature_names(), &["a".to_string()]);
    }

    #[test]
    fn test_length_disagreement_rejected() {
        assert!(
            StandardScaler::from_json_str(r#"{"feature_names": ["a"], "mean": [], "scale": [1.0]}"#)
                .is_err()
        );
    }

    #[test]
    fn test_transform_rejects_other_order() {
        let scaler = StandardScaler::new(
            vec!["a".into(), "b".into()],
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        )
        .unwrap();
        let mut m = matrix(&["b", "a"], vec![vec![1.0, 2.0]]);
        assert!(matches!(
            scaler.transform(&mut m),
            Err(Error::SchemaMismatch { position: 0, .. })
        ));
    }
}
