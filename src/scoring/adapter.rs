//! Scoring adapter: standardize, then classify.

use crate::algorithm::reconcile::FeatureMatrix;
use crate::error::{Error, Result};
use crate::models::Label;
use crate::scoring::{Classifier, StandardScaler};

/// The two frozen artifacts used to label feature rows
pub struct ScoringAdapter {
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ScoringAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringAdapter")
            .field("scaler_features", &self.scaler.len())
            .field("classifier_features", &self.classifier.num_features())
            .finish()
    }
}

impl ScoringAdapter {
    /// Pair a scaler with a classifier, checking they agree on the feature count
    pub fn new(scaler: StandardScaler, classifier: Box<dyn Classifier>) -> Result<Self> {
        if let Some(expected) = classifier.num_features() {
            if expected != scaler.len() {
                return Err(Error::ArtifactLoad {
                    path: "<classifier>".into(),
                    message: format!(
                        "classifier expects {expected} features, scaler provides {}",
                        scaler.len()
                    ),
                });
            }
        }
        Ok(Self { scaler, classifier })
    }

    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Standardize the matrix and return one label per row
    pub fn score(&self, mut matrix: FeatureMatrix) -> Result<Vec<Label>> {
        self.scaler.transform(&mut matrix)?;
        let labels = self.classifier.predict(matrix.rows())?;
        if labels.len() != matrix.len() {
            return Err(Error::Schema(format!(
                "Classifier returned {} labels for {} rows",
                labels.len(),
                matrix.len()
            )));
        }
        Ok(labels)
    }
}
