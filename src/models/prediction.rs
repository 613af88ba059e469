//! Classifier output per claim

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};
use std::fmt;

use crate::error::Result;

/// Class label produced by the classifier; 1 marks potential fraud for binary models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

impl Label {
    pub const NOT_FRAUD: Self = Self(0);
    pub const FRAUD: Self = Self(1);

    #[must_use]
    pub const fn is_fraud(self) -> bool {
        self.0 == Self::FRAUD.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scored claim of the caller's batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "ClaimID")]
    pub claim_id: String,
    #[serde(rename = "Provider")]
    pub provider: String,
    #[serde(rename = "PredictedFraud")]
    pub predicted_fraud: u32,
}

impl Prediction {
    #[must_use]
    pub fn new(claim_id: impl Into<String>, provider: impl Into<String>, label: Label) -> Self {
        Self {
            claim_id: claim_id.into(),
            provider: provider.into(),
            predicted_fraud: label.0,
        }
    }

    #[must_use]
    pub const fn label(&self) -> Label {
        Label(self.predicted_fraud)
    }
}

/// Convert predictions to a record batch using `serde_arrow`
pub fn predictions_to_record_batch(predictions: &[Prediction]) -> Result<RecordBatch> {
    let fields = Vec::<FieldRef>::from_type::<Prediction>(TracingOptions::default())?;
    Ok(serde_arrow::to_record_batch(&fields, &predictions)?)
}
