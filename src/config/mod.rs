//! Configuration for the provider risk pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::util::safe_read_to_string;
use crate::error::{Error, Result};
use crate::schema::columns;

/// Expected one-hot levels of a categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalConfig {
    /// Source column name
    pub column: String,
    /// Every level seen at training time, including the dropped first level
    pub levels: Vec<String>,
}

impl CategoricalConfig {
    pub fn new(column: &str, levels: &[&str]) -> Self {
        Self {
            column: column.to_string(),
            levels: levels.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Configuration for merging and feature engineering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Age reference date for beneficiaries without a date of death
    pub reference_date: NaiveDate,
    /// Format of date columns delivered as text
    pub date_format: String,
    /// Number of leading characters forming a diagnosis code group
    pub code_group_len: usize,
    /// Group label assigned to a missing diagnosis code
    pub missing_code_group: String,
    /// Categorical columns encoded as dummies, in output order
    pub categorical_levels: Vec<CategoricalConfig>,
    /// Probability above which a binary classifier flags fraud
    pub fraud_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_date: NaiveDate::from_ymd_opt(2009, 12, 1).unwrap_or_default(),
            date_format: "%Y-%m-%d".to_string(),
            code_group_len: 2,
            missing_code_group: "na".to_string(),
            categorical_levels: vec![
                CategoricalConfig::new(columns::GENDER, &["1", "2"]),
                CategoricalConfig::new(columns::RACE, &["1", "2", "3", "5"]),
            ],
            fraud_threshold: 0.5,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "pipeline configuration")?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration values are usable
    pub fn validate(&self) -> Result<()> {
        if self.code_group_len == 0 {
            return Err(Error::Schema(
                "code_group_len must be at least one character".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fraud_threshold) {
            return Err(Error::Schema(format!(
                "fraud_threshold {} is outside [0, 1]",
                self.fraud_threshold
            )));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Reference Date: {}", self.reference_date)?;
        writeln!(f, "  Date Format: {}", self.date_format)?;
        writeln!(f, "  Code Group Length: {}", self.code_group_len)?;
        writeln!(f, "  Missing Code Group: {}", self.missing_code_group)?;
        for categorical in &self.categorical_levels {
            writeln!(
                f,
                "  {} Levels: {}",
                categorical.column,
                categorical.levels.join(", ")
            )?;
        }
        writeln!(f, "  Fraud Threshold: {}", self.fraud_threshold)?;
        Ok(())
    }
}

/// Locations of the fitted scaler and classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Standardization parameters (JSON)
    pub scaler_path: PathBuf,
    /// Gradient-boosted tree model (XGBoost JSON)
    pub model_path: PathBuf,
}

impl ArtifactConfig {
    pub fn new(scaler_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            scaler_path: scaler_path.into(),
            model_path: model_path.into(),
        }
    }
}
