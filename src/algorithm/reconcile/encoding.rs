//! Categorical encoding
//!
//! Categories are one-hot encoded against the levels observed over batch and
//! reference, sorted, with the first level dropped.

use crate::algorithm::features::FeatureColumn;

/// Sort category levels numerically when every level is a number, else lexically
#[must_use]
pub fn sorted_levels(levels: Vec<String>) -> Vec<String> {
    let numeric: Option<Vec<f64>> = levels.iter().map(|l| l.parse::<f64>().ok()).collect();
    let mut levels = match numeric {
        Some(values) => {
            let mut pairs: Vec<(f64, String)> = values.into_iter().zip(levels).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            pairs.into_iter().map(|(_, level)| level).collect()
        }
        None => {
            let mut levels = levels;
            levels.sort();
            levels
        }
    };
    levels.dedup();
    levels
}

/// Distinct sorted levels of one categorical column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalLevels {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoricalLevels {
    #[must_use]
    pub fn new(column: impl Into<String>, levels: Vec<String>) -> Self {
        Self {
            column: column.into(),
            levels: sorted_levels(levels),
        }
    }

    /// Collect the distinct non-null values of a column
    #[must_use]
    pub fn observe<'a>(column: &str, values: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut distinct: Vec<String> = Vec::new();
        for value in values.into_iter().flatten() {
            if !distinct.iter().any(|level| level == value) {
                distinct.push(value.to_string());
            }
        }
        Self::new(column, distinct)
    }

    /// Names of the dummy columns produced, first level dropped
    #[must_use]
    pub fn dummy_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .skip(1)
            .map(|level| format!("{}_{level}", self.column))
            .collect()
    }

    /// One 0/1 column per non-first level; a null value is all zeros
    #[must_use]
    pub fn encode(&self, values: &[Option<String>]) -> Vec<FeatureColumn> {
        self.levels
            .iter()
            .skip(1)
            .zip(self.dummy_names())
            .map(|(level, name)| {
                let indicator = values
                    .iter()
                    .map(|value| Some(if value.as_deref() == Some(level.as_str()) { 1.0 } else { 0.0 }))
                    .collect();
                FeatureColumn::numeric(name, indicator)
            })
            .collect()
    }
}
