//! Schema reconciler
//!
//! Turns the wide feature table into the numeric matrix the scaler expects:
//! categorical columns become dummies appended last, grouping-only columns
//! are dropped, missing values become zero and the column order is checked
//! against the frozen training order.

pub mod encoding;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;
use std::sync::Arc;

use crate::algorithm::features::{ColumnValues, FeatureColumn, FeatureTable};
use crate::error::{Error, Result};
use crate::schema::{FrozenSchema, columns};

pub use encoding::{CategoricalLevels, sorted_levels};

/// Numeric feature rows keyed by claim and provider
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    claim_ids: Vec<String>,
    providers: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build a matrix, checking every row has one value per column
    pub fn new(
        claim_ids: Vec<String>,
        providers: Vec<String>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if claim_ids.len() != rows.len() || providers.len() != rows.len() {
            return Err(Error::Schema(format!(
                "{} claims and {} providers for {} feature rows",
                claim_ids.len(),
                providers.len(),
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().position(|row| row.len() != columns.len()) {
            return Err(Error::Schema(format!(
                "Feature row {row} has {} values, expected {}",
                rows[row].len(),
                columns.len()
            )));
        }
        Ok(Self {
            claim_ids,
            providers,
            columns,
            rows,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn claim_ids(&self) -> &[String] {
        &self.claim_ids
    }

    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.rows
    }

    /// Value of a named column for the row of `claim_id`
    #[must_use]
    pub fn value(&self, claim_id: &str, column: &str) -> Option<f64> {
        let row = self.claim_ids.iter().position(|c| c == claim_id)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.rows[row][col])
    }

    /// Convert to a record batch with `ClaimID` and `Provider` first
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new(columns::CLAIM_ID, DataType::Utf8, false),
            Field::new(columns::PROVIDER, DataType::Utf8, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(&self.claim_ids)),
            Arc::new(StringArray::from_iter_values(&self.providers)),
        ];
        for (idx, name) in self.columns.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|row| row[idx]),
            )));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// Prunes, encodes and orders engineered features
#[derive(Debug, Clone)]
pub struct SchemaReconciler {
    frozen: FrozenSchema,
    removed: Vec<&'static str>,
}

impl SchemaReconciler {
    #[must_use]
    pub fn new(frozen: FrozenSchema) -> Self {
        Self {
            frozen,
            removed: columns::removed_columns(),
        }
    }

    #[must_use]
    pub fn frozen(&self) -> &FrozenSchema {
        &self.frozen
    }

    /// Reconcile a feature table into the frozen numeric layout
    pub fn reconcile(
        &self,
        table: FeatureTable,
        levels: &[CategoricalLevels],
    ) -> Result<FeatureMatrix> {
        let (claim_ids, providers, table_columns) = table.into_parts();

        let mut dummies = Vec::new();
        for categorical in levels {
            let column = table_columns
                .iter()
                .find(|c| c.name == categorical.column)
                .ok_or_else(|| {
                    Error::Schema(format!(
                        "Categorical column '{}' missing from feature table",
                        categorical.column
                    ))
                })?;
            let ColumnValues::Text(values) = &column.values else {
                return Err(Error::Schema(format!(
                    "Categorical column '{}' is not text",
                    categorical.column
                )));
            };
            dummies.extend(categorical.encode(values));
        }

        let before = table_columns.len();
        let kept: Vec<FeatureColumn> = table_columns
            .into_iter()
            .filter(|c| !self.removed.iter().any(|r| *r == c.name))
            .chain(dummies)
            .collect();
        debug!(
            "Reconciled {before} feature columns into {} numeric columns",
            kept.len()
        );

        let mut names = Vec::with_capacity(kept.len());
        let mut numeric = Vec::with_capacity(kept.len());
        for (position, column) in kept.into_iter().enumerate() {
            let ColumnValues::Numeric(values) = column.values else {
                return Err(Error::SchemaMismatch {
                    position,
                    expected: self
                        .frozen
                        .columns()
                        .get(position)
                        .cloned()
                        .unwrap_or_default(),
                    found: format!("{} (non-numeric)", column.name),
                });
            };
            names.push(column.name);
            numeric.push(values);
        }
        self.frozen.verify(&names)?;

        let rows = (0..claim_ids.len())
            .map(|row| {
                numeric
                    .iter()
                    .map(|values| values[row].unwrap_or(0.0))
                    .collect()
            })
            .collect();

        FeatureMatrix::new(claim_ids, providers, names, rows)
    }
}
