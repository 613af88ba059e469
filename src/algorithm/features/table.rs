//! The wide per-claim feature table
//!
//! One row per distinct batch claim. Starts from the merged columns of the
//! batch rows and grows by joining feature columns keyed by claim identifier.

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::MergedRecord;
use crate::models::merged::to_date32;
use crate::schema::{columns, merged_schema};

/// Values of one feature column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnValues {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
            Self::Date(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    fn reorder(self, order: &[usize]) -> Self {
        match self {
            Self::Numeric(values) => Self::Numeric(order.iter().map(|&i| values[i]).collect()),
            Self::Text(mut values) => {
                Self::Text(order.iter().map(|&i| values[i].take()).collect())
            }
            Self::Date(values) => Self::Date(order.iter().map(|&i| values[i]).collect()),
        }
    }
}

/// A named column of the feature table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    pub name: String,
    pub values: ColumnValues,
}

impl FeatureColumn {
    #[must_use]
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    #[must_use]
    pub fn date(name: impl Into<String>, values: Vec<Option<NaiveDate>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Date(values),
        }
    }

    fn to_arrow(&self) -> (Field, ArrayRef) {
        match &self.values {
            ColumnValues::Numeric(values) => (
                Field::new(&self.name, DataType::Float64, true),
                Arc::new(values.iter().copied().collect::<Float64Array>()),
            ),
            ColumnValues::Text(values) => (
                Field::new(&self.name, DataType::Utf8, true),
                Arc::new(values.iter().map(Option::as_deref).collect::<StringArray>()),
            ),
            ColumnValues::Date(values) => (
                Field::new(&self.name, DataType::Date32, true),
                Arc::new(
                    values
                        .iter()
                        .map(|date| date.map(to_date32))
                        .collect::<Date32Array>(),
                ),
            ),
        }
    }
}

/// Per-claim feature table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    claim_ids: Vec<String>,
    providers: Vec<String>,
    columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    /// Start a table from the merged columns of distinct batch rows
    ///
    /// `ClaimID` and `Provider` are kept as row keys rather than columns.
    #[must_use]
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MergedRecord>) -> Self {
        let records: Vec<&MergedRecord> = records.into_iter().collect();
        let schema = merged_schema();

        let columns = schema
            .fields()
            .iter()
            .filter(|field| {
                field.name() != columns::CLAIM_ID && field.name() != columns::PROVIDER
            })
            .map(|field| {
                let name = field.name().as_str();
                match field.data_type() {
                    DataType::Float64 => FeatureColumn::numeric(
                        name,
                        records.iter().map(|r| r.number(name)).collect(),
                    ),
                    DataType::Date32 => {
                        FeatureColumn::date(name, records.iter().map(|r| r.date(name)).collect())
                    }
                    _ => FeatureColumn::text(
                        name,
                        records
                            .iter()
                            .map(|r| r.text(name).map(ToString::to_string))
                            .collect(),
                    ),
                }
            })
            .collect();

        Self {
            claim_ids: records.iter().map(|r| r.claim_id().to_string()).collect(),
            providers: records.iter().map(|r| r.provider().to_string()).collect(),
            columns,
        }
    }

    /// Build a table from keys and columns already aligned with them
    pub fn from_parts(
        claim_ids: Vec<String>,
        providers: Vec<String>,
        columns: Vec<FeatureColumn>,
    ) -> Result<Self> {
        let mut table = Self {
            claim_ids,
            providers,
            columns: Vec::with_capacity(columns.len()),
        };
        if table.providers.len() != table.claim_ids.len() {
            return Err(Error::Schema(format!(
                "{} providers given for {} claims",
                table.providers.len(),
                table.claim_ids.len()
            )));
        }
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claim_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claim_ids.is_empty()
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
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric values of a column, if it exists and is numeric
    #[must_use]
    pub fn numeric(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.values {
            ColumnValues::Numeric(values) => Some(values),
            _ => None,
        }
    }

    /// Remove and return a column
    pub fn take_column(&mut self, name: &str) -> Option<FeatureColumn> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Split the table into its keys and columns
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<String>, Vec<FeatureColumn>) {
        (self.claim_ids, self.providers, self.columns)
    }

    /// Append a column already aligned with the table's rows
    pub fn push_column(&mut self, column: FeatureColumn) -> Result<()> {
        if column.values.len() != self.len() {
            return Err(Error::Schema(format!(
                "Feature column '{}' has {} rows, table has {}",
                column.name,
                column.values.len(),
                self.len()
            )));
        }
        if self.column(&column.name).is_some() {
            return Err(Error::Schema(format!(
                "Feature column '{}' already present",
                column.name
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Join feature columns computed for `keys` onto the table by claim identifier
    ///
    /// Every table row must find its claim among `keys`.
    pub fn join_keyed<S: AsRef<str>>(
        &mut self,
        keys: &[S],
        columns: Vec<FeatureColumn>,
    ) -> Result<()> {
        let positions: FxHashMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.as_ref(), idx))
            .collect();

        let order = self
            .claim_ids
            .iter()
            .map(|claim| {
                positions.get(claim.as_str()).copied().ok_or_else(|| {
                    Error::Schema(format!("No feature values computed for claim '{claim}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let aligned = order.iter().enumerate().all(|(row, &idx)| row == idx)
            && keys.len() == self.len();

        for column in columns {
            if column.values.len() != keys.len() {
                return Err(Error::Schema(format!(
                    "Feature column '{}' has {} rows for {} keys",
                    column.name,
                    column.values.len(),
                    keys.len()
                )));
            }
            let column = if aligned {
                column
            } else {
                FeatureColumn {
                    values: column.values.reorder(&order),
                    name: column.name,
                }
            };
            self.push_column(column)?;
        }
        Ok(())
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
        for column in &self.columns {
            let (field, array) = column.to_arrow();
            fields.push(field);
            arrays.push(array);
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}
