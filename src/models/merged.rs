//! Merged claim rows
//!
//! A `MergedRecord` is one claim joined with its beneficiary. Beneficiary data
//! is shared between every claim of the same beneficiary.

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use super::{BeneficiaryRecord, ClaimRecord};
use crate::error::{Error, Result};
use crate::schema::merged_schema;

/// Days between 0001-01-01 (chrono's CE day 1) and the Unix epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One claim joined with its beneficiary
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub claim: ClaimRecord,
    pub beneficiary: Arc<BeneficiaryRecord>,
}

impl MergedRecord {
    #[must_use]
    pub fn new(claim: ClaimRecord, beneficiary: Arc<BeneficiaryRecord>) -> Self {
        Self { claim, beneficiary }
    }

    #[must_use]
    pub fn claim_id(&self) -> &str {
        &self.claim.claim_id
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        &self.claim.provider
    }

    #[must_use]
    pub fn bene_id(&self) -> &str {
        &self.claim.bene_id
    }

    /// Text-valued column of the merged row
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        self.claim
            .text(column)
            .or_else(|| self.beneficiary.text(column))
    }

    /// Numeric column of the merged row
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        self.claim
            .number(column)
            .or_else(|| self.beneficiary.number(column))
    }

    /// Date column of the merged row
    #[must_use]
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.claim
            .date(column)
            .or_else(|| self.beneficiary.date(column))
    }
}

pub(crate) fn to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Convert merged rows to a record batch laid out as `merged_schema()`
pub fn merged_to_record_batch(records: &[MergedRecord]) -> Result<RecordBatch> {
    let schema = merged_schema();
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let name = field.name().as_str();
            let array: ArrayRef = match field.data_type() {
                DataType::Utf8 => Arc::new(
                    records
                        .iter()
                        .map(|r| r.text(name))
                        .collect::<StringArray>(),
                ),
                DataType::Float64 => Arc::new(
                    records
                        .iter()
                        .map(|r| r.number(name))
                        .collect::<Float64Array>(),
                ),
                DataType::Date32 => Arc::new(
                    records
                        .iter()
                        .map(|r| r.date(name).map(to_date32))
                        .collect::<Date32Array>(),
                ),
                other => {
                    return Err(Error::Schema(format!(
                        "Merged column '{name}' has unsupported type {other:?}"
                    )));
                }
            };
            Ok(array)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(schema, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClaimKind;
    use crate::schema::columns;
    use arrow::array::Array;

    #[test]
    fn test_date32_epoch() {
        assert_eq!(to_date32(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(to_date32(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
    }

    #[test]
    fn test_batch_follows_merged_schema() {
        let mut bene = BeneficiaryRecord::new("B1");
        bene.age = Some(67);
        let mut claim = ClaimRecord::new("C1", "B1", "P1", ClaimKind::Inpatient);
        claim.admit_for_days = Some(3.0);
        let record = MergedRecord::new(claim, Arc::new(bene));

        let batch = merged_to_record_batch(&[record]).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.schema(), merged_schema());

        let idx = batch.schema().index_of(columns::ADMIT_FOR_DAYS).unwrap();
        let days = batch.column(idx).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(days.value(0), 3.0);

        let idx = batch.schema().index_of(columns::DOD).unwrap();
        assert!(batch.column(idx).is_null(0));
    }
}
