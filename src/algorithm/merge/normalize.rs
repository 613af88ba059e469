//! Row normalization for the record merger
//!
//! Reads beneficiary and claim batches into typed records, normalizing flag
//! encodings and deriving age, death and length-of-stay columns.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::models::beneficiary::CHRONIC_CONDITION_COUNT;
use crate::models::{BeneficiaryRecord, ClaimKind, ClaimRecord};
use crate::schema::{
    beneficiary_schema, columns, inpatient_schema, merged_schema, outpatient_schema,
    require_columns,
};
use crate::utils::arrow::{date_values, float_values, string_values};

/// Map a chronic condition flag onto {0, 1}; the source encodes "no" as 2
#[must_use]
pub fn normalize_chronic_flag(value: f64) -> u8 {
    if value == 2.0 || value == 0.0 { 0 } else { 1 }
}

/// Map the renal disease indicator onto {0, 1}; only "Y" (or a non-zero number) is 1
#[must_use]
pub fn normalize_renal_indicator(value: Option<&str>) -> u8 {
    match value.map(str::trim) {
        Some("Y" | "y") => 1,
        Some(text) => text.parse::<f64>().map_or(0, |v| u8::from(v != 0.0)),
        None => 0,
    }
}

/// Age in whole years between birth and death, or birth and `reference_date`
#[must_use]
pub fn age_in_years(
    dob: Option<NaiveDate>,
    dod: Option<NaiveDate>,
    reference_date: NaiveDate,
) -> Option<i32> {
    let dob = dob?;
    let until = dod.unwrap_or(reference_date);
    let days = (until - dob).num_days() as f64;
    Some((days / 365.0).round() as i32)
}

/// Inclusive stay length: discharge minus admission plus one day
#[must_use]
pub fn admit_for_days(admission: Option<NaiveDate>, discharge: Option<NaiveDate>) -> Option<f64> {
    Some(((discharge? - admission?).num_days() + 1) as f64)
}

/// Column reader for one batch; parse errors report rows across all batches
struct BatchColumns<'a> {
    batch: &'a RecordBatch,
    date_format: &'a str,
    offset: usize,
}

impl<'a> BatchColumns<'a> {
    fn text(&self, column: &str) -> Result<Vec<Option<String>>> {
        Ok(string_values(self.batch, column, true)
            .map_err(|e| e.with_row_offset(self.offset))?
            .unwrap_or_default())
    }

    fn optional_text(&self, column: &str) -> Result<Option<Vec<Option<String>>>> {
        string_values(self.batch, column, false).map_err(|e| e.with_row_offset(self.offset))
    }

    fn number(&self, column: &str) -> Result<Vec<Option<f64>>> {
        Ok(float_values(self.batch, column, true)
            .map_err(|e| e.with_row_offset(self.offset))?
            .unwrap_or_default())
    }

    fn date(&self, column: &str) -> Result<Vec<Option<NaiveDate>>> {
        Ok(date_values(self.batch, column, self.date_format, true)
            .map_err(|e| e.with_row_offset(self.offset))?
            .unwrap_or_default())
    }

    /// Identifier column; a null identifier rejects the batch
    fn identifiers(&self, column: &str) -> Result<Vec<String>> {
        self.text(column)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    Error::Schema(format!(
                        "Identifier column '{column}' is null at row {}",
                        row + self.offset
                    ))
                })
            })
            .collect()
    }
}

/// Read beneficiary batches into normalized records
pub fn read_beneficiaries(
    batches: &[RecordBatch],
    config: &PipelineConfig,
) -> Result<Vec<BeneficiaryRecord>> {
    let required = beneficiary_schema();
    let mut records = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut offset = 0;

    for batch in batches {
        require_columns(&batch.schema(), &required, "Beneficiary")?;
        let cols = BatchColumns {
            batch,
            date_format: &config.date_format,
            offset,
        };

        let ids = cols.identifiers(columns::BENE_ID)?;
        let dob = cols.date(columns::DOB)?;
        let dod = cols.date(columns::DOD)?;
        let mut gender = cols.text(columns::GENDER)?;
        let mut race = cols.text(columns::RACE)?;
        let renal = cols.text(columns::RENAL_DISEASE_INDICATOR)?;
        let mut state = cols.text(columns::STATE)?;
        let mut county = cols.text(columns::COUNTY)?;
        let part_a = cols.number(columns::NO_OF_MONTHS_PART_A_COV)?;
        let part_b = cols.number(columns::NO_OF_MONTHS_PART_B_COV)?;
        let chronic = columns::CHRONIC_CONDITIONS
            .iter()
            .map(|name| cols.number(name))
            .collect::<Result<Vec<_>>>()?;
        let ip_reimbursement = cols.number(columns::IP_ANNUAL_REIMBURSEMENT_AMT)?;
        let ip_deductible = cols.number(columns::IP_ANNUAL_DEDUCTIBLE_AMT)?;
        let op_reimbursement = cols.number(columns::OP_ANNUAL_REIMBURSEMENT_AMT)?;
        let op_deductible = cols.number(columns::OP_ANNUAL_DEDUCTIBLE_AMT)?;

        for (row, bene_id) in ids.into_iter().enumerate() {
            let mut chronic_conditions = [None; CHRONIC_CONDITION_COUNT];
            for (flag, values) in chronic_conditions.iter_mut().zip(&chronic) {
                *flag = values[row].map(normalize_chronic_flag);
            }

            records.push(BeneficiaryRecord {
                bene_id,
                dob: dob[row],
                dod: dod[row],
                gender: gender[row].take(),
                race: race[row].take(),
                renal_disease: normalize_renal_indicator(renal[row].as_deref()),
                state: state[row].take(),
                county: county[row].take(),
                part_a_months: part_a[row],
                part_b_months: part_b[row],
                chronic_conditions,
                ip_annual_reimbursement: ip_reimbursement[row],
                ip_annual_deductible: ip_deductible[row],
                op_annual_reimbursement: op_reimbursement[row],
                op_annual_deductible: op_deductible[row],
                age: age_in_years(dob[row], dod[row], config.reference_date),
                whether_dead: u8::from(dod[row].is_some()),
            });
        }
        offset += batch.num_rows();
    }

    Ok(records)
}

/// Read claim batches of one kind into records
///
/// Inpatient rows derive `AdmitForDays` from their admission and discharge
/// dates; merged rows carry it as a column; outpatient rows have none.
pub fn read_claims(
    batches: &[RecordBatch],
    kind: ClaimKind,
    config: &PipelineConfig,
) -> Result<Vec<ClaimRecord>> {
    let required = match kind {
        ClaimKind::Inpatient => inpatient_schema(),
        ClaimKind::Outpatient => outpatient_schema(),
        ClaimKind::Merged => merged_schema(),
    };
    let table = format!("{kind} claim");
    let mut records = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    let mut offset = 0;

    for batch in batches {
        require_columns(&batch.schema(), &required, &table)?;
        let cols = BatchColumns {
            batch,
            date_format: &config.date_format,
            offset,
        };

        let claim_ids = cols.identifiers(columns::CLAIM_ID)?;
        let bene_ids = cols.identifiers(columns::BENE_ID)?;
        let providers = cols.identifiers(columns::PROVIDER)?;
        let claim_start = cols.date(columns::CLAIM_START_DT)?;
        let claim_end = cols.date(columns::CLAIM_END_DT)?;
        let reimbursed = cols.number(columns::INSC_CLAIM_AMT_REIMBURSED)?;
        let deductible = cols.number(columns::DEDUCTIBLE_AMT_PAID)?;
        let mut attending = cols.text(columns::ATTENDING_PHYSICIAN)?;
        let mut operating = cols.text(columns::OPERATING_PHYSICIAN)?;
        let mut other = cols.text(columns::OTHER_PHYSICIAN)?;
        let mut admit_code = cols.text(columns::CLM_ADMIT_DIAGNOSIS_CODE)?;
        let mut group_code = cols.optional_text(columns::DIAGNOSIS_GROUP_CODE)?;
        let mut diagnosis = columns::DIAGNOSIS_CODES
            .iter()
            .map(|name| cols.text(name))
            .collect::<Result<Vec<_>>>()?;
        let mut procedure = columns::PROCEDURE_CODES
            .iter()
            .map(|name| cols.text(name))
            .collect::<Result<Vec<_>>>()?;

        let (admission, discharge, stay) = match kind {
            ClaimKind::Inpatient => (
                Some(cols.date(columns::ADMISSION_DT)?),
                Some(cols.date(columns::DISCHARGE_DT)?),
                None,
            ),
            ClaimKind::Merged => (None, None, Some(cols.number(columns::ADMIT_FOR_DAYS)?)),
            ClaimKind::Outpatient => (None, None, None),
        };

        for (row, ((claim_id, bene_id), provider)) in claim_ids
            .into_iter()
            .zip(bene_ids)
            .zip(providers)
            .enumerate()
        {
            let mut claim = ClaimRecord::new(claim_id, bene_id, provider, kind);
            claim.claim_start = claim_start[row];
            claim.claim_end = claim_end[row];
            claim.reimbursed = reimbursed[row];
            claim.deductible_paid = deductible[row];
            claim.attending_physician = attending[row].take();
            claim.operating_physician = operating[row].take();
            claim.other_physician = other[row].take();
            claim.admit_diagnosis_code = admit_code[row].take();
            claim.diagnosis_group_code = group_code.as_mut().and_then(|codes| codes[row].take());
            for (slot, codes) in claim.diagnosis_codes.iter_mut().zip(diagnosis.iter_mut()) {
                *slot = codes[row].take();
            }
            for (slot, codes) in claim.procedure_codes.iter_mut().zip(procedure.iter_mut()) {
                *slot = codes[row].take();
            }
            claim.admission = admission.as_ref().and_then(|dates| dates[row]);
            claim.discharge = discharge.as_ref().and_then(|dates| dates[row]);
            claim.admit_for_days = match &stay {
                Some(days) => days[row],
                None => admit_for_days(claim.admission, claim.discharge),
            };
            records.push(claim);
        }
        offset += batch.num_rows();
    }

    Ok(records)
}
