//! Claim entity model
//!
//! Inpatient and outpatient claim episodes share one representation; the
//! inpatient-only admission and discharge dates are absent for outpatient
//! claims and are dropped when claims are unioned for the beneficiary join.

use chrono::NaiveDate;
use std::fmt;

use crate::schema::columns;

pub const DIAGNOSIS_CODE_COUNT: usize = columns::DIAGNOSIS_CODES.len();
pub const PROCEDURE_CODE_COUNT: usize = columns::PROCEDURE_CODES.len();

/// Origin of a claim row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClaimKind {
    Inpatient,
    #[default]
    Outpatient,
    /// Read back from an already merged table
    Merged,
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inpatient => write!(f, "Inpatient"),
            Self::Outpatient => write!(f, "Outpatient"),
            Self::Merged => write!(f, "Merged"),
        }
    }
}

/// Representation of one claim episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub bene_id: String,
    pub provider: String,
    pub kind: ClaimKind,
    pub claim_start: Option<NaiveDate>,
    pub claim_end: Option<NaiveDate>,
    pub reimbursed: Option<f64>,
    pub deductible_paid: Option<f64>,
    pub attending_physician: Option<String>,
    pub operating_physician: Option<String>,
    pub other_physician: Option<String>,
    pub admission: Option<NaiveDate>,
    pub discharge: Option<NaiveDate>,
    pub admit_diagnosis_code: Option<String>,
    pub diagnosis_group_code: Option<String>,
    pub diagnosis_codes: [Option<String>; DIAGNOSIS_CODE_COUNT],
    pub procedure_codes: [Option<String>; PROCEDURE_CODE_COUNT],
    /// Inclusive length of an inpatient stay in days
    pub admit_for_days: Option<f64>,
}

impl ClaimRecord {
    #[must_use]
    pub fn new(
        claim_id: impl Into<String>,
        bene_id: impl Into<String>,
        provider: impl Into<String>,
        kind: ClaimKind,
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            bene_id: bene_id.into(),
            provider: provider.into(),
            kind,
            ..Self::default()
        }
    }

    /// Diagnosis code at a 1-based position
    #[must_use]
    pub fn diagnosis_code(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.diagnosis_codes.get(idx))
            .and_then(Option::as_deref)
    }

    /// Procedure code at a 1-based position
    #[must_use]
    pub fn procedure_code(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.procedure_codes.get(idx))
            .and_then(Option::as_deref)
    }

    /// Text-valued attribute by column name
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        match column {
            columns::CLAIM_ID => Some(self.claim_id.as_str()),
            columns::BENE_ID => Some(self.bene_id.as_str()),
            columns::PROVIDER => Some(self.provider.as_str()),
            columns::ATTENDING_PHYSICIAN => self.attending_physician.as_deref(),
            columns::OPERATING_PHYSICIAN => self.operating_physician.as_deref(),
            columns::OTHER_PHYSICIAN => self.other_physician.as_deref(),
            columns::CLM_ADMIT_DIAGNOSIS_CODE => self.admit_diagnosis_code.as_deref(),
            columns::DIAGNOSIS_GROUP_CODE => self.diagnosis_group_code.as_deref(),
            other => {
                if let Some(idx) = columns::DIAGNOSIS_CODES.iter().position(|c| *c == other) {
                    self.diagnosis_codes[idx].as_deref()
                } else {
                    columns::PROCEDURE_CODES
                        .iter()
                        .position(|c| *c == other)
                        .and_then(|idx| self.procedure_codes[idx].as_deref())
                }
            }
        }
    }

    /// Numeric attribute by column name
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        match column {
            columns::INSC_CLAIM_AMT_REIMBURSED => self.reimbursed,
            columns::DEDUCTIBLE_AMT_PAID => self.deductible_paid,
            columns::ADMIT_FOR_DAYS => self.admit_for_days,
            _ => None,
        }
    }

    /// Date attribute by column name
    #[must_use]
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match column {
            columns::CLAIM_START_DT => self.claim_start,
            columns::CLAIM_END_DT => self.claim_end,
            columns::ADMISSION_DT => self.admission,
            columns::DISCHARGE_DT => self.discharge,
            _ => None,
        }
    }
}
