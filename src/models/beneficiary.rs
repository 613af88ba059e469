//! Beneficiary entity model
//!
//! One row per Medicare beneficiary with demographics, chronic condition
//! flags and annual reimbursement totals. Flags and the derived age are
//! already normalized when a record is built by the record merger.

use chrono::NaiveDate;

use crate::schema::columns;

/// Number of chronic condition flags carried per beneficiary
pub const CHRONIC_CONDITION_COUNT: usize = columns::CHRONIC_CONDITIONS.len();

/// Representation of a beneficiary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeneficiaryRecord {
    /// Beneficiary identifier
    pub bene_id: String,
    pub dob: Option<NaiveDate>,
    pub dod: Option<NaiveDate>,
    pub gender: Option<String>,
    pub race: Option<String>,
    /// Renal disease flag in {0, 1}
    pub renal_disease: u8,
    pub state: Option<String>,
    pub county: Option<String>,
    pub part_a_months: Option<f64>,
    pub part_b_months: Option<f64>,
    /// Chronic condition flags in {0, 1}, ordered as `columns::CHRONIC_CONDITIONS`
    pub chronic_conditions: [Option<u8>; CHRONIC_CONDITION_COUNT],
    pub ip_annual_reimbursement: Option<f64>,
    pub ip_annual_deductible: Option<f64>,
    pub op_annual_reimbursement: Option<f64>,
    pub op_annual_deductible: Option<f64>,
    /// Age in whole years at death or at the reference date
    pub age: Option<i32>,
    /// 1 when a date of death is recorded
    pub whether_dead: u8,
}

impl BeneficiaryRecord {
    /// Create a beneficiary with only an identifier set
    #[must_use]
    pub fn new(bene_id: impl Into<String>) -> Self {
        Self {
            bene_id: bene_id.into(),
            ..Self::default()
        }
    }

    /// Whether the beneficiary has died
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.whether_dead == 1
    }

    /// Count of chronic conditions flagged present
    #[must_use]
    pub fn chronic_condition_count(&self) -> usize {
        self.chronic_conditions
            .iter()
            .filter(|flag| **flag == Some(1))
            .count()
    }

    /// Text-valued attribute by column name
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        match column {
            columns::BENE_ID => Some(self.bene_id.as_str()),
            columns::GENDER => self.gender.as_deref(),
            columns::RACE => self.race.as_deref(),
            columns::STATE => self.state.as_deref(),
            columns::COUNTY => self.county.as_deref(),
            _ => None,
        }
    }

    /// Numeric attribute by column name
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        match column {
            columns::RENAL_DISEASE_INDICATOR => Some(f64::from(self.renal_disease)),
            columns::NO_OF_MONTHS_PART_A_COV => self.part_a_months,
            columns::NO_OF_MONTHS_PART_B_COV => self.part_b_months,
            columns::IP_ANNUAL_REIMBURSEMENT_AMT => self.ip_annual_reimbursement,
            columns::IP_ANNUAL_DEDUCTIBLE_AMT => self.ip_annual_deductible,
            columns::OP_ANNUAL_REIMBURSEMENT_AMT => self.op_annual_reimbursement,
            columns::OP_ANNUAL_DEDUCTIBLE_AMT => self.op_annual_deductible,
            columns::AGE => self.age.map(f64::from),
            columns::WHETHER_DEAD => Some(f64::from(self.whether_dead)),
            other => columns::CHRONIC_CONDITIONS
                .iter()
                .position(|name| *name == other)
                .and_then(|idx| self.chronic_conditions[idx])
                .map(f64::from),
        }
    }

    /// Date attribute by column name
    #[must_use]
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match column {
            columns::DOB => self.dob,
            columns::DOD => self.dod,
            _ => None,
        }
    }
}
