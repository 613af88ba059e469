//! Grouping attributes and aggregated fields of merged claim rows

use std::borrow::Cow;
use std::fmt;

use crate::models::MergedRecord;
use crate::schema::columns;

/// A text-valued claim attribute usable as (part of) a grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimAttribute {
    Provider,
    BeneId,
    AttendingPhysician,
    OperatingPhysician,
    OtherPhysician,
    DiagnosisGroupCode,
    AdmitDiagnosisCode,
    /// Diagnosis code at a 1-based position
    DiagnosisCode(usize),
    /// Procedure code at a 1-based position
    ProcedureCode(usize),
    /// Leading characters of the diagnosis code at a 1-based position
    DiagnosisCodeGroup(usize),
}

impl ClaimAttribute {
    /// Column name used in feature names
    #[must_use]
    pub fn column_name(self) -> Cow<'static, str> {
        match self {
            Self::Provider => Cow::Borrowed(columns::PROVIDER),
            Self::BeneId => Cow::Borrowed(columns::BENE_ID),
            Self::AttendingPhysician => Cow::Borrowed(columns::ATTENDING_PHYSICIAN),
            Self::OperatingPhysician => Cow::Borrowed(columns::OPERATING_PHYSICIAN),
            Self::OtherPhysician => Cow::Borrowed(columns::OTHER_PHYSICIAN),
            Self::DiagnosisGroupCode => Cow::Borrowed(columns::DIAGNOSIS_GROUP_CODE),
            Self::AdmitDiagnosisCode => Cow::Borrowed(columns::CLM_ADMIT_DIAGNOSIS_CODE),
            Self::DiagnosisCode(n) => Cow::Owned(format!("ClmDiagnosisCode_{n}")),
            Self::ProcedureCode(n) => Cow::Owned(format!("ClmProcedureCode_{n}")),
            Self::DiagnosisCodeGroup(n) => Cow::Owned(format!("ClmDiagnosisCode_{n}_Grp")),
        }
    }

    /// Value of a stored attribute; code groups are derived and return `None` here
    #[must_use]
    pub fn stored_value(self, record: &MergedRecord) -> Option<&str> {
        let claim = &record.claim;
        match self {
            Self::Provider => Some(claim.provider.as_str()),
            Self::BeneId => Some(claim.bene_id.as_str()),
            Self::AttendingPhysician => claim.attending_physician.as_deref(),
            Self::OperatingPhysician => claim.operating_physician.as_deref(),
            Self::OtherPhysician => claim.other_physician.as_deref(),
            Self::DiagnosisGroupCode => claim.diagnosis_group_code.as_deref(),
            Self::AdmitDiagnosisCode => claim.admit_diagnosis_code.as_deref(),
            Self::DiagnosisCode(n) => claim.diagnosis_code(n),
            Self::ProcedureCode(n) => claim.procedure_code(n),
            Self::DiagnosisCodeGroup(_) => None,
        }
    }
}

impl fmt::Display for ClaimAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

/// A numeric column aggregated by group means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    InscClaimAmtReimbursed,
    DeductibleAmtPaid,
    IpAnnualReimbursementAmt,
    IpAnnualDeductibleAmt,
    OpAnnualReimbursementAmt,
    OpAnnualDeductibleAmt,
    Age,
    PartACoverageMonths,
    PartBCoverageMonths,
    AdmitForDays,
}

impl NumericField {
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::InscClaimAmtReimbursed => columns::INSC_CLAIM_AMT_REIMBURSED,
            Self::DeductibleAmtPaid => columns::DEDUCTIBLE_AMT_PAID,
            Self::IpAnnualReimbursementAmt => columns::IP_ANNUAL_REIMBURSEMENT_AMT,
            Self::IpAnnualDeductibleAmt => columns::IP_ANNUAL_DEDUCTIBLE_AMT,
            Self::OpAnnualReimbursementAmt => columns::OP_ANNUAL_REIMBURSEMENT_AMT,
            Self::OpAnnualDeductibleAmt => columns::OP_ANNUAL_DEDUCTIBLE_AMT,
            Self::Age => columns::AGE,
            Self::PartACoverageMonths => columns::NO_OF_MONTHS_PART_A_COV,
            Self::PartBCoverageMonths => columns::NO_OF_MONTHS_PART_B_COV,
            Self::AdmitForDays => columns::ADMIT_FOR_DAYS,
        }
    }

    #[must_use]
    pub fn value(self, record: &MergedRecord) -> Option<f64> {
        let bene = &record.beneficiary;
        match self {
            Self::InscClaimAmtReimbursed => record.claim.reimbursed,
            Self::DeductibleAmtPaid => record.claim.deductible_paid,
            Self::IpAnnualReimbursementAmt => bene.ip_annual_reimbursement,
            Self::IpAnnualDeductibleAmt => bene.ip_annual_deductible,
            Self::OpAnnualReimbursementAmt => bene.op_annual_reimbursement,
            Self::OpAnnualDeductibleAmt => bene.op_annual_deductible,
            Self::Age => bene.age.map(f64::from),
            Self::PartACoverageMonths => bene.part_a_months,
            Self::PartBCoverageMonths => bene.part_b_months,
            Self::AdmitForDays => record.claim.admit_for_days,
        }
    }
}

/// Group label of a diagnosis code: its first `len` characters, or `missing` for no code
#[must_use]
pub fn code_group(code: Option<&str>, len: usize, missing: &str) -> String {
    code.map_or_else(
        || missing.to_string(),
        |code| code.chars().take(len).collect(),
    )
}
