//! Column names of the claim, beneficiary and merged tables

pub const BENE_ID: &str = "BeneID";
pub const CLAIM_ID: &str = "ClaimID";
pub const CLAIM_START_DT: &str = "ClaimStartDt";
pub const CLAIM_END_DT: &str = "ClaimEndDt";
pub const PROVIDER: &str = "Provider";
pub const INSC_CLAIM_AMT_REIMBURSED: &str = "InscClaimAmtReimbursed";
pub const ATTENDING_PHYSICIAN: &str = "AttendingPhysician";
pub const OPERATING_PHYSICIAN: &str = "OperatingPhysician";
pub const OTHER_PHYSICIAN: &str = "OtherPhysician";
pub const ADMISSION_DT: &str = "AdmissionDt";
pub const CLM_ADMIT_DIAGNOSIS_CODE: &str = "ClmAdmitDiagnosisCode";
pub const DEDUCTIBLE_AMT_PAID: &str = "DeductibleAmtPaid";
pub const DISCHARGE_DT: &str = "DischargeDt";
pub const DIAGNOSIS_GROUP_CODE: &str = "DiagnosisGroupCode";

pub const DIAGNOSIS_CODES: [&str; 10] = [
    "ClmDiagnosisCode_1",
    "ClmDiagnosisCode_2",
    "ClmDiagnosisCode_3",
    "ClmDiagnosisCode_4",
    "ClmDiagnosisCode_5",
    "ClmDiagnosisCode_6",
    "ClmDiagnosisCode_7",
    "ClmDiagnosisCode_8",
    "ClmDiagnosisCode_9",
    "ClmDiagnosisCode_10",
];

pub const PROCEDURE_CODES: [&str; 6] = [
    "ClmProcedureCode_1",
    "ClmProcedureCode_2",
    "ClmProcedureCode_3",
    "ClmProcedureCode_4",
    "ClmProcedureCode_5",
    "ClmProcedureCode_6",
];

/// Diagnosis code groups derived during feature engineering
pub const DIAGNOSIS_CODE_GROUPS: [&str; 3] = [
    "ClmDiagnosisCode_1_Grp",
    "ClmDiagnosisCode_2_Grp",
    "ClmDiagnosisCode_3_Grp",
];

pub const DOB: &str = "DOB";
pub const DOD: &str = "DOD";
pub const GENDER: &str = "Gender";
pub const RACE: &str = "Race";
pub const RENAL_DISEASE_INDICATOR: &str = "RenalDiseaseIndicator";
pub const STATE: &str = "State";
pub const COUNTY: &str = "County";
pub const NO_OF_MONTHS_PART_A_COV: &str = "NoOfMonths_PartACov";
pub const NO_OF_MONTHS_PART_B_COV: &str = "NoOfMonths_PartBCov";

pub const CHRONIC_CONDITIONS: [&str; 11] = [
    "ChronicCond_Alzheimer",
    "ChronicCond_Heartfailure",
    "ChronicCond_KidneyDisease",
    "ChronicCond_Cancer",
    "ChronicCond_ObstrPulmonary",
    "ChronicCond_Depression",
    "ChronicCond_Diabetes",
    "ChronicCond_IschemicHeart",
    "ChronicCond_Osteoporasis",
    "ChronicCond_rheumatoidarthritis",
    "ChronicCond_stroke",
];

pub const IP_ANNUAL_REIMBURSEMENT_AMT: &str = "IPAnnualReimbursementAmt";
pub const IP_ANNUAL_DEDUCTIBLE_AMT: &str = "IPAnnualDeductibleAmt";
pub const OP_ANNUAL_REIMBURSEMENT_AMT: &str = "OPAnnualReimbursementAmt";
pub const OP_ANNUAL_DEDUCTIBLE_AMT: &str = "OPAnnualDeductibleAmt";

// Derived during merging
pub const ADMIT_FOR_DAYS: &str = "AdmitForDays";
pub const AGE: &str = "Age";
pub const WHETHER_DEAD: &str = "WhetherDead";

/// Columns removed by the reconciler before the numeric block is assembled
pub fn removed_columns() -> Vec<&'static str> {
    let mut removed = vec![
        BENE_ID,
        CLAIM_START_DT,
        CLAIM_END_DT,
        ATTENDING_PHYSICIAN,
        OPERATING_PHYSICIAN,
        OTHER_PHYSICIAN,
    ];
    removed.extend(DIAGNOSIS_CODES);
    removed.extend(PROCEDURE_CODES);
    removed.extend([
        CLM_ADMIT_DIAGNOSIS_CODE,
        ADMISSION_DT,
        DISCHARGE_DT,
        DIAGNOSIS_GROUP_CODE,
        DOB,
        DOD,
        STATE,
        COUNTY,
    ]);
    removed.extend(DIAGNOSIS_CODE_GROUPS);
    removed.extend([GENDER, RACE]);
    removed
}

/// Identifier and code columns; their values are opaque text even when every value is digits
pub fn text_columns() -> Vec<&'static str> {
    let mut text = vec![
        BENE_ID,
        CLAIM_ID,
        PROVIDER,
        ATTENDING_PHYSICIAN,
        OPERATING_PHYSICIAN,
        OTHER_PHYSICIAN,
        CLM_ADMIT_DIAGNOSIS_CODE,
        DIAGNOSIS_GROUP_CODE,
    ];
    text.extend(DIAGNOSIS_CODES);
    text.extend(PROCEDURE_CODES);
    text.extend(DIAGNOSIS_CODE_GROUPS);
    text
}
