//! Arrow schemas of the input tables and of the merged claim table
//!
//! Input schemas describe the canonical column types; the column extractors
//! accept any representation they can adapt (text dates, integer codes, ...).

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

use super::columns::*;
use crate::error::{Error, Result};

fn utf8(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Utf8, nullable)
}

fn float(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

fn date(name: &str) -> Field {
    Field::new(name, DataType::Date32, true)
}

fn claim_fields(inpatient: bool) -> Vec<Field> {
    let mut fields = vec![
        utf8(BENE_ID, false),
        utf8(CLAIM_ID, false),
        date(CLAIM_START_DT),
        date(CLAIM_END_DT),
        utf8(PROVIDER, false),
        float(INSC_CLAIM_AMT_REIMBURSED),
        utf8(ATTENDING_PHYSICIAN, true),
        utf8(OPERATING_PHYSICIAN, true),
        utf8(OTHER_PHYSICIAN, true),
    ];
    if inpatient {
        fields.push(date(ADMISSION_DT));
    }
    fields.push(utf8(CLM_ADMIT_DIAGNOSIS_CODE, true));
    fields.push(float(DEDUCTIBLE_AMT_PAID));
    if inpatient {
        fields.push(date(DISCHARGE_DT));
        fields.push(utf8(DIAGNOSIS_GROUP_CODE, true));
    }
    fields.extend(DIAGNOSIS_CODES.iter().map(|name| utf8(name, true)));
    fields.extend(PROCEDURE_CODES.iter().map(|name| utf8(name, true)));
    fields
}

/// Get the Arrow schema for inpatient claims
pub fn inpatient_schema() -> SchemaRef {
    Arc::new(Schema::new(claim_fields(true)))
}

/// Get the Arrow schema for outpatient claims
///
/// Outpatient claims carry no admission, discharge or diagnosis group columns.
pub fn outpatient_schema() -> SchemaRef {
    Arc::new(Schema::new(claim_fields(false)))
}

fn beneficiary_attribute_fields() -> Vec<Field> {
    let mut fields = vec![
        date(DOB),
        date(DOD),
        utf8(GENDER, true),
        utf8(RACE, true),
        float(RENAL_DISEASE_INDICATOR),
        utf8(STATE, true),
        utf8(COUNTY, true),
        float(NO_OF_MONTHS_PART_A_COV),
        float(NO_OF_MONTHS_PART_B_COV),
    ];
    fields.extend(CHRONIC_CONDITIONS.iter().map(|name| float(name)));
    fields.extend([
        float(IP_ANNUAL_REIMBURSEMENT_AMT),
        float(IP_ANNUAL_DEDUCTIBLE_AMT),
        float(OP_ANNUAL_REIMBURSEMENT_AMT),
        float(OP_ANNUAL_DEDUCTIBLE_AMT),
    ]);
    fields
}

/// Get the Arrow schema for beneficiary data
///
/// The renal disease indicator arrives as text ("Y" or "0") in source files.
pub fn beneficiary_schema() -> SchemaRef {
    let mut fields = vec![utf8(BENE_ID, false)];
    fields.extend(beneficiary_attribute_fields().into_iter().map(|field| {
        if field.name() == RENAL_DISEASE_INDICATOR {
            utf8(RENAL_DISEASE_INDICATOR, true)
        } else {
            field
        }
    }));
    Arc::new(Schema::new(fields))
}

/// Get the Arrow schema for merged claim rows
pub fn merged_schema() -> SchemaRef {
    let mut fields = vec![
        utf8(CLAIM_ID, false),
        utf8(BENE_ID, false),
        date(CLAIM_START_DT),
        date(CLAIM_END_DT),
        utf8(PROVIDER, false),
        float(INSC_CLAIM_AMT_REIMBURSED),
        utf8(ATTENDING_PHYSICIAN, true),
        utf8(OPERATING_PHYSICIAN, true),
        utf8(OTHER_PHYSICIAN, true),
        utf8(CLM_ADMIT_DIAGNOSIS_CODE, true),
        float(DEDUCTIBLE_AMT_PAID),
        utf8(DIAGNOSIS_GROUP_CODE, true),
    ];
    fields.extend(DIAGNOSIS_CODES.iter().map(|name| utf8(name, true)));
    fields.extend(PROCEDURE_CODES.iter().map(|name| utf8(name, true)));
    fields.push(float(ADMIT_FOR_DAYS));
    fields.extend(beneficiary_attribute_fields());
    fields.push(float(AGE));
    fields.push(float(WHETHER_DEAD));
    Arc::new(Schema::new(fields))
}

/// Fail with a schema error naming every required column absent from `schema`
pub fn require_columns(schema: &Schema, required: &Schema, table: &str) -> Result<()> {
    let missing: Vec<&str> = required
        .fields()
        .iter()
        .map(|field| field.name().as_str())
        .filter(|name| schema.index_of(name).is_err())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema(format!(
            "{table} table is missing required columns: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpatient_lacks_inpatient_columns() {
        let schema = outpatient_schema();
        assert!(schema.index_of(ADMISSION_DT).is_err());
        assert!(schema.index_of(DIAGNOSIS_GROUP_CODE).is_err());
        assert_eq!(inpatient_schema().fields().len(), schema.fields().len() + 3);
    }

    #[test]
    fn test_merged_schema_order() {
        let schema = merged_schema();
        assert_eq!(schema.field(0).name(), CLAIM_ID);
        assert_eq!(schema.field(11).name(), DIAGNOSIS_GROUP_CODE);
        assert_eq!(schema.field(28).name(), ADMIT_FOR_DAYS);
        assert_eq!(schema.fields().last().unwrap().name(), WHETHER_DEAD);
        assert!(schema.index_of(ADMISSION_DT).is_err());
    }

    #[test]
    fn test_require_columns_lists_missing() {
        let present = Schema::new(vec![Field::new(BENE_ID, DataType::Utf8, false)]);
        let err = require_columns(&present, &beneficiary_schema(), "Beneficiary").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("DOB"));
        assert!(message.contains("ChronicCond_stroke"));
    }
}
