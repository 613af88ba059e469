//! Shared fixtures for the integration tests
//!
//! Synthetic beneficiary and claim tables, a small reference corpus and
//! artifact files written to temporary directories.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use provider_risk::algorithm::features::FeatureCatalog;
use provider_risk::config::CategoricalConfig;
use provider_risk::schema::{beneficiary_schema, columns, inpatient_schema, outpatient_schema};
use provider_risk::{ClaimTables, MergedRecord, PipelineConfig, RecordMerger, ReferenceCorpus};
use serde_json::json;

/// One table row as column name to text value; absent columns are null
#[derive(Debug, Clone, Default)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    #[must_use]
    pub fn with(mut self, column: &str, value: impl ToString) -> Self {
        self.0.insert(column.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn without(mut self, column: &str) -> Self {
        self.0.remove(column);
        self
    }

    fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }
}

#[must_use]
pub fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

fn days_since_epoch(text: &str) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    i32::try_from((date(text) - epoch).num_days()).unwrap()
}

/// Build a typed batch; every field is nullable so null identifiers can be tested
#[must_use]
pub fn table(schema: &SchemaRef, rows: &[Row]) -> RecordBatch {
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for field in schema.fields() {
        let name = field.name();
        let cells: Vec<Option<&str>> = rows.iter().map(|row| row.get(name)).collect();
        let array: ArrayRef = match field.data_type() {
            DataType::Float64 => Arc::new(
                cells
                    .iter()
                    .map(|c| c.map(|v| v.parse::<f64>().unwrap()))
                    .collect::<Float64Array>(),
            ),
            DataType::Date32 => Arc::new(
                cells
                    .iter()
                    .map(|c| c.map(days_since_epoch))
                    .collect::<Date32Array>(),
            ),
            _ => Arc::new(StringArray::from(cells)),
        };
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Build a batch with every column as text, as hand-made files deliver them
#[must_use]
pub fn text_table(schema: &SchemaRef, rows: &[Row]) -> RecordBatch {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|f| -> ArrayRef {
            Arc::new(StringArray::from(
                rows.iter().map(|row| row.get(f.name())).collect::<Vec<_>>(),
            ))
        })
        .collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Drop a column from a batch
#[must_use]
pub fn drop_column(batch: &RecordBatch, column: &str) -> RecordBatch {
    let idx = batch.schema().index_of(column).unwrap();
    let mut batch = batch.clone();
    batch.remove_column(idx);
    batch
}

/// A living beneficiary born 1943-01-01, gender 1, race 1, no chronic conditions
#[must_use]
pub fn beneficiary(bene_id: &str) -> Row {
    let mut row = Row::default()
        .with(columns::BENE_ID, bene_id)
        .with(columns::DOB, "1943-01-01")
        .with(columns::GENDER, "1")
        .with(columns::RACE, "1")
        .with(columns::RENAL_DISEASE_INDICATOR, "0")
        .with(columns::STATE, "39")
        .with(columns::COUNTY, "230")
        .with(columns::NO_OF_MONTHS_PART_A_COV, 12)
        .with(columns::NO_OF_MONTHS_PART_B_COV, 12)
        .with(columns::IP_ANNUAL_REIMBURSEMENT_AMT, 36000)
        .with(columns::IP_ANNUAL_DEDUCTIBLE_AMT, 3204)
        .with(columns::OP_ANNUAL_REIMBURSEMENT_AMT, 60)
        .with(columns::OP_ANNUAL_DEDUCTIBLE_AMT, 70);
    for condition in columns::CHRONIC_CONDITIONS {
        row = row.with(condition, 2);
    }
    row
}

/// An inpatient claim with one diagnosis code
#[must_use]
pub fn inpatient(claim_id: &str, bene_id: &str, provider: &str, admission: &str, discharge: &str) -> Row {
    Row::default()
        .with(columns::CLAIM_ID, claim_id)
        .with(columns::BENE_ID, bene_id)
        .with(columns::PROVIDER, provider)
        .with(columns::CLAIM_START_DT, admission)
        .with(columns::CLAIM_END_DT, discharge)
        .with(columns::ADMISSION_DT, admission)
        .with(columns::DISCHARGE_DT, discharge)
        .with(columns::INSC_CLAIM_AMT_REIMBURSED, 26000)
        .with(columns::DEDUCTIBLE_AMT_PAID, 1068)
        .with(columns::ATTENDING_PHYSICIAN, "PHY390922")
        .with(columns::CLM_ADMIT_DIAGNOSIS_CODE, "7866")
        .with(columns::DIAGNOSIS_GROUP_CODE, "201")
        .with(columns::DIAGNOSIS_CODES[0], "4019")
}

/// An outpatient claim with one diagnosis code
#[must_use]
pub fn outpatient(claim_id: &str, bene_id: &str, provider: &str) -> Row {
    Row::default()
        .with(columns::CLAIM_ID, claim_id)
        .with(columns::BENE_ID, bene_id)
        .with(columns::PROVIDER, provider)
        .with(columns::CLAIM_START_DT, "2009-06-01")
        .with(columns::CLAIM_END_DT, "2009-06-01")
        .with(columns::INSC_CLAIM_AMT_REIMBURSED, 50)
        .with(columns::DEDUCTIBLE_AMT_PAID, 0)
        .with(columns::ATTENDING_PHYSICIAN, "PHY326117")
        .with(columns::DIAGNOSIS_CODES[0], "4019")
}

#[must_use]
pub fn claim_tables(beneficiaries: &[Row], inpatients: &[Row], outpatients: &[Row]) -> ClaimTables {
    ClaimTables::new(
        vec![table(&beneficiary_schema(), beneficiaries)],
        vec![table(&inpatient_schema(), inpatients)],
        vec![table(&outpatient_schema(), outpatients)],
    )
}

/// Merge rows with the default configuration
#[must_use]
pub fn merge(beneficiaries: &[Row], inpatients: &[Row], outpatients: &[Row]) -> Vec<MergedRecord> {
    RecordMerger::new(test_config())
        .merge(&claim_tables(beneficiaries, inpatients, outpatients))
        .unwrap()
}

/// Default configuration with the categorical levels present in the fixtures
#[must_use]
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        categorical_levels: vec![
            CategoricalConfig::new(columns::GENDER, &["1", "2"]),
            CategoricalConfig::new(columns::RACE, &["1", "2"]),
        ],
        ..PipelineConfig::default()
    }
}

/// The frozen feature order matching [`test_config`]
#[must_use]
pub fn frozen_columns() -> Vec<String> {
    FeatureCatalog::standard().expected_columns(&test_config().categorical_levels)
}

#[must_use]
pub fn reference_beneficiaries() -> Vec<Row> {
    vec![
        beneficiary("B1"),
        beneficiary("B2").with(columns::GENDER, "2").with(columns::RACE, "2"),
        beneficiary("B3"),
        beneficiary("B4"),
        beneficiary("B5"),
        beneficiary("B6"),
    ]
}

/// Four inpatient claims under P1 (stays of 2, 4, 1 and 5 days) and one
/// outpatient claim under each of P2 to P6, all with diagnosis code 4019
#[must_use]
pub fn reference_corpus() -> ReferenceCorpus {
    let inpatients = vec![
        inpatient("R1", "B1", "P1", "2009-02-01", "2009-02-02"),
        inpatient("R2", "B2", "P1", "2009-03-01", "2009-03-04"),
        inpatient("R3", "B1", "P1", "2009-04-01", "2009-04-01"),
        inpatient("R4", "B2", "P1", "2009-05-01", "2009-05-05"),
    ];
    let outpatients: Vec<Row> = (2..=6)
        .map(|n| outpatient(&format!("O{n}"), &format!("B{n}"), &format!("P{n}")))
        .collect();
    ReferenceCorpus::from_records(merge(&reference_beneficiaries(), &inpatients, &outpatients))
}

/// The one-claim batch: C1 under P1 with the unique diagnosis code D10 and a three-day stay
#[must_use]
pub fn single_claim_batch() -> Vec<MergedRecord> {
    let claim = inpatient("C1", "B1", "P1", "2009-01-01", "2009-01-03")
        .with(columns::DIAGNOSIS_CODES[0], "D10");
    merge(&reference_beneficiaries(), &[claim], &[])
}

/// Write a scaler artifact with zero means and unit scales
pub fn write_identity_scaler(dir: &Path, names: &[String]) -> PathBuf {
    let path = dir.join("scaler.json");
    let document = json!({
        "feature_names": names,
        "mean": vec![0.0; names.len()],
        "scale": vec![1.0; names.len()],
    });
    std::fs::write(&path, document.to_string()).unwrap();
    path
}

/// Write a one-split binary model: fraud when `feature >= threshold`
pub fn write_stump_model(dir: &Path, num_features: usize, feature: usize, threshold: f32) -> PathBuf {
    let path = dir.join("model.json");
    let document = json!({
        "learner": {
            "attributes": {},
            "feature_names": [],
            "feature_types": [],
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "1"},
                    "iteration_indptr": [0, 1],
                    "tree_info": [0],
                    "trees": [{
                        "id": 0,
                        "base_weights": [0.0, -2.0, 2.0],
                        "categories": [],
                        "categories_nodes": [],
                        "categories_segments": [],
                        "categories_sizes": [],
                        "default_left": [0, 0, 0],
                        "left_children": [1, -1, -1],
                        "right_children": [2, -1, -1],
                        "loss_changes": [1.0, 0.0, 0.0],
                        "parents": [2147483647, 0, 0],
                        "split_conditions": [threshold, -2.0, 2.0],
                        "split_indices": [feature, 0, 0],
                        "split_type": [0, 0, 0],
                        "sum_hessian": [3.0, 1.0, 2.0],
                        "tree_param": {
                            "num_deleted": "0",
                            "num_feature": num_features.to_string(),
                            "num_nodes": "3",
                            "size_leaf_vector": "1"
                        }
                    }]
                }
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "boost_from_average": "1",
                "num_class": "0",
                "num_feature": num_features.to_string(),
                "num_target": "1"
            },
            "objective": {
                "name": "binary:logistic",
                "reg_loss_param": {"scale_pos_weight": "1"}
            }
        },
        "version": [2, 0, 3]
    });
    std::fs::write(&path, document.to_string()).unwrap();
    path
}

/// Position of a column in the frozen order
#[must_use]
pub fn column_index(name: &str) -> usize {
    frozen_columns().iter().position(|c| c == name).unwrap()
}
