//! Tests for schema reconciliation against the frozen feature order

mod utils;

use provider_risk::algorithm::features::{FeatureBuilder, FeatureCatalog};
use provider_risk::schema::columns;
use provider_risk::{Error, FeatureEngineer, FrozenSchema, PipelineConfig, SchemaReconciler};
use utils::{
    beneficiary, frozen_columns, merge, outpatient, reference_beneficiaries, reference_corpus,
    single_claim_batch, test_config,
};

fn golden_columns() -> Vec<String> {
    include_str!("fixtures/feature_columns.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn engineer() -> FeatureEngineer {
    FeatureEngineer::new(test_config(), FrozenSchema::new(frozen_columns())).unwrap()
}

#[test]
fn test_catalog_matches_golden_column_list() {
    let golden = golden_columns();
    assert_eq!(golden.len(), 175);

    let expected = FeatureCatalog::standard()
        .expected_columns(&PipelineConfig::default().categorical_levels);
    assert_eq!(expected, golden);
}

#[test]
fn test_reconciled_matrix_follows_frozen_order() {
    let corpus = reference_corpus();
    let matrix = engineer().engineer(&single_claim_batch(), &corpus).unwrap();

    assert_eq!(matrix.column_names(), frozen_columns().as_slice());
    assert_eq!(matrix.len(), 1);
    assert_eq!(matrix.rows()[0].len(), frozen_columns().len());
    assert!(matrix.rows()[0].iter().all(|v| v.is_finite()));
    assert_eq!(matrix.claim_ids(), &["C1".to_string()]);
    assert_eq!(matrix.providers(), &["P1".to_string()]);
}

#[test]
fn test_identifier_and_code_columns_are_dropped() {
    let corpus = reference_corpus();
    let matrix = engineer().engineer(&single_claim_batch(), &corpus).unwrap();
    let names = matrix.column_names();
    for removed in columns::removed_columns() {
        assert!(!names.iter().any(|n| n == removed), "{removed} survived");
    }
    assert!(!names.iter().any(|n| n == columns::CLAIM_ID));
    assert!(!names.iter().any(|n| n == columns::PROVIDER));
}

#[test]
fn test_missing_procedure_code_features_are_zero() {
    let corpus = reference_corpus();
    let matrix = engineer().engineer(&single_claim_batch(), &corpus).unwrap();
    for name in [
        "ClmProcedureCode_2TF",
        "ClmProcedureCode_2_IDF",
        "ClmProcedureCode_2TF-IDF",
        "PerClmProcedureCode_2Avg_InscClaimAmtReimbursed",
        "ClmCount_Provider_ClmProcedureCode_2",
    ] {
        assert_eq!(matrix.value("C1", name), Some(0.0), "{name}");
    }
}

#[test]
fn test_dummies_are_appended_last() {
    let corpus = reference_corpus();
    let batch = merge(
        &reference_beneficiaries(),
        &[],
        &[outpatient("C2", "B2", "P2"), outpatient("C3", "B3", "P3")],
    );
    let matrix = engineer().engineer(&batch, &corpus).unwrap();

    let names = matrix.column_names();
    assert_eq!(&names[names.len() - 2..], &["Gender_2", "Race_2"]);
    assert_eq!(matrix.value("C2", "Gender_2"), Some(1.0));
    assert_eq!(matrix.value("C3", "Gender_2"), Some(0.0));
    assert_eq!(matrix.value("C2", "Race_2"), Some(1.0));
}

#[test]
fn test_unexpected_category_level_is_mismatch() {
    let corpus = reference_corpus();
    let mut beneficiaries = reference_beneficiaries();
    beneficiaries.push(beneficiary("B7").with(columns::RACE, "5"));
    let batch = merge(&beneficiaries, &[], &[outpatient("C7", "B7", "P1")]);

    match engineer().engineer(&batch, &corpus) {
        Err(Error::SchemaMismatch { found, .. }) => assert_eq!(found, "Race_5"),
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
}

#[test]
fn test_frozen_order_checked_at_startup() {
    let mut columns = frozen_columns();
    columns.swap(30, 31);
    let expected = columns[30].clone();
    match FeatureEngineer::new(test_config(), FrozenSchema::new(columns)) {
        Err(Error::SchemaMismatch {
            position,
            expected: e,
            ..
        }) => {
            assert_eq!(position, 30);
            assert_eq!(e, expected);
        }
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
}

#[test]
fn test_reconciler_rejects_short_frozen_list() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let builder = FeatureBuilder::new(FeatureCatalog::standard(), test_config());
    let (table, levels) = builder.build(&batch, corpus.records()).unwrap();

    let mut frozen = frozen_columns();
    frozen.pop();
    let reconciler = SchemaReconciler::new(FrozenSchema::new(frozen.clone()));
    match reconciler.reconcile(table, &levels) {
        Err(Error::SchemaMismatch { position, .. }) => assert_eq!(position, frozen.len()),
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
}
