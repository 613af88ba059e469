//! Tests for the aggregate feature builder

mod utils;

use provider_risk::algorithm::features::{
    ClaimAttribute, FeatureBuilder, FeatureCatalog, GroupIndex, NumericField, WorkingSet,
};
use provider_risk::schema::columns;
use utils::{
    beneficiary, inpatient, merge, outpatient, reference_beneficiaries, reference_corpus,
    single_claim_batch, test_config,
};

fn builder() -> FeatureBuilder {
    FeatureBuilder::new(FeatureCatalog::standard(), test_config())
}

#[test]
fn test_provider_statistics_include_batch_and_reference() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.claim_ids(), &["C1".to_string()]);
    assert_eq!(table.numeric("ClmCount_Provider").unwrap(), &[Some(5.0)]);
    assert_eq!(
        table.numeric("PerProviderAvg_AdmitForDays").unwrap(),
        &[Some(3.0)]
    );
    // B1 has R1, R3 and C1 under P1
    assert_eq!(table.numeric("ClmCount_Provider_BeneID").unwrap(), &[Some(3.0)]);
}

#[test]
fn test_means_skip_missing_values() {
    let corpus = reference_corpus();
    let batch = merge(
        &reference_beneficiaries(),
        &[],
        &[outpatient("C9", "B3", "P1")],
    );
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();

    // The outpatient claim has no stay length; the mean covers P1's four stays
    assert_eq!(
        table.numeric("PerProviderAvg_AdmitForDays").unwrap(),
        &[Some(3.0)]
    );
    assert_eq!(table.numeric("ClmCount_Provider").unwrap(), &[Some(5.0)]);
}

#[test]
fn test_null_key_component_yields_no_value() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();

    // C1 has no operating physician
    assert_eq!(
        table
            .numeric("PerOperatingPhysicianAvg_InscClaimAmtReimbursed")
            .unwrap(),
        &[None]
    );
    assert_eq!(
        table.numeric("ClmCount_Provider_OperatingPhysician").unwrap(),
        &[None]
    );
}

#[test]
fn test_code_groups_use_leading_characters() {
    let batch = merge(
        &[beneficiary("B1")],
        &[],
        &[
            outpatient("O1", "B1", "P1").with(columns::DIAGNOSIS_CODES[0], "4019"),
            outpatient("O2", "B1", "P1").with(columns::DIAGNOSIS_CODES[0], "4011"),
        ],
    );
    let (table, _) = builder().build(&batch, &[]).unwrap();

    let groups = table.column("ClmDiagnosisCode_1_Grp").unwrap();
    assert_eq!(
        groups.values,
        provider_risk::algorithm::features::ColumnValues::Text(vec![
            Some("40".to_string()),
            Some("40".to_string())
        ])
    );
    // Both claims share group "40" but not the raw code
    assert_eq!(
        table
            .numeric("PerClmDiagnosisCode_1_GrpAvg_InscClaimAmtReimbursed")
            .unwrap(),
        &[Some(50.0), Some(50.0)]
    );
    assert_eq!(
        table.numeric("ClmCount_Provider_ClmDiagnosisCode_1").unwrap(),
        &[Some(1.0), Some(1.0)]
    );
    // A missing second code falls into the "na" group
    let groups = table.column("ClmDiagnosisCode_2_Grp").unwrap();
    assert_eq!(
        groups.values,
        provider_risk::algorithm::features::ColumnValues::Text(vec![
            Some("na".to_string()),
            Some("na".to_string())
        ])
    );
}

#[test]
fn test_group_average_of_op_reimbursement_groups_by_raw_code() {
    let beneficiaries = vec![
        beneficiary("B1").with(columns::OP_ANNUAL_REIMBURSEMENT_AMT, 100),
        beneficiary("B2").with(columns::OP_ANNUAL_REIMBURSEMENT_AMT, 300),
    ];
    let batch = merge(
        &beneficiaries,
        &[],
        &[
            outpatient("O1", "B1", "P1").with(columns::DIAGNOSIS_CODES[0], "4019"),
            outpatient("O2", "B2", "P1").with(columns::DIAGNOSIS_CODES[0], "4011"),
        ],
    );
    let (table, _) = builder().build(&batch, &[]).unwrap();

    assert_eq!(
        table
            .numeric("PerClmDiagnosisCode_1_GrpAvg_OPAnnualReimbursementAmt")
            .unwrap(),
        &[Some(100.0), Some(300.0)]
    );
    assert_eq!(
        table
            .numeric("PerClmDiagnosisCode_1_GrpAvg_OPAnnualDeductibleAmt")
            .unwrap(),
        &[Some(70.0), Some(70.0)]
    );
}

#[test]
fn test_batch_row_replaces_reference_claim() {
    let corpus = reference_corpus();
    // R1 was a two-day stay in the reference corpus
    let batch = merge(
        &reference_beneficiaries(),
        &[inpatient("R1", "B1", "P1", "2009-02-01", "2009-02-07")],
        &[],
    );
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();

    assert_eq!(table.numeric("ClmCount_Provider").unwrap(), &[Some(4.0)]);
    assert_eq!(
        table.numeric("PerProviderAvg_AdmitForDays").unwrap(),
        &[Some(4.25)]
    );
}

#[test]
fn test_repeated_batch_claims_keep_first_row() {
    let corpus = reference_corpus();
    let mut batch = single_claim_batch();
    batch.extend(single_claim_batch());
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.numeric("ClmCount_Provider").unwrap(), &[Some(5.0)]);
}

#[test]
fn test_group_index_counts_rows() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let set = WorkingSet::new(&batch, corpus.records(), 2, "na");
    assert_eq!(set.batch_len(), 1);
    assert_eq!(set.len(), 10);
    assert_eq!(set.distinct_providers(), 6);

    let index = GroupIndex::build(&set, &[ClaimAttribute::Provider]);
    assert_eq!(index.group_count(), 6);
    assert_eq!(index.counts(set.batch_len()), vec![Some(5.0)]);
    assert_eq!(index.means(&set, NumericField::AdmitForDays), vec![Some(3.0)]);
}

#[test]
fn test_observed_levels_cover_batch_and_reference() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let (_, levels) = builder().build(&batch, corpus.records()).unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].column, columns::GENDER);
    assert_eq!(levels[0].levels, vec!["1", "2"]);
    assert_eq!(levels[1].dummy_names(), vec!["Race_2"]);
}

#[test]
fn test_every_catalog_column_is_built() {
    let corpus = reference_corpus();
    let batch = single_claim_batch();
    let catalog = FeatureCatalog::standard();
    let (table, _) = builder().build(&batch, corpus.records()).unwrap();

    let names = table.column_names();
    for feature in catalog.feature_names() {
        assert!(names.contains(&feature.as_str()), "missing {feature}");
    }
}
