//! Tests for the record merger

mod utils;

use provider_risk::schema::{beneficiary_schema, columns, inpatient_schema, outpatient_schema};
use provider_risk::utils::io::{read_table, write_csv};
use provider_risk::models::merged_to_record_batch;
use provider_risk::algorithm::features::ColumnValues;
use provider_risk::{ClaimKind, ClaimTables, Error, FeatureBuilder, FeatureCatalog, RecordMerger};
use utils::{
    beneficiary, claim_tables, date, drop_column, inpatient, merge, outpatient, table, test_config,
    text_table,
};

#[test]
fn test_inpatient_rows_come_first_and_orphans_are_dropped() {
    let merged = merge(
        &[beneficiary("B1"), beneficiary("B2")],
        &[inpatient("I1", "B1", "P1", "2009-01-01", "2009-01-03")],
        &[
            outpatient("O1", "B2", "P2"),
            outpatient("O2", "B9", "P2"),
        ],
    );

    let ids: Vec<&str> = merged.iter().map(|r| r.claim_id()).collect();
    assert_eq!(ids, vec!["I1", "O1"]);
    assert_eq!(merged[0].claim.kind, ClaimKind::Inpatient);
    assert_eq!(merged[1].beneficiary.bene_id, "B2");
}

#[test]
fn test_stay_length_survives_but_raw_dates_do_not() {
    let merged = merge(
        &[beneficiary("B1")],
        &[inpatient("I1", "B1", "P1", "2009-01-01", "2009-01-03")],
        &[outpatient("O1", "B1", "P1")],
    );

    assert_eq!(merged[0].number(columns::ADMIT_FOR_DAYS), Some(3.0));
    assert_eq!(merged[0].claim.admission, None);
    assert_eq!(merged[0].claim.discharge, None);
    assert_eq!(merged[0].text(columns::DIAGNOSIS_GROUP_CODE), Some("201"));
    assert_eq!(merged[1].number(columns::ADMIT_FOR_DAYS), None);
    assert_eq!(merged[1].text(columns::DIAGNOSIS_GROUP_CODE), None);
}

#[test]
fn test_beneficiary_normalization() {
    let dead = beneficiary("B2")
        .with(columns::DOD, "2003-01-01")
        .with(columns::RENAL_DISEASE_INDICATOR, "Y")
        .with(columns::CHRONIC_CONDITIONS[0], 1);
    let merged = merge(
        &[beneficiary("B1"), dead],
        &[],
        &[outpatient("O1", "B1", "P1"), outpatient("O2", "B2", "P1")],
    );

    let alive = &merged[0].beneficiary;
    assert_eq!(alive.age, Some(67));
    assert_eq!(alive.whether_dead, 0);
    assert_eq!(alive.renal_disease, 0);
    assert!(alive.chronic_conditions.iter().all(|flag| *flag == Some(0)));

    let dead = &merged[1].beneficiary;
    assert_eq!(dead.age, Some(60));
    assert_eq!(dead.whether_dead, 1);
    assert_eq!(dead.renal_disease, 1);
    assert_eq!(dead.chronic_conditions[0], Some(1));
    assert_eq!(merged[1].date(columns::DOD), Some(date("2003-01-01")));
}

#[test]
fn test_first_beneficiary_row_wins() {
    let merged = merge(
        &[
            beneficiary("B1").with(columns::STATE, "1"),
            beneficiary("B1").with(columns::STATE, "2"),
        ],
        &[],
        &[outpatient("O1", "B1", "P1")],
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text(columns::STATE), Some("1"));
}

#[test]
fn test_text_columns_are_parsed() {
    let tables = ClaimTables::new(
        vec![text_table(&beneficiary_schema(), &[beneficiary("B1")])],
        vec![text_table(
            &inpatient_schema(),
            &[inpatient("I1", "B1", "P1", "2009-01-01", "2009-01-10")],
        )],
        vec![text_table(&outpatient_schema(), &[])],
    );
    let merged = RecordMerger::new(test_config()).merge(&tables).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].number(columns::ADMIT_FOR_DAYS), Some(10.0));
    assert_eq!(merged[0].number(columns::INSC_CLAIM_AMT_REIMBURSED), Some(26000.0));
}

#[test]
fn test_missing_required_column_is_schema_error() {
    let mut tables = claim_tables(
        &[beneficiary("B1")],
        &[],
        &[outpatient("O1", "B1", "P1")],
    );
    tables.outpatient = vec![drop_column(&tables.outpatient[0], columns::PROVIDER)];

    match RecordMerger::new(test_config()).merge(&tables) {
        Err(Error::Schema(message)) => assert!(message.contains("Provider")),
        other => panic!("expected a schema error, got {other:?}"),
    }
}

#[test]
fn test_null_identifier_is_schema_error() {
    let tables = claim_tables(
        &[beneficiary("B1")],
        &[],
        &[outpatient("O1", "B1", "P1").without(columns::PROVIDER)],
    );
    assert!(matches!(
        RecordMerger::new(test_config()).merge(&tables),
        Err(Error::Schema(_))
    ));
}

#[test]
fn test_malformed_date_is_parse_error() {
    let tables = ClaimTables::new(
        vec![text_table(
            &beneficiary_schema(),
            &[beneficiary("B1"), beneficiary("B2").with(columns::DOB, "01/02/1943")],
        )],
        vec![],
        vec![table(&outpatient_schema(), &[outpatient("O1", "B1", "P1")])],
    );
    match RecordMerger::new(test_config()).merge(&tables) {
        Err(Error::Parse { column, row, .. }) => {
            assert_eq!(column, columns::DOB);
            assert_eq!(row, 1);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_merged_table_reads_back_from_csv() {
    let merged = merge(
        &[beneficiary("B1"), beneficiary("B2").with(columns::DOD, "2008-05-01")],
        &[inpatient("I1", "B1", "P1", "2009-01-01", "2009-01-03")],
        &[outpatient("O1", "B2", "P2")],
    );
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.csv");
    write_csv(&path, &[merged_to_record_batch(&merged).unwrap()]).unwrap();

    let batches = read_table(&path).unwrap();
    let reread = RecordMerger::new(test_config()).read_merged(&batches).unwrap();

    assert_eq!(reread.len(), 2);
    assert_eq!(reread[0].claim_id(), "I1");
    assert_eq!(reread[0].number(columns::ADMIT_FOR_DAYS), Some(3.0));
    assert_eq!(reread[0].text(columns::DIAGNOSIS_CODES[0]), Some("4019"));
    assert_eq!(reread[1].beneficiary.whether_dead, 1);
    assert_eq!(reread[1].beneficiary.age, merged[1].beneficiary.age);
    assert_eq!(
        reread[1].beneficiary.chronic_conditions,
        merged[1].beneficiary.chronic_conditions
    );
}

#[test]
fn test_digit_codes_and_identifiers_survive_csv_tables() {
    let tables = claim_tables(
        &[beneficiary("00017")],
        &[inpatient("0003", "00017", "00042", "2009-01-01", "2009-01-02")],
        &[
            outpatient("0001", "00017", "00042").with(columns::DIAGNOSIS_CODES[0], "0389"),
            outpatient("0002", "00017", "00042").with(columns::DIAGNOSIS_CODES[0], "0389"),
        ],
    );
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = ["beneficiary", "inpatient", "outpatient"]
        .iter()
        .map(|stem| dir.path().join(format!("{stem}.csv")))
        .collect();
    write_csv(&paths[0], &tables.beneficiary).unwrap();
    write_csv(&paths[1], &tables.inpatient).unwrap();
    write_csv(&paths[2], &tables.outpatient).unwrap();

    let loaded = ClaimTables::load(&paths[0], &paths[1], &paths[2]).unwrap();
    let merged = RecordMerger::new(test_config()).merge(&loaded).unwrap();

    let ids: Vec<&str> = merged.iter().map(|r| r.claim_id()).collect();
    assert_eq!(ids, vec!["0003", "0001", "0002"]);
    assert_eq!(merged[1].provider(), "00042");
    assert_eq!(merged[1].beneficiary.bene_id, "00017");
    assert_eq!(merged[1].text(columns::DIAGNOSIS_CODES[0]), Some("0389"));

    let (features, _) = FeatureBuilder::new(FeatureCatalog::standard(), test_config())
        .build(&merged, &[])
        .unwrap();
    assert_eq!(
        features.column("ClmDiagnosisCode_1_Grp").unwrap().values,
        ColumnValues::Text(vec![
            Some("40".to_string()),
            Some("03".to_string()),
            Some("03".to_string())
        ])
    );
    // Two of the provider's three claims carry 0389
    let tf = features.numeric("ClmDiagnosisCode_1TF").unwrap();
    assert!((tf[1].unwrap() - 2.0 / 3.0).abs() < 1e-12);
}
