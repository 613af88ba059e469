//! Record merger
//!
//! Joins the beneficiary, inpatient and outpatient tables into one merged
//! claim table. Inpatient and outpatient claims are unioned on the outpatient
//! column set (plus the diagnosis group code and derived stay length), so the
//! raw admission and discharge dates do not survive the union.

pub mod normalize;

use arrow::record_batch::RecordBatch;
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{BeneficiaryRecord, ClaimKind, ClaimRecord, MergedRecord};
use crate::utils::io::read_tables_parallel;
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

pub use normalize::{read_beneficiaries, read_claims};

/// The three raw tables of one claims corpus
#[derive(Debug, Clone, Default)]
pub struct ClaimTables {
    pub beneficiary: Vec<RecordBatch>,
    pub inpatient: Vec<RecordBatch>,
    pub outpatient: Vec<RecordBatch>,
}

impl ClaimTables {
    #[must_use]
    pub fn new(
        beneficiary: Vec<RecordBatch>,
        inpatient: Vec<RecordBatch>,
        outpatient: Vec<RecordBatch>,
    ) -> Self {
        Self {
            beneficiary,
            inpatient,
            outpatient,
        }
    }

    /// Read the three tables from Parquet or CSV files in parallel
    pub fn load(beneficiary: &Path, inpatient: &Path, outpatient: &Path) -> Result<Self> {
        let mut tables = read_tables_parallel(&[beneficiary, inpatient, outpatient])?.into_iter();
        Ok(Self {
            beneficiary: tables.next().unwrap_or_default(),
            inpatient: tables.next().unwrap_or_default(),
            outpatient: tables.next().unwrap_or_default(),
        })
    }

    /// Total claim rows across inpatient and outpatient tables
    #[must_use]
    pub fn claim_rows(&self) -> usize {
        self.inpatient
            .iter()
            .chain(&self.outpatient)
            .map(RecordBatch::num_rows)
            .sum()
    }
}

/// Joins claim tables to beneficiary data
#[derive(Debug, Clone, Default)]
pub struct RecordMerger {
    config: PipelineConfig,
}

impl RecordMerger {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Merge a corpus into one row per claim with a matching beneficiary
    ///
    /// Rows come out inpatient first, then outpatient, each in input order.
    pub fn merge(&self, tables: &ClaimTables) -> Result<Vec<MergedRecord>> {
        let start = Instant::now();
        log_operation_start("Merging", format!("{} claim rows", tables.claim_rows()));

        let beneficiaries = read_beneficiaries(&tables.beneficiary, &self.config)?;
        let mut claims = read_claims(&tables.inpatient, ClaimKind::Inpatient, &self.config)?;
        // The union keeps the outpatient column set
        for claim in &mut claims {
            claim.admission.take();
            claim.discharge.take();
        }
        debug!("Read {} inpatient claims", claims.len());

        let outpatient = read_claims(&tables.outpatient, ClaimKind::Outpatient, &self.config)?;
        debug!("Read {} outpatient claims", outpatient.len());
        claims.extend(outpatient);

        let merged = join_beneficiaries(claims, beneficiaries);
        log_operation_complete("merged", "claim tables", merged.len(), Some(start.elapsed()));
        Ok(merged)
    }

    /// Read an already merged table back into records
    pub fn read_merged(&self, batches: &[RecordBatch]) -> Result<Vec<MergedRecord>> {
        let beneficiaries = read_beneficiaries(batches, &self.config)?;
        let claims = read_claims(batches, ClaimKind::Merged, &self.config)?;
        let merged = join_beneficiaries(claims, beneficiaries);
        info!("Read {} merged claim rows", merged.len());
        Ok(merged)
    }
}

/// Inner join on beneficiary identifier; the first record of a beneficiary wins
fn join_beneficiaries(
    claims: Vec<ClaimRecord>,
    beneficiaries: Vec<BeneficiaryRecord>,
) -> Vec<MergedRecord> {
    let mut by_id: FxHashMap<String, Arc<BeneficiaryRecord>> =
        FxHashMap::with_capacity_and_hasher(beneficiaries.len(), Default::default());
    let mut duplicates = 0usize;
    for bene in beneficiaries {
        if by_id.contains_key(&bene.bene_id) {
            duplicates += 1;
        } else {
            by_id.insert(bene.bene_id.clone(), Arc::new(bene));
        }
    }
    if duplicates > 0 {
        debug!("Ignored {duplicates} repeated beneficiary rows");
    }

    let total = claims.len();
    let merged: Vec<MergedRecord> = claims
        .into_iter()
        .filter_map(|claim| {
            let bene = by_id.get(&claim.bene_id)?;
            Some(MergedRecord::new(claim, Arc::clone(bene)))
        })
        .collect();

    let unmatched = total - merged.len();
    if unmatched > 0 {
        debug!("Dropped {unmatched} claims without a matching beneficiary");
        log_warning(
            &format!("{unmatched} of {total} claims have no matching beneficiary"),
            None,
        );
    }
    merged
}
