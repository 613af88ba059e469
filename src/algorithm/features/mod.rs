//! Aggregate feature builder
//!
//! Computes every catalog feature over the scoring batch unioned with the
//! reference corpus and joins the results into one row per batch claim.
//! Each catalog section is a pure function of the working set; the sections
//! are joined onto the table by claim identifier in catalog order.

pub mod aggregate;
pub mod catalog;
pub mod cooccurrence;
pub mod keys;
pub mod table;

use log::debug;
use std::time::Instant;

use crate::algorithm::reconcile::encoding::CategoricalLevels;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::MergedRecord;
use crate::utils::logging::{log_operation_complete, log_warning};

pub use aggregate::{GroupIndex, WorkingSet, compute_aggregates};
pub use catalog::{CatalogEntry, FeatureCatalog, FeatureSpec, GroupKey, Statistic};
pub use cooccurrence::{CodeFamily, CodeScores, score_code_column, score_family};
pub use keys::{ClaimAttribute, NumericField};
pub use table::{ColumnValues, FeatureColumn, FeatureTable};

/// Builds the per-claim feature table of a batch
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    catalog: FeatureCatalog,
    config: PipelineConfig,
}

impl FeatureBuilder {
    #[must_use]
    pub fn new(catalog: FeatureCatalog, config: PipelineConfig) -> Self {
        Self { catalog, config }
    }

    #[must_use]
    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// Engineer features for `batch` using `reference` as extra observations
    ///
    /// Returns one row per distinct batch claim in first-occurrence order,
    /// together with the categorical levels observed over batch and reference.
    pub fn build(
        &self,
        batch: &[MergedRecord],
        reference: &[MergedRecord],
    ) -> Result<(FeatureTable, Vec<CategoricalLevels>)> {
        let start = Instant::now();
        if batch.is_empty() {
            log_warning("Engineering features for an empty batch", None);
        }

        let set = WorkingSet::new(
            batch,
            reference,
            self.config.code_group_len,
            &self.config.missing_code_group,
        );
        debug!(
            "Working set: {} batch claims, {} rows in total",
            set.batch_len(),
            set.len()
        );

        let mut table = FeatureTable::from_records(set.batch_rows());
        let keys: Vec<&str> = set.batch_rows().map(MergedRecord::claim_id).collect();

        let mut pending: Vec<&FeatureSpec> = Vec::new();
        for entry in self.catalog.entries() {
            match entry {
                CatalogEntry::Aggregate(spec) => pending.push(spec),
                CatalogEntry::CodeGroup(position) => {
                    flush_aggregates(&set, &mut table, &keys, &mut pending)?;
                    let column = FeatureColumn::text(
                        ClaimAttribute::DiagnosisCodeGroup(*position).column_name(),
                        set.batch_code_groups(*position),
                    );
                    table.join_keyed(&keys, vec![column])?;
                }
                CatalogEntry::Cooccurrence(family) => {
                    flush_aggregates(&set, &mut table, &keys, &mut pending)?;
                    debug!("Scoring {family}");
                    table.join_keyed(&keys, score_family(&set, *family))?;
                }
            }
        }
        flush_aggregates(&set, &mut table, &keys, &mut pending)?;

        let levels = self
            .config
            .categorical_levels
            .iter()
            .map(|categorical| {
                CategoricalLevels::observe(
                    &categorical.column,
                    set.rows().map(|record| record.text(&categorical.column)),
                )
            })
            .collect();

        log_operation_complete(
            "engineered features for",
            "claim batch",
            table.len(),
            Some(start.elapsed()),
        );
        Ok((table, levels))
    }
}

fn flush_aggregates(
    set: &WorkingSet<'_>,
    table: &mut FeatureTable,
    keys: &[&str],
    pending: &mut Vec<&FeatureSpec>,
) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    debug!("Computing {} aggregate features", pending.len());
    let columns = compute_aggregates(set, pending);
    pending.clear();
    table.join_keyed(keys, columns)
}
