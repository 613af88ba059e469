//! Grouped statistics over the working set
//!
//! The working set is the scoring batch followed by every reference row whose
//! claim is not in the batch. Statistics are computed over all of it, but
//! only batch rows receive values.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::catalog::{FeatureSpec, GroupKey, Statistic};
use super::keys::{ClaimAttribute, NumericField, code_group};
use super::table::FeatureColumn;
use crate::models::MergedRecord;

/// Number of diagnosis positions with a derived code group
pub const CODE_GROUP_POSITIONS: usize = 3;

/// Batch rows followed by the reference rows they do not replace
#[derive(Debug)]
pub struct WorkingSet<'a> {
    rows: Vec<&'a MergedRecord>,
    batch_len: usize,
    code_groups: Vec<[String; CODE_GROUP_POSITIONS]>,
}

impl<'a> WorkingSet<'a> {
    /// Union the batch with the reference rows, keyed by claim identifier
    ///
    /// A claim present in both keeps the batch row; repeated claims inside the
    /// batch keep their first occurrence.
    #[must_use]
    pub fn new(
        batch: &'a [MergedRecord],
        reference: &'a [MergedRecord],
        code_group_len: usize,
        missing_code_group: &str,
    ) -> Self {
        let mut seen: FxHashSet<&'a str> = FxHashSet::default();
        let mut rows = Vec::with_capacity(batch.len() + reference.len());

        for record in batch {
            if seen.insert(record.claim_id()) {
                rows.push(record);
            }
        }
        let batch_len = rows.len();
        if batch_len < batch.len() {
            debug!(
                "Ignored {} repeated claims in the batch",
                batch.len() - batch_len
            );
        }

        let mut replaced = 0usize;
        for record in reference {
            if seen.contains(record.claim_id()) {
                replaced += 1;
            } else {
                rows.push(record);
            }
        }
        if replaced > 0 {
            debug!("{replaced} reference claims replaced by batch rows");
        }

        let code_groups = rows
            .iter()
            .map(|record| {
                std::array::from_fn(|idx| {
                    code_group(
                        record.claim.diagnosis_code(idx + 1),
                        code_group_len,
                        missing_code_group,
                    )
                })
            })
            .collect();

        Self {
            rows,
            batch_len,
            code_groups,
        }
    }

    /// Every row of the working set
    pub fn rows(&self) -> impl Iterator<Item = &'a MergedRecord> + '_ {
        self.rows.iter().copied()
    }

    /// The distinct batch rows, in first-occurrence order
    pub fn batch_rows(&self) -> impl Iterator<Item = &'a MergedRecord> + '_ {
        self.rows[..self.batch_len].iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    /// Number of distinct providers over all rows
    #[must_use]
    pub fn distinct_providers(&self) -> usize {
        self.rows
            .iter()
            .map(|record| record.provider())
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Value of an attribute for a row, including derived code groups
    #[must_use]
    pub fn value(&self, row: usize, attribute: ClaimAttribute) -> Option<&str> {
        match attribute {
            ClaimAttribute::DiagnosisCodeGroup(position) => position
                .checked_sub(1)
                .and_then(|idx| self.code_groups.get(row)?.get(idx))
                .map(String::as_str),
            other => other.stored_value(self.rows.get(row)?),
        }
    }

    /// Code groups of the batch rows at a 1-based diagnosis position
    #[must_use]
    pub fn batch_code_groups(&self, position: usize) -> Vec<Option<String>> {
        (0..self.batch_len)
            .map(|row| {
                self.value(row, ClaimAttribute::DiagnosisCodeGroup(position))
                    .map(ToString::to_string)
            })
            .collect()
    }
}

/// Assignment of working-set rows to the groups of one key
#[derive(Debug, Clone)]
pub struct GroupIndex {
    row_groups: Vec<Option<u32>>,
    group_sizes: Vec<u32>,
}

impl GroupIndex {
    /// Group rows by `key`; a row with any null key component joins no group
    #[must_use]
    pub fn build(set: &WorkingSet<'_>, key: &[ClaimAttribute]) -> Self {
        let mut groups: FxHashMap<SmallVec<[&str; 4]>, u32> = FxHashMap::default();
        let mut group_sizes = Vec::new();

        let row_groups = (0..set.len())
            .map(|row| {
                let values = key
                    .iter()
                    .map(|attribute| set.value(row, *attribute))
                    .collect::<Option<SmallVec<[&str; 4]>>>()?;
                let next = group_sizes.len() as u32;
                let group = *groups.entry(values).or_insert(next);
                if group == next {
                    group_sizes.push(0);
                }
                group_sizes[group as usize] += 1;
                Some(group)
            })
            .collect();

        Self {
            row_groups,
            group_sizes,
        }
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.group_sizes.len()
    }

    /// Row count of each batch row's group
    #[must_use]
    pub fn counts(&self, batch_len: usize) -> Vec<Option<f64>> {
        self.row_groups[..batch_len]
            .iter()
            .map(|group| group.map(|g| f64::from(self.group_sizes[g as usize])))
            .collect()
    }

    /// Mean of `field` over each batch row's group, ignoring null values
    #[must_use]
    pub fn means(&self, set: &WorkingSet<'_>, field: NumericField) -> Vec<Option<f64>> {
        let mut sums = vec![0.0_f64; self.group_count()];
        let mut present = vec![0u32; self.group_count()];

        for (record, group) in set.rows().zip(&self.row_groups) {
            if let (Some(group), Some(value)) = (group, field.value(record)) {
                sums[*group as usize] += value;
                present[*group as usize] += 1;
            }
        }

        self.row_groups[..set.batch_len()]
            .iter()
            .map(|group| {
                let g = (*group)? as usize;
                (present[g] > 0).then(|| sums[g] / f64::from(present[g]))
            })
            .collect()
    }
}

/// Compute catalog features, sharing one group index per distinct key
#[must_use]
pub fn compute_aggregates(set: &WorkingSet<'_>, specs: &[&FeatureSpec]) -> Vec<FeatureColumn> {
    let mut indexes: FxHashMap<&GroupKey, GroupIndex> = FxHashMap::default();

    specs
        .iter()
        .map(|spec| {
            let index = indexes
                .entry(&spec.group_by)
                .or_insert_with(|| GroupIndex::build(set, &spec.group_by));
            let values = match spec.statistic {
                Statistic::Mean(field) => index.means(set, field),
                Statistic::Count => index.counts(set.batch_len()),
            };
            FeatureColumn::numeric(spec.name.clone(), values)
        })
        .collect()
}
