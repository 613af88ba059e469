//! The ordered feature catalog
//!
//! The catalog enumerates every engineered column in the order the scaler
//! and classifier were fitted on. Its sections are:
//!
//! 1. per-provider means
//! 2. per-beneficiary means
//! 3. per-attribute means for physicians, diagnosis group, admission
//!    diagnosis and the leading procedure and diagnosis codes
//! 4. claim counts over provider-anchored compound keys
//! 5. diagnosis code group columns with their means
//! 6. diagnosis then procedure code co-occurrence scores
//!
//! Categorical dummies follow the catalog and are appended by the reconciler.

use smallvec::{SmallVec, smallvec};

use super::cooccurrence::CodeFamily;
use super::keys::{ClaimAttribute, NumericField};
use crate::algorithm::reconcile::encoding::sorted_levels;
use crate::config::CategoricalConfig;
use crate::schema::{columns, merged_schema};

use ClaimAttribute as A;
use NumericField as F;

/// Attributes forming one grouping key
pub type GroupKey = SmallVec<[ClaimAttribute; 4]>;

const PROVIDER_FIELDS: [NumericField; 10] = [
    F::InscClaimAmtReimbursed,
    F::DeductibleAmtPaid,
    F::IpAnnualReimbursementAmt,
    F::IpAnnualDeductibleAmt,
    F::OpAnnualReimbursementAmt,
    F::OpAnnualDeductibleAmt,
    F::Age,
    F::PartACoverageMonths,
    F::PartBCoverageMonths,
    F::AdmitForDays,
];

const BENEFICIARY_FIELDS: [NumericField; 4] = [
    F::InscClaimAmtReimbursed,
    F::DeductibleAmtPaid,
    F::IpAnnualReimbursementAmt,
    F::AdmitForDays,
];

const CLAIM_FIELDS: [NumericField; 7] = [
    F::InscClaimAmtReimbursed,
    F::DeductibleAmtPaid,
    F::IpAnnualReimbursementAmt,
    F::IpAnnualDeductibleAmt,
    F::OpAnnualReimbursementAmt,
    F::OpAnnualDeductibleAmt,
    F::AdmitForDays,
];

const MEAN_ATTRIBUTES: [ClaimAttribute; 9] = [
    A::AttendingPhysician,
    A::OperatingPhysician,
    A::DiagnosisGroupCode,
    A::AdmitDiagnosisCode,
    A::ProcedureCode(1),
    A::ProcedureCode(2),
    A::DiagnosisCode(1),
    A::DiagnosisCode(2),
    A::DiagnosisCode(3),
];

/// Statistic computed per group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    /// Mean of a field over the group's non-null values
    Mean(NumericField),
    /// Number of rows in the group
    Count,
}

/// One aggregate feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: String,
    pub group_by: GroupKey,
    pub statistic: Statistic,
}

impl FeatureSpec {
    #[must_use]
    pub fn mean(label: &str, group_by: GroupKey, field: NumericField) -> Self {
        Self {
            name: format!("Per{label}Avg_{}", field.column_name()),
            group_by,
            statistic: Statistic::Mean(field),
        }
    }

    #[must_use]
    pub fn count(group_by: GroupKey) -> Self {
        let mut name = String::from("ClmCount");
        for attribute in &group_by {
            name.push('_');
            name.push_str(&attribute.column_name());
        }
        Self {
            name,
            group_by,
            statistic: Statistic::Count,
        }
    }
}

/// One step of feature construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// A grouped statistic
    Aggregate(FeatureSpec),
    /// The text code group column of a diagnosis position
    CodeGroup(usize),
    /// Co-occurrence scores of a code family
    Cooccurrence(CodeFamily),
}

impl CatalogEntry {
    /// Columns this entry adds to the feature table
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        match self {
            Self::Aggregate(spec) => vec![spec.name.clone()],
            Self::CodeGroup(position) => {
                vec![ClaimAttribute::DiagnosisCodeGroup(*position).column_name().into_owned()]
            }
            Self::Cooccurrence(family) => family
                .positions()
                .flat_map(|position| family.column_names(position))
                .collect(),
        }
    }
}

/// Ordered list of engineered features
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for FeatureCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeatureCatalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The catalog the fitted scaler and classifier expect
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = Vec::new();
        let mut add = |spec: FeatureSpec| entries.push(CatalogEntry::Aggregate(spec));

        for field in PROVIDER_FIELDS {
            add(FeatureSpec::mean("Provider", smallvec![A::Provider], field));
        }
        for field in BENEFICIARY_FIELDS {
            add(FeatureSpec::mean("BeneID", smallvec![A::BeneId], field));
        }
        for attribute in MEAN_ATTRIBUTES {
            let label = attribute.column_name();
            for field in CLAIM_FIELDS {
                add(FeatureSpec::mean(&label, smallvec![attribute], field));
            }
        }
        for key in count_keys() {
            add(FeatureSpec::count(key));
        }

        for position in 1..=3 {
            entries.push(CatalogEntry::CodeGroup(position));
            let label = ClaimAttribute::DiagnosisCodeGroup(position).column_name();
            for field in CLAIM_FIELDS {
                // Fitted on the raw code rather than its group for this one field
                let key = if field == F::OpAnnualReimbursementAmt {
                    smallvec![A::DiagnosisCode(position)]
                } else {
                    smallvec![A::DiagnosisCodeGroup(position)]
                };
                entries.push(CatalogEntry::Aggregate(FeatureSpec::mean(&label, key, field)));
            }
        }

        entries.push(CatalogEntry::Cooccurrence(CodeFamily::Diagnosis));
        entries.push(CatalogEntry::Cooccurrence(CodeFamily::Procedure));

        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every aggregate feature, in catalog order
    pub fn aggregates(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.entries.iter().filter_map(|entry| match entry {
            CatalogEntry::Aggregate(spec) => Some(spec),
            _ => None,
        })
    }

    /// Columns added to the feature table, in order, including text helpers
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(CatalogEntry::column_names)
            .collect()
    }

    /// The full numeric column order produced by the reconciler
    ///
    /// Merged numeric columns come first, then the catalog's numeric features,
    /// then one dummy per non-first level of each categorical column.
    #[must_use]
    pub fn expected_columns(&self, categorical: &[CategoricalConfig]) -> Vec<String> {
        let removed = columns::removed_columns();
        let mut expected = passthrough_columns();
        expected.extend(
            self.feature_names()
                .into_iter()
                .filter(|name| !removed.iter().any(|r| *r == name.as_str())),
        );
        for config in categorical {
            expected.extend(
                sorted_levels(config.levels.clone())
                    .into_iter()
                    .skip(1)
                    .map(|level| format!("{}_{level}", config.column)),
            );
        }
        expected
    }
}

/// Merged columns that survive pruning, in merged order
#[must_use]
pub fn passthrough_columns() -> Vec<String> {
    let removed = columns::removed_columns();
    merged_schema()
        .fields()
        .iter()
        .map(|field| field.name().as_str())
        .filter(|name| *name != columns::CLAIM_ID && *name != columns::PROVIDER)
        .filter(|name| !removed.iter().any(|r| r == name))
        .map(ToString::to_string)
        .collect()
}

fn count_keys() -> Vec<GroupKey> {
    let mut keys: Vec<GroupKey> = vec![
        smallvec![A::Provider],
        smallvec![A::Provider, A::BeneId],
        smallvec![A::Provider, A::AttendingPhysician],
        smallvec![A::Provider, A::OtherPhysician],
        smallvec![A::Provider, A::OperatingPhysician],
        smallvec![A::Provider, A::AdmitDiagnosisCode],
    ];
    keys.extend((1..=5).map(|n| -> GroupKey { smallvec![A::Provider, A::ProcedureCode(n)] }));
    keys.extend((1..=9).map(|n| -> GroupKey { smallvec![A::Provider, A::DiagnosisCode(n)] }));
    let compound: [GroupKey; 9] = [
        smallvec![A::Provider, A::DiagnosisGroupCode],
        smallvec![A::Provider, A::BeneId, A::AttendingPhysician],
        smallvec![A::Provider, A::BeneId, A::OtherPhysician],
        smallvec![A::Provider, A::BeneId, A::AttendingPhysician, A::ProcedureCode(1)],
        smallvec![A::Provider, A::BeneId, A::AttendingPhysician, A::DiagnosisCode(1)],
        smallvec![A::Provider, A::BeneId, A::OperatingPhysician],
        smallvec![A::Provider, A::BeneId, A::ProcedureCode(1)],
        smallvec![A::Provider, A::BeneId, A::DiagnosisCode(1)],
        smallvec![A::Provider, A::BeneId, A::DiagnosisCode(1), A::ProcedureCode(1)],
    ];
    keys.extend(compound);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_sizes() {
        let catalog = FeatureCatalog::standard();
        let counts = catalog
            .aggregates()
            .filter(|spec| spec.statistic == Statistic::Count)
            .count();
        assert_eq!(counts, 29);
        assert_eq!(catalog.aggregates().count(), 10 + 4 + 63 + 29 + 21);
    }

    #[test]
    fn test_group_average_quirk_uses_raw_code() {
        let catalog = FeatureCatalog::standard();
        let spec = catalog
            .aggregates()
            .find(|spec| spec.name == "PerClmDiagnosisCode_2_GrpAvg_OPAnnualReimbursementAmt")
            .unwrap();
        assert_eq!(spec.group_by.as_slice(), &[A::DiagnosisCode(2)]);

        let spec = catalog
            .aggregates()
            .find(|spec| spec.name == "PerClmDiagnosisCode_2_GrpAvg_OPAnnualDeductibleAmt")
            .unwrap();
        assert_eq!(spec.group_by.as_slice(), &[A::DiagnosisCodeGroup(2)]);
    }

    #[test]
    fn test_passthrough_columns() {
        let columns = passthrough_columns();
        assert_eq!(columns.len(), 23);
        assert_eq!(columns[0], "InscClaimAmtReimbursed");
        assert_eq!(columns[2], "AdmitForDays");
        assert_eq!(columns[22], "WhetherDead");
    }
}
