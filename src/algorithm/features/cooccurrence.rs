//! Co-occurrence scoring of diagnosis and procedure codes per provider
//!
//! For each code column the scorer weighs how characteristic a code is for
//! the provider billing it:
//!
//! * term frequency: claims with the code under the provider divided by the
//!   provider's non-null entries in that column
//! * inverse document frequency: `log2(N / providers exhibiting the code)`
//!   with `N` the number of distinct providers in the working set
//! * weight: the product of the two
//!
//! Rows without a code get no value in any of the three columns.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

use super::aggregate::WorkingSet;
use super::keys::ClaimAttribute;
use super::table::FeatureColumn;

/// A family of code columns scored with the same algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFamily {
    /// Diagnosis codes 1 to 4
    Diagnosis,
    /// Procedure codes 1 to 3
    Procedure,
}

impl CodeFamily {
    /// Scored 1-based code positions
    #[must_use]
    pub const fn positions(self) -> std::ops::RangeInclusive<usize> {
        match self {
            Self::Diagnosis => 1..=4,
            Self::Procedure => 1..=3,
        }
    }

    #[must_use]
    pub const fn attribute(self, position: usize) -> ClaimAttribute {
        match self {
            Self::Diagnosis => ClaimAttribute::DiagnosisCode(position),
            Self::Procedure => ClaimAttribute::ProcedureCode(position),
        }
    }

    /// Names of the three columns emitted for one code position
    #[must_use]
    pub fn column_names(self, position: usize) -> [String; 3] {
        let column = self.attribute(position).column_name();
        [
            format!("{column}TF"),
            format!("{column}_IDF"),
            format!("{column}TF-IDF"),
        ]
    }
}

impl fmt::Display for CodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagnosis => write!(f, "diagnosis codes"),
            Self::Procedure => write!(f, "procedure codes"),
        }
    }
}

/// Per-row scores of one code column, for the batch rows of a working set
#[derive(Debug, Clone, PartialEq)]
pub struct CodeScores {
    pub term_frequency: Vec<Option<f64>>,
    pub inverse_document_frequency: Vec<Option<f64>>,
    pub weight: Vec<Option<f64>>,
}

/// Score one code column over the whole working set
#[must_use]
pub fn score_code_column(set: &WorkingSet<'_>, attribute: ClaimAttribute) -> CodeScores {
    let corpus_size = set.distinct_providers() as f64;

    let mut pair_counts: FxHashMap<(&str, &str), u32> = FxHashMap::default();
    let mut provider_totals: FxHashMap<&str, u32> = FxHashMap::default();
    let mut code_providers: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();

    for record in set.rows() {
        let Some(code) = attribute.stored_value(record) else {
            continue;
        };
        let provider = record.provider();
        *pair_counts.entry((provider, code)).or_default() += 1;
        *provider_totals.entry(provider).or_default() += 1;
        code_providers.entry(code).or_default().insert(provider);
    }
    debug!(
        "Scoring {attribute}: {} distinct codes over {corpus_size} providers",
        code_providers.len()
    );

    let batch_len = set.batch_len();
    let mut scores = CodeScores {
        term_frequency: Vec::with_capacity(batch_len),
        inverse_document_frequency: Vec::with_capacity(batch_len),
        weight: Vec::with_capacity(batch_len),
    };

    for record in set.batch_rows() {
        let score = attribute.stored_value(record).and_then(|code| {
            let provider = record.provider();
            let count = f64::from(*pair_counts.get(&(provider, code))?);
            let total = f64::from(*provider_totals.get(provider)?);
            let providers = code_providers.get(code)?.len() as f64;
            let tf = count / total;
            let idf = (corpus_size / providers).log2();
            Some((tf, idf, tf * idf))
        });
        scores.term_frequency.push(score.map(|s| s.0));
        scores.inverse_document_frequency.push(score.map(|s| s.1));
        scores.weight.push(score.map(|s| s.2));
    }

    scores
}

/// Score every position of a code family, three columns per position
#[must_use]
pub fn score_family(set: &WorkingSet<'_>, family: CodeFamily) -> Vec<FeatureColumn> {
    family
        .positions()
        .flat_map(|position| {
            let scores = score_code_column(set, family.attribute(position));
            let [tf, idf, weight] = family.column_names(position);
            [
                FeatureColumn::numeric(tf, scores.term_frequency),
                FeatureColumn::numeric(idf, scores.inverse_document_frequency),
                FeatureColumn::numeric(weight, scores.weight),
            ]
        })
        .collect()
}
