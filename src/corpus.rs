//! Reference corpus handle and its write-once cache
//!
//! The reference corpus is the merged training claims. It is built once,
//! never mutated, and shared between scoring calls behind an `Arc`.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use crate::algorithm::merge::{ClaimTables, RecordMerger};
use crate::error::Result;
use crate::models::MergedRecord;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Immutable merged reference claims
#[derive(Debug, Clone, Default)]
pub struct ReferenceCorpus {
    records: Arc<[MergedRecord]>,
}

impl ReferenceCorpus {
    #[must_use]
    pub fn from_records(records: Vec<MergedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Merge the three raw tables into a corpus
    pub fn load(tables: &ClaimTables, merger: &RecordMerger) -> Result<Self> {
        let start = Instant::now();
        log_operation_start("Building reference corpus from", "claim tables");
        let corpus = Self::from_records(merger.merge(tables)?);
        log_operation_complete(
            "built",
            "reference corpus",
            corpus.len(),
            Some(start.elapsed()),
        );
        Ok(corpus)
    }

    #[must_use]
    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Provides the reference corpus once and reuses it across calls
///
/// Concurrent first callers wait for a single loader. A failed load leaves
/// the cache empty so a later call can retry.
#[derive(Debug, Default)]
pub struct CorpusCache {
    cell: OnceLock<Arc<ReferenceCorpus>>,
    init: Mutex<()>,
}

impl CorpusCache {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The cached corpus, if one has been loaded
    #[must_use]
    pub fn get(&self) -> Option<Arc<ReferenceCorpus>> {
        self.cell.get().cloned()
    }

    /// Return the cached corpus, running `load` if none is cached yet
    pub fn get_or_try_init<F>(&self, load: F) -> Result<Arc<ReferenceCorpus>>
    where
        F: FnOnce() -> Result<ReferenceCorpus>,
    {
        if let Some(corpus) = self.cell.get() {
            return Ok(Arc::clone(corpus));
        }

        // A poisoned guard only means an earlier loader panicked; the cell is still empty.
        let _guard = self
            .init
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(corpus) = self.cell.get() {
            return Ok(Arc::clone(corpus));
        }

        let corpus = Arc::new(load()?);
        Ok(Arc::clone(self.cell.get_or_init(|| corpus)))
    }
}
