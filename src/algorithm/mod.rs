//! Pipeline algorithms
//!
//! Record merging, feature engineering and schema reconciliation.

pub mod features;
pub mod merge;
pub mod reconcile;

pub use features::{FeatureBuilder, FeatureCatalog, FeatureTable};
pub use merge::{ClaimTables, RecordMerger};
pub use reconcile::{FeatureMatrix, SchemaReconciler};
