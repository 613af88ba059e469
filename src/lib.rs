//! Provider-level fraud risk scoring for Medicare claims.
//!
//! Merges beneficiary, inpatient and outpatient tables, engineers the grouped
//! aggregate and code co-occurrence features of a claim batch against a
//! frozen reference corpus, reconciles them to the training-time feature
//! order and scores them with a pretrained gradient-boosted classifier.

pub mod algorithm;
pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod scoring;
pub mod selection;
pub mod utils;

// Core types
pub use config::{ArtifactConfig, CategoricalConfig, PipelineConfig};
pub use error::{Error, Result};
pub use models::{BeneficiaryRecord, ClaimKind, ClaimRecord, Label, MergedRecord, Prediction};

// Pipeline stages
pub use algorithm::features::{FeatureBuilder, FeatureCatalog, FeatureTable};
pub use algorithm::merge::{ClaimTables, RecordMerger};
pub use algorithm::reconcile::{FeatureMatrix, SchemaReconciler};
pub use corpus::{CorpusCache, ReferenceCorpus};
pub use pipeline::{FeatureEngineer, FraudPipeline};
pub use schema::FrozenSchema;
pub use scoring::{Classifier, GradientBoostedTrees, ScoringAdapter, StandardScaler};
pub use selection::{ParseSelectionError, Selection};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Table IO
pub use utils::{read_table, read_tables_parallel, write_csv};
