//! Scoring pipeline
//!
//! One scoring call runs the batch through feature engineering, schema
//! reconciliation and the scoring adapter. The reference corpus is injected
//! and only read.

use log::{debug, info};
use rustc_hash::FxHashMap;
use std::time::Instant;

use crate::algorithm::features::{FeatureBuilder, FeatureCatalog};
use crate::algorithm::reconcile::{FeatureMatrix, SchemaReconciler};
use crate::config::{ArtifactConfig, PipelineConfig};
use crate::corpus::ReferenceCorpus;
use crate::error::{Error, Result};
use crate::models::{MergedRecord, Prediction};
use crate::schema::FrozenSchema;
use crate::scoring::{Classifier, GradientBoostedTrees, ScoringAdapter, StandardScaler};

/// Feature engineering and reconciliation against a frozen feature order
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    builder: FeatureBuilder,
    reconciler: SchemaReconciler,
}

impl FeatureEngineer {
    /// Create an engineer for the standard catalog
    ///
    /// Fails with a schema mismatch when the catalog's columns, with the
    /// configured categorical levels, differ from the frozen order.
    pub fn new(config: PipelineConfig, frozen: FrozenSchema) -> Result<Self> {
        config.validate()?;
        let catalog = FeatureCatalog::standard();
        frozen.verify(&catalog.expected_columns(&config.categorical_levels))?;
        debug!("Frozen feature order verified: {} columns", frozen.len());
        Ok(Self {
            builder: FeatureBuilder::new(catalog, config),
            reconciler: SchemaReconciler::new(frozen),
        })
    }

    #[must_use]
    pub fn frozen(&self) -> &FrozenSchema {
        self.reconciler.frozen()
    }

    /// Engineer the reconciled feature matrix of a batch, one row per distinct claim
    pub fn engineer(&self, batch: &[MergedRecord], corpus: &ReferenceCorpus) -> Result<FeatureMatrix> {
        let (table, levels) = self.builder.build(batch, corpus.records())?;
        self.reconciler.reconcile(table, &levels)
    }
}

/// End-to-end scoring of claim batches
#[derive(Debug)]
pub struct FraudPipeline {
    engineer: FeatureEngineer,
    adapter: ScoringAdapter,
}

impl FraudPipeline {
    /// Assemble a pipeline; the scaler's feature names are the frozen order
    pub fn new(
        config: PipelineConfig,
        scaler: StandardScaler,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        let engineer = FeatureEngineer::new(config, scaler.frozen_schema())?;
        let adapter = ScoringAdapter::new(scaler, classifier)?;
        Ok(Self { engineer, adapter })
    }

    /// Load both artifacts and assemble a pipeline
    pub fn from_artifacts(config: PipelineConfig, artifacts: &ArtifactConfig) -> Result<Self> {
        let scaler = StandardScaler::from_json_file(&artifacts.scaler_path)?;
        let model = GradientBoostedTrees::from_json_file(&artifacts.model_path)?
            .with_threshold(config.fraud_threshold);
        info!(
            "Loaded scaler ({} features) and model ({} trees)",
            scaler.len(),
            model.num_trees()
        );
        Self::new(config, scaler, Box::new(model)).map_err(|e| match e {
            Error::ArtifactLoad { message, .. } => Error::artifact(&artifacts.model_path, message),
            other => other,
        })
    }

    #[must_use]
    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    #[must_use]
    pub fn adapter(&self) -> &ScoringAdapter {
        &self.adapter
    }

    /// Engineer the unscaled feature matrix of a batch
    pub fn engineer_features(
        &self,
        batch: &[MergedRecord],
        corpus: &ReferenceCorpus,
    ) -> Result<FeatureMatrix> {
        self.engineer.engineer(batch, corpus)
    }

    /// Predict a label for every row of the batch, in batch order
    ///
    /// Rows sharing a claim identifier are scored once and share a label.
    pub fn predict(&self, batch: &[MergedRecord], corpus: &ReferenceCorpus) -> Result<Vec<Prediction>> {
        let start = Instant::now();
        info!(
            "Scoring {} claims against a reference corpus of {} claims",
            batch.len(),
            corpus.len()
        );

        let matrix = self.engineer.engineer(batch, corpus)?;
        let engineered = start.elapsed();
        let claim_ids = matrix.claim_ids().to_vec();
        let labels = self.adapter.score(matrix)?;

        let by_claim: FxHashMap<&str, _> = claim_ids
            .iter()
            .map(String::as_str)
            .zip(labels.iter().copied())
            .collect();
        let predictions = batch
            .iter()
            .map(|record| {
                by_claim
                    .get(record.claim_id())
                    .map(|label| Prediction::new(record.claim_id(), record.provider(), *label))
                    .ok_or_else(|| {
                        Error::Schema(format!("No label produced for claim '{}'", record.claim_id()))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Scored {} claims in {:?} (features {:?}, {} flagged)",
            predictions.len(),
            start.elapsed(),
            engineered,
            predictions.iter().filter(|p| p.label().is_fraud()).count()
        );
        Ok(predictions)
    }
}
