use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::info;
use provider_risk::models::predictions_to_record_batch;
use provider_risk::utils::io::find_table;
use provider_risk::utils::logging::{create_spinner, finish_and_clear, finish_progress_bar};
use provider_risk::{
    ArtifactConfig, ClaimTables, CorpusCache, FeatureEngineer, FraudPipeline, MergedRecord,
    PipelineConfig, RecordMerger, ReferenceCorpus, Selection, StandardScaler, write_csv,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

static CORPUS: CorpusCache = CorpusCache::new();

#[derive(Parser, Debug)]
#[command(name = "provider-risk", version, about = "Score Medicare claims for provider fraud risk")]
struct Cli {
    /// Pipeline configuration overrides (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the three claim tables into one table
    Merge {
        #[command(flatten)]
        tables: BatchTables,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the reconciled feature matrix of a batch
    Features {
        #[command(flatten)]
        batch: ScoringArgs,
        #[arg(long)]
        scaler: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Predict a fraud label for every claim of a batch
    Score {
        #[command(flatten)]
        batch: ScoringArgs,
        #[arg(long)]
        scaler: PathBuf,
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct BatchTables {
    #[arg(long)]
    beneficiary: PathBuf,
    #[arg(long)]
    inpatient: PathBuf,
    #[arg(long)]
    outpatient: PathBuf,
}

#[derive(Args, Debug)]
struct ScoringArgs {
    #[command(flatten)]
    tables: BatchTables,
    /// Directory holding beneficiary, inpatient and outpatient reference tables
    #[arg(long, required_unless_present_all = ["ref_beneficiary", "ref_inpatient", "ref_outpatient"])]
    reference_dir: Option<PathBuf>,
    #[arg(long)]
    ref_beneficiary: Option<PathBuf>,
    #[arg(long)]
    ref_inpatient: Option<PathBuf>,
    #[arg(long)]
    ref_outpatient: Option<PathBuf>,
    /// Rows to score: all, head:N, tail:N, random:N[:SEED], index:I, range:A:B
    #[arg(long, default_value = "all")]
    select: Selection,
}

impl ScoringArgs {
    fn reference_path(&self, explicit: Option<&PathBuf>, stem: &str) -> anyhow::Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.clone());
        }
        let dir = self
            .reference_dir
            .as_deref()
            .context("--reference-dir or every --ref-* path is required")?;
        Ok(find_table(dir, stem)?)
    }

    fn reference_paths(&self) -> anyhow::Result<[PathBuf; 3]> {
        Ok([
            self.reference_path(self.ref_beneficiary.as_ref(), "beneficiary")?,
            self.reference_path(self.ref_inpatient.as_ref(), "inpatient")?,
            self.reference_path(self.ref_outpatient.as_ref(), "outpatient")?,
        ])
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn merge_tables(tables: &BatchTables, merger: &RecordMerger) -> anyhow::Result<Vec<MergedRecord>> {
    let raw = ClaimTables::load(&tables.beneficiary, &tables.inpatient, &tables.outpatient)
        .context("Failed to read batch tables")?;
    Ok(merger.merge(&raw)?)
}

/// Merge the batch, apply the selection and fetch the cached reference corpus
fn prepare(
    args: &ScoringArgs,
    merger: &RecordMerger,
) -> anyhow::Result<(Vec<MergedRecord>, std::sync::Arc<ReferenceCorpus>)> {
    let [beneficiary, inpatient, outpatient] = args.reference_paths()?;
    let pb = create_spinner(Some("Loading reference corpus"));
    let corpus = CORPUS
        .get_or_try_init(|| {
            let tables = ClaimTables::load(&beneficiary, &inpatient, &outpatient)?;
            ReferenceCorpus::load(&tables, merger)
        })
        .context("Failed to load the reference corpus")?;
    finish_progress_bar(&pb, Some(&format!("Reference corpus: {} claims", corpus.len())));

    let merged = merge_tables(&args.tables, merger)?;
    let batch = args.select.apply(&merged);
    if batch.is_empty() {
        bail!(
            "Selection '{}' picked no claims out of {} merged rows",
            args.select,
            merged.len()
        );
    }
    info!("Selected {} of {} batch claims ({})", batch.len(), merged.len(), args.select);
    Ok((batch, corpus))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let merger = RecordMerger::new(config.clone());

    match cli.command {
        Command::Merge { tables, output } => {
            let merged = merge_tables(&tables, &merger)?;
            let batch = provider_risk::models::merged_to_record_batch(&merged)?;
            write_csv(&output, &[batch])
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} merged claims to {}", merged.len(), output.display());
        }
        Command::Features {
            batch,
            scaler,
            output,
        } => {
            let scaler = StandardScaler::from_json_file(&scaler)?;
            let engineer = FeatureEngineer::new(config, scaler.frozen_schema())?;
            let (records, corpus) = prepare(&batch, &merger)?;

            let pb = create_spinner(Some("Engineering features"));
            let matrix = engineer.engineer(&records, &corpus)?;
            finish_and_clear(&pb);

            write_csv(&output, &[matrix.to_record_batch()?])
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {} feature rows x {} columns to {}",
                matrix.len(),
                matrix.column_names().len(),
                output.display()
            );
        }
        Command::Score {
            batch,
            scaler,
            model,
            output,
        } => {
            let pipeline = FraudPipeline::from_artifacts(config, &ArtifactConfig::new(scaler, model))?;
            let (records, corpus) = prepare(&batch, &merger)?;

            let start = Instant::now();
            let pb = create_spinner(Some("Scoring claims"));
            let predictions = pipeline.predict(&records, &corpus)?;
            finish_and_clear(&pb);

            match output {
                Some(path) => {
                    write_csv(&path, &[predictions_to_record_batch(&predictions)?])
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Wrote {} predictions to {}", predictions.len(), path.display());
                }
                None => {
                    println!("ClaimID,Provider,PredictedFraud");
                    for p in &predictions {
                        println!("{},{},{}", p.claim_id, p.provider, p.predicted_fraud);
                    }
                }
            }
            info!("Scored {} claims in {:?}", predictions.len(), start.elapsed());
        }
    }

    Ok(())
}
