use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{error, info};

use claim_risk::algorithm::classifier::train_detached;
use claim_risk::{
    ClassifierService, DiseaseCatalog, PipelineConfig, PipelineOutput, RiskPipeline,
    build_summaries, predict_members, read_claims, write_table,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[derive(Debug, Parser)]
#[command(
    name = "claim-risk",
    version,
    about = "Score patient risk from healthcare claims",
    long_about = "claim-risk turns a claim table into a per-patient risk summary.\n\n\
        Commands:\n  \
        score    Rule-based scoring only\n  \
        train    Train a classifier on rule-based labels and persist the bundle\n  \
        predict  Score with a persisted classifier bundle"
)]
struct Cli {
    /// JSON configuration file; missing keys keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the rule-based pipeline and write the patient summary
    Score(ScoreArgs),
    /// Train the risk classifier and persist the model bundle
    Train(TrainArgs),
    /// Predict risk with a persisted model bundle and write the patient summary
    Predict(PredictArgs),
}

#[derive(Debug, Args)]
struct ScoreArgs {
    /// Claim table (.csv or .parquet)
    claims: PathBuf,
    /// Summary output (.csv or .parquet)
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// Claim table (.csv or .parquet)
    claims: PathBuf,
    /// Directory the model bundle is written to
    #[arg(long)]
    bundle: PathBuf,
}

#[derive(Debug, Args)]
struct PredictArgs {
    /// Claim table (.csv or .parquet)
    claims: PathBuf,
    /// Directory holding a persisted model bundle
    #[arg(long)]
    bundle: PathBuf,
    /// Summary output (.csv or .parquet)
    #[arg(short, long)]
    output: PathBuf,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn run_pipeline(
    claims: &Path,
    catalog: &DiseaseCatalog,
    config: &PipelineConfig,
) -> anyhow::Result<PipelineOutput> {
    let rows = read_claims(claims)
        .with_context(|| format!("Failed to read claim table {}", claims.display()))?;
    Ok(RiskPipeline::new(catalog, config).run(&rows))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to configure the worker pool")?;
    info!("{config}");

    let start = Instant::now();
    let catalog = DiseaseCatalog::standard();

    match cli.command {
        Command::Score(args) => {
            let output = run_pipeline(&args.claims, &catalog, &config)?;
            let summaries = build_summaries(&output, &catalog, None);
            write_table(&args.output, &summaries)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;
        }
        Command::Train(args) => {
            // Fail on bad hyper-parameters before reading any data
            config.classifier.validate()?;
            let output = run_pipeline(&args.claims, &catalog, &config)?;
            let (rows, labels) = output.training_set();
            if rows.is_empty() {
                bail!("No labelled claim rows to train on");
            }
            let report = train_detached(config.classifier.clone(), rows, labels, args.bundle.clone())
                .await
                .context("Training task failed")?
                .with_context(|| format!("Failed to train bundle {}", args.bundle.display()))?;
            info!("Bundle written to {}", args.bundle.display());
            println!("{report}");
        }
        Command::Predict(args) => {
            // Load first so a mismatched bundle fails before any data is read
            let mut service = ClassifierService::new(config.classifier.clone());
            service
                .load(&args.bundle)
                .with_context(|| format!("Failed to load bundle {}", args.bundle.display()))?;

            let output = run_pipeline(&args.claims, &catalog, &config)?;
            let predictions = predict_members(&service, &output)?;
            let summaries = build_summaries(&output, &catalog, Some(&predictions));
            write_table(&args.output, &summaries)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;

            for failure in &predictions.failures {
                error!(
                    "Member {} claim {}: {}",
                    failure.member_id, failure.claim_id, failure.error
                );
            }
            if !predictions.failures.is_empty() {
                bail!(
                    "Prediction failed for {} members ({} claim rows); see PredictionError in {}",
                    predictions.failed_members().len(),
                    predictions.failures.len(),
                    args.output.display()
                );
            }
        }
    }

    info!("Finished in {:?}", start.elapsed());
    Ok(())
}
