use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cardio_io::{ArtifactWriter, Params, ProcessedReader, ProcessedWriter, RawTableReader};
use cardio_prep::{PreprocessResult, Schema};
use cardio_rf::{MetricsReport, RankedFeature, TrainingResult};

#[derive(Parser)]
#[command(name = "cardio")]
#[command(about = "Reproducible heart-disease risk pipeline: clean, engineer, split, scale, train, evaluate")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for tree training (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Parameter file shared by every stage.
#[derive(Args, Debug, Clone)]
struct ParamsArg {
    /// Path to the YAML parameter file
    #[arg(long, default_value = "params.yaml")]
    params: PathBuf,
}

/// Input and output of the preprocess stage.
#[derive(Args, Debug, Clone)]
struct PreprocessPaths {
    /// Raw heart CSV
    #[arg(long, default_value = "data/raw/heart.csv")]
    raw: PathBuf,

    /// Directory receiving X_train.csv, X_test.csv, y_train.csv, y_test.csv
    #[arg(long, default_value = "data/processed")]
    processed_dir: PathBuf,
}

/// Outputs of the train stage.
#[derive(Args, Debug, Clone)]
struct TrainPaths {
    /// Directory receiving model.bin and feature_importances.json
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// Directory receiving metrics.json
    #[arg(long, default_value = "metrics")]
    metrics_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Clean, engineer, split and scale the raw table into processed CSVs
    Preprocess {
        #[command(flatten)]
        params: ParamsArg,

        #[command(flatten)]
        paths: PreprocessPaths,
    },

    /// Train the forest on processed CSVs and evaluate it on the test half
    Train {
        #[command(flatten)]
        params: ParamsArg,

        /// Directory holding the processed CSVs
        #[arg(long, default_value = "data/processed")]
        processed_dir: PathBuf,

        #[command(flatten)]
        paths: TrainPaths,
    },

    /// Run preprocess then train in one process
    Run {
        #[command(flatten)]
        params: ParamsArg,

        #[command(flatten)]
        prep: PreprocessPaths,

        #[command(flatten)]
        train: TrainPaths,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct PreprocessOutput {
    n_input: usize,
    n_duplicates: usize,
    n_outliers: usize,
    n_train: usize,
    n_test: usize,
    n_features: usize,
    processed_dir: PathBuf,
}

#[derive(Serialize)]
struct TrainOutput {
    n_trees: usize,
    n_features: usize,
    n_train: usize,
    n_test: usize,
    total_nodes: usize,
    metrics: MetricsReport,
    top_features: Vec<RankedFeature>,
    model_path: PathBuf,
    metrics_path: PathBuf,
}

#[derive(Serialize)]
struct RunOutput {
    preprocess: PreprocessOutput,
    train: TrainOutput,
}

const TOP_FEATURES: usize = 5;

fn load_params(path: &Path) -> Result<Params> {
    Params::from_path(path).context("failed to load parameters")
}

fn preprocess(params: &Params, raw: &Path) -> Result<(PreprocessResult, String)> {
    let schema = Schema::heart();
    let target = schema.target().to_string();
    let table = RawTableReader::new(raw, schema)
        .read()
        .context("failed to read raw table")?;
    let config = params.preprocess_config()?;
    let result = config.fit(table).context("preprocessing failed")?;
    Ok((result, target))
}

fn train(
    params: &Params,
    train_x: &[Vec<f64>],
    train_y: &[usize],
    test_x: &[Vec<f64>],
    test_y: &[usize],
    feature_names: &[String],
) -> Result<(TrainingResult, MetricsReport)> {
    let config = params.forest_config()?;
    let result = config
        .fit(train_x, train_y, feature_names)
        .context("model training failed")?;
    let report = result
        .forest()
        .evaluate(test_x, test_y)
        .context("evaluation failed")?;
    Ok((result, report))
}

fn write_processed(result: &PreprocessResult, target: &str, dir: &Path) -> Result<PreprocessOutput> {
    ProcessedWriter::new(dir)?
        .write(result, target)
        .context("failed to write processed data")?;
    let report = &result.clean_report;
    Ok(PreprocessOutput {
        n_input: report.n_input,
        n_duplicates: report.n_duplicates,
        n_outliers: report.n_outliers,
        n_train: result.train.n_rows(),
        n_test: result.test.n_rows(),
        n_features: result.feature_names().len(),
        processed_dir: dir.to_path_buf(),
    })
}

fn write_artifacts(
    result: &TrainingResult,
    report: &MetricsReport,
    n_test: usize,
    paths: &TrainPaths,
) -> Result<TrainOutput> {
    let writer = ArtifactWriter::new(&paths.model_dir, &paths.metrics_dir)?;
    let forest = result.forest();
    let model_path = writer.write_model(forest).context("failed to save model")?;
    info!(path = %model_path.display(), "model saved");
    writer.write_importances(forest.n_trees(), result.importances())?;
    let metrics_path = writer.write_metrics(report)?;

    let metadata = result.metadata();
    Ok(TrainOutput {
        n_trees: metadata.n_estimators,
        n_features: metadata.n_features,
        n_train: metadata.n_samples,
        n_test,
        total_nodes: metadata.total_nodes,
        metrics: *report,
        top_features: result.importances().iter().take(TOP_FEATURES).cloned().collect(),
        model_path,
        metrics_path,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Preprocess { params, paths } => {
            let params = load_params(&params.params)?;
            let (result, target) = preprocess(&params, &paths.raw)?;
            let output = write_processed(&result, &target, &paths.processed_dir)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Train {
            params,
            processed_dir,
            paths,
        } => {
            let params = load_params(&params.params)?;
            let data = ProcessedReader::new(&processed_dir)
                .read()
                .context("failed to read processed data")?;
            let (result, report) = train(
                &params,
                &data.train_x,
                &data.train_y,
                &data.test_x,
                &data.test_y,
                &data.feature_names,
            )?;
            let output = write_artifacts(&result, &report, data.test_y.len(), &paths)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Run {
            params,
            prep,
            train: train_paths,
        } => {
            let params = load_params(&params.params)?;

            // Both stages finish before anything is written.
            let (prepared, target) = preprocess(&params, &prep.raw)?;
            let (result, report) = train(
                &params,
                prepared.train.rows(),
                prepared.train.labels(),
                prepared.test.rows(),
                prepared.test.labels(),
                prepared.feature_names(),
            )?;

            let output = RunOutput {
                preprocess: write_processed(&prepared, &target, &prep.processed_dir)?,
                train: write_artifacts(&result, &report, prepared.test.n_rows(), &train_paths)?,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
