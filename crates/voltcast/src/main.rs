use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voltcast_core::calendar_features::{assemble_prediction_row, WeatherObservation};
use voltcast_core::config::WorkflowConfig;
use voltcast_core::loader;
use voltcast_core::model::{self, ModelArtifact, TrainingOptions};
use voltcast_core::pipelines::{self, PreprocessOptions};
use voltcast_core::reproducibility;

#[derive(Parser, Debug)]
#[command(author, version, about = "Power consumption forecasting workflow", long_about = None)]
struct Cli {
    /// Path to a TOML workflow configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw dataset and write the processed table
    Preprocess(PreprocessArgs),
    /// Cross-validate the candidates, train the best one and save it
    Train(TrainArgs),
    /// Predict consumption for a single observation with a saved model
    Predict(PredictArgs),
    /// Train repeatedly with one seed and verify the runs agree
    Reproducibility(ReproducibilityArgs),
}

#[derive(Args, Debug, Default)]
struct PreprocessArgs {
    /// Override the rolling-median window size
    #[arg(long)]
    median_window: Option<usize>,
    /// Keep the timestamp column in the output
    #[arg(long)]
    keep_timestamp: bool,
}

#[derive(Args, Debug, Default)]
struct TrainArgs {
    /// Override the target consumption column
    #[arg(long)]
    target: Option<String>,
    /// Override the training seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Path to the saved model artifact (defaults to the configured one)
    #[arg(long)]
    model: Option<PathBuf>,
    #[arg(long)]
    temperature: f64,
    #[arg(long)]
    humidity: f64,
    #[arg(long)]
    wind_speed: f64,
    #[arg(long)]
    general_diffuse_flows: f64,
    #[arg(long)]
    diffuse_flows: f64,
    /// Observation timestamp, e.g. 2023-03-15T14:45:00
    #[arg(long)]
    timestamp: NaiveDateTime,
}

#[derive(Args, Debug)]
struct ReproducibilityArgs {
    /// How many identical training runs to compare
    #[arg(long, default_value_t = 2)]
    runs: usize,
    /// Maximum RMSE delta tolerated between runs
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
    /// Override the training seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Preprocess(args) => handle_preprocess(&config, args),
        Command::Train(args) => handle_train(&config, args),
        Command::Predict(args) => handle_predict(&config, args),
        Command::Reproducibility(args) => handle_reproducibility(&config, args),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<WorkflowConfig> {
    match path {
        Some(path) => WorkflowConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(WorkflowConfig::default()),
    }
}

fn handle_preprocess(config: &WorkflowConfig, args: PreprocessArgs) -> Result<()> {
    let raw_path = config.raw_path();
    let df = loader::read_raw_dataset(&raw_path)
        .with_context(|| format!("failed to read raw dataset from {}", raw_path.display()))?;

    let options = PreprocessOptions {
        median_window: args.median_window.unwrap_or(config.median_window),
        drop_timestamp: !args.keep_timestamp && config.drop_timestamp,
    };
    let output = pipelines::run_preprocessing(&df, &options)?;

    for stage in &output.stages {
        println!(
            "{:<22} {:>8} rows x {:>2} columns",
            stage.stage, stage.rows, stage.columns
        );
    }

    let processed_path = config.processed_path();
    let mut processed = output.dataframe;
    loader::write_processed_dataset(&mut processed, &processed_path).with_context(|| {
        format!(
            "failed to write processed dataset to {}",
            processed_path.display()
        )
    })?;
    println!("Processed dataset written to {}", processed_path.display());

    Ok(())
}

fn training_options(config: &WorkflowConfig, target: Option<String>, seed: Option<u64>) -> TrainingOptions {
    TrainingOptions {
        target: target.unwrap_or_else(|| config.target.clone()),
        train_ratio: config.train_ratio,
        folds: config.folds,
        seed: seed.unwrap_or(config.seed),
        ..TrainingOptions::default()
    }
}

fn handle_train(config: &WorkflowConfig, args: TrainArgs) -> Result<()> {
    let processed_path = config.processed_path();
    let df = loader::read_processed_dataset(&processed_path).with_context(|| {
        format!(
            "failed to read processed dataset from {}",
            processed_path.display()
        )
    })?;

    let options = training_options(config, args.target, args.seed);
    let (artifact, report) = model::train_and_select(&df, &options)?;

    let mut table = Table::new();
    table.set_header(vec!["Model", "RMSE (mean)", "RMSE (std)"]);
    for score in &report.scores {
        table.add_row(vec![
            score.model.name().to_string(),
            format!("{:.4}", score.rmse_mean),
            format!("{:.4}", score.rmse_std),
        ]);
    }
    println!("{table}");

    println!(
        "Best model: {} (train {} rows, test {} rows)",
        report.best, report.train_rows, report.test_rows
    );
    println!(
        "Test RMSE: {:.4}  MAE: {:.4}  R2: {:.4}",
        report.test.rmse, report.test.mae, report.test.r2
    );

    artifact
        .save(&config.model_path)
        .with_context(|| format!("failed to save model to {}", config.model_path.display()))?;
    info!(path = %config.model_path.display(), "model artifact saved");
    println!("Model saved to {}", config.model_path.display());

    Ok(())
}

fn handle_predict(config: &WorkflowConfig, args: PredictArgs) -> Result<()> {
    let model_path = args.model.unwrap_or_else(|| config.model_path.clone());
    let artifact = ModelArtifact::load(&model_path)
        .with_context(|| format!("failed to load model from {}", model_path.display()))?;

    let observation = WeatherObservation {
        temperature: args.temperature,
        humidity: args.humidity,
        wind_speed: args.wind_speed,
        general_diffuse_flows: args.general_diffuse_flows,
        diffuse_flows: args.diffuse_flows,
    };
    let features = assemble_prediction_row(&observation, args.timestamp)?;
    let predicted = artifact.predict_frame(&features)?;
    let value = predicted
        .first()
        .context("model returned no prediction")?;

    println!("Predicted {}: {:.3}", artifact.metadata.target, value);

    Ok(())
}

fn handle_reproducibility(config: &WorkflowConfig, args: ReproducibilityArgs) -> Result<()> {
    let processed_path = config.processed_path();
    let df = loader::read_processed_dataset(&processed_path).with_context(|| {
        format!(
            "failed to read processed dataset from {}",
            processed_path.display()
        )
    })?;
    let data_hash = loader::hash_file(&processed_path)?;

    let options = training_options(config, None, args.seed);
    let report =
        reproducibility::verify_reproducibility(&df, &options, args.runs, args.tolerance, data_hash)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.reproducible {
        anyhow::bail!(
            "training runs disagree: max RMSE delta {} exceeds tolerance {}",
            report.max_rmse_delta,
            args.tolerance
        );
    }

    Ok(())
}
