use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::{self, TrainingOptions};

#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub run: usize,
    pub model: &'static str,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReproducibilityReport {
    pub data_hash: String,
    pub seed: u64,
    pub runs: Vec<RunMetrics>,
    pub max_rmse_delta: f64,
    pub reproducible: bool,
}

/// Trains the same configuration repeatedly with the same explicit seed and
/// compares the held-out metrics across runs. With identical input data and
/// seeds the runs must agree to within `tolerance`.
pub fn verify_reproducibility(
    df: &DataFrame,
    options: &TrainingOptions,
    run_count: usize,
    tolerance: f64,
    data_hash: String,
) -> Result<ReproducibilityReport> {
    if run_count < 2 {
        return Err(PipelineError::Training(
            "reproducibility verification needs at least two runs".to_string(),
        ));
    }

    let mut runs = Vec::with_capacity(run_count);
    for run in 1..=run_count {
        let (_, report) = model::train_and_select(df, options)?;
        info!(run, rmse = report.test.rmse, "reproducibility run complete");
        runs.push(RunMetrics {
            run,
            model: report.best.name(),
            rmse: report.test.rmse,
            mae: report.test.mae,
            r2: report.test.r2,
        });
    }

    let mut max_rmse_delta: f64 = 0.0;
    for pair in runs.windows(2) {
        max_rmse_delta = max_rmse_delta.max((pair[0].rmse - pair[1].rmse).abs());
    }

    Ok(ReproducibilityReport {
        data_hash,
        seed: options.seed,
        reproducible: max_rmse_delta <= tolerance,
        max_rmse_delta,
        runs,
    })
}
