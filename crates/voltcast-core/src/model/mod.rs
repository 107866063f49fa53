use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::schema::FEATURE_ORDER;

pub mod artifact;
pub mod regressors;
pub mod scaler;

pub use artifact::{ArtifactMetadata, ModelArtifact};
pub use regressors::ModelKind;

use regressors::FittedRegressor;
use scaler::FeatureScaler;

/// Leading features that receive median-impute + min-max scaling (the five
/// weather readings); calendar features pass through.
const SCALED_FEATURE_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Target consumption column.
    pub target: String,
    /// Temporal train/test split ratio; the tail is held out.
    pub train_ratio: f64,
    /// Contiguous cross-validation folds over the training partition.
    pub folds: usize,
    /// Seed threaded into every randomized estimator.
    pub seed: u64,
    pub feature_range: (f64, f64),
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            target: "PowerConsumption_Zone2".to_string(),
            train_ratio: 0.8,
            folds: 5,
            seed: 42,
            feature_range: (1.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub model: ModelKind,
    pub rmse_mean: f64,
    pub rmse_std: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub scores: Vec<CandidateScore>,
    pub best: ModelKind,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test: RegressionMetrics,
}

/// Cross-validates every candidate on the training partition, refits the
/// winner, and evaluates it on the held-out tail.
pub fn train_and_select(
    df: &DataFrame,
    options: &TrainingOptions,
) -> Result<(ModelArtifact, TrainingReport)> {
    let (features, targets) = prepare_matrix(df, &options.target)?;

    let n = features.len();
    let split = (n as f64 * options.train_ratio) as usize;
    if split == 0 || split >= n {
        return Err(PipelineError::Training(format!(
            "cannot split {n} rows with train ratio {}",
            options.train_ratio
        )));
    }

    let (x_train, x_test) = features.split_at(split);
    let (y_train, y_test) = targets.split_at(split);

    let mut scores = Vec::new();
    for kind in ModelKind::all() {
        let (rmse_mean, rmse_std) = cross_validate(kind, x_train, y_train, options)?;
        info!(model = kind.name(), rmse_mean, rmse_std, "cross-validation complete");
        scores.push(CandidateScore {
            model: kind,
            rmse_mean,
            rmse_std,
        });
    }
    scores.sort_by(|a, b| a.rmse_mean.total_cmp(&b.rmse_mean));
    let best = scores[0].model;

    let (feature_scaler, regressor) = fit_pipeline(best, x_train, y_train, options)?;
    let predicted = predict_pipeline(&feature_scaler, &regressor, x_test)?;
    let test = regression_metrics(y_test, &predicted);
    info!(
        model = best.name(),
        test_rmse = test.rmse,
        test_rows = x_test.len(),
        "selected model evaluated on held-out tail"
    );

    let metadata = ArtifactMetadata {
        model: best,
        target: options.target.clone(),
        feature_names: FEATURE_ORDER.iter().map(|name| name.to_string()).collect(),
        seed: options.seed,
        test_rmse: test.rmse,
        trained_at: Utc::now(),
    };
    let artifact = ModelArtifact::new(metadata, feature_scaler, regressor);
    let report = TrainingReport {
        scores,
        best,
        train_rows: split,
        test_rows: n - split,
        test,
    };

    Ok((artifact, report))
}

/// Extracts the feature matrix (in the canonical feature order) and the
/// target vector. A missing value here means the table did not come through
/// the pipeline's drop-gates and is an error, not something to impute.
fn prepare_matrix(df: &DataFrame, target: &str) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let height = df.height();
    let mut rows = vec![Vec::with_capacity(FEATURE_ORDER.len()); height];

    for name in FEATURE_ORDER {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::MissingColumn {
                column: name.to_string(),
            })?
            .cast(&DataType::Float64)?;
        let values = column.f64()?;
        for (idx, row) in rows.iter_mut().enumerate() {
            let value = values.get(idx).ok_or_else(|| {
                PipelineError::Training(format!("missing value in feature column '{name}'"))
            })?;
            row.push(value);
        }
    }

    let column = df
        .column(target)
        .map_err(|_| PipelineError::MissingColumn {
            column: target.to_string(),
        })?
        .cast(&DataType::Float64)?;
    let values = column.f64()?;
    let mut targets = Vec::with_capacity(height);
    for idx in 0..height {
        let value = values.get(idx).ok_or_else(|| {
            PipelineError::Training(format!("missing value in target column '{target}'"))
        })?;
        targets.push(value);
    }

    Ok((rows, targets))
}

fn cross_validate(
    kind: ModelKind,
    features: &[Vec<f64>],
    targets: &[f64],
    options: &TrainingOptions,
) -> Result<(f64, f64)> {
    let n = features.len();
    if options.folds < 2 || n < options.folds * 2 {
        return Err(PipelineError::Training(format!(
            "{n} training rows are not enough for {} folds",
            options.folds
        )));
    }

    let mut fold_rmse = Vec::with_capacity(options.folds);
    for fold in 0..options.folds {
        let start = fold * n / options.folds;
        let end = (fold + 1) * n / options.folds;

        let mut x_fit: Vec<Vec<f64>> = Vec::with_capacity(n - (end - start));
        let mut y_fit: Vec<f64> = Vec::with_capacity(n - (end - start));
        for idx in (0..n).filter(|idx| *idx < start || *idx >= end) {
            x_fit.push(features[idx].clone());
            y_fit.push(targets[idx]);
        }

        let (feature_scaler, regressor) = fit_pipeline(kind, &x_fit, &y_fit, options)?;
        let predicted = predict_pipeline(&feature_scaler, &regressor, &features[start..end])?;
        fold_rmse.push(regression_metrics(&targets[start..end], &predicted).rmse);
    }

    let mean = fold_rmse.iter().sum::<f64>() / fold_rmse.len() as f64;
    let variance = fold_rmse
        .iter()
        .map(|rmse| (rmse - mean).powi(2))
        .sum::<f64>()
        / fold_rmse.len() as f64;
    Ok((mean, variance.sqrt()))
}

fn fit_pipeline(
    kind: ModelKind,
    features: &[Vec<f64>],
    targets: &[f64],
    options: &TrainingOptions,
) -> Result<(FeatureScaler, FittedRegressor)> {
    let feature_scaler = FeatureScaler::fit(features, SCALED_FEATURE_COUNT, options.feature_range);
    let scaled = feature_scaler.transform_matrix(features);
    let regressor = regressors::fit(kind, &scaled, targets, options.seed)?;
    Ok((feature_scaler, regressor))
}

fn predict_pipeline(
    feature_scaler: &FeatureScaler,
    regressor: &FittedRegressor,
    features: &[Vec<f64>],
) -> Result<Vec<f64>> {
    let scaled = feature_scaler.transform_matrix(features);
    regressor.predict(&scaled)
}

pub(crate) fn regression_metrics(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    let n = actual.len().max(1) as f64;
    let mut squared = 0.0;
    let mut absolute = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        squared += (a - p).powi(2);
        absolute += (a - p).abs();
    }

    let mean = actual.iter().sum::<f64>() / n;
    let total = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>();
    let r2 = if total == 0.0 {
        0.0
    } else {
        1.0 - squared / total
    };

    RegressionMetrics {
        rmse: (squared / n).sqrt(),
        mae: absolute / n,
        r2,
    }
}
