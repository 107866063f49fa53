use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::calendar_features;
use crate::error::Result;
use crate::median_imputer;
use crate::normalizer;
use crate::outlier_smoother;
use crate::schema;
use crate::timestamp_reconciler;

#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Window size for the outlier smoother's centered rolling median.
    pub median_window: usize,
    /// Remove the timestamp column after deriving calendar features.
    pub drop_timestamp: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            median_window: outlier_smoother::DEFAULT_MEDIAN_WINDOW,
            drop_timestamp: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub stage: &'static str,
    pub rows: usize,
    pub columns: usize,
}

pub struct PreprocessOutput {
    pub dataframe: DataFrame,
    pub stages: Vec<StageSummary>,
}

/// Runs the full cleaning pipeline strictly top to bottom. Malformed cells
/// degrade to missing and are resolved by imputation or eliminated by the
/// two drop-gates; the only hard failure is a missing required column.
pub fn run_preprocessing(df: &DataFrame, options: &PreprocessOptions) -> Result<PreprocessOutput> {
    schema::require_column(df, schema::TIMESTAMP_COLUMN)?;
    let numeric = schema::numeric_columns();
    for column in &numeric {
        schema::require_column(df, column)?;
    }

    let mut stages = Vec::new();

    let df = normalizer::normalize_numeric_columns(df, &numeric)?;
    record_stage(&mut stages, "numeric_normalizer", &df);

    let df = normalizer::drop_junk_column(&df, schema::JUNK_COLUMN)?;
    record_stage(&mut stages, "column_pruner", &df);

    let df = timestamp_reconciler::reconcile_timestamps(&df, schema::TIMESTAMP_COLUMN)?;
    record_stage(&mut stages, "timestamp_reconciler", &df);

    let df = median_imputer::impute_numeric_medians(&df)?;
    record_stage(&mut stages, "median_imputer", &df);

    let df = outlier_smoother::smooth_outliers(
        &df,
        schema::TIMESTAMP_COLUMN,
        options.median_window,
    )?;
    let df = drop_incomplete_rows(&df)?;
    record_stage(&mut stages, "outlier_smoother", &df);

    let df = calendar_features::derive_calendar_features(&df, schema::TIMESTAMP_COLUMN)?;
    record_stage(&mut stages, "calendar_features", &df);

    let df = drop_incomplete_rows(&df)?;
    let df = if options.drop_timestamp {
        calendar_features::drop_timestamp_column(&df)?
    } else {
        df
    };
    record_stage(&mut stages, "finalizer", &df);

    Ok(PreprocessOutput {
        dataframe: df,
        stages,
    })
}

/// Drop-gate: removes every row that still holds a missing value in any
/// column.
pub fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut complete = vec![true; df.height()];
    for column in df.get_columns() {
        let mask = column.as_materialized_series().is_not_null();
        for (idx, keep) in complete.iter_mut().enumerate() {
            if mask.get(idx) != Some(true) {
                *keep = false;
            }
        }
    }

    let keep: Vec<IdxSize> = complete
        .iter()
        .enumerate()
        .filter_map(|(idx, keep)| keep.then_some(idx as IdxSize))
        .collect();
    let idx = IdxCa::from_vec("idx".into(), keep);
    Ok(df.take(&idx)?)
}

fn record_stage(stages: &mut Vec<StageSummary>, stage: &'static str, df: &DataFrame) {
    info!(stage, rows = df.height(), columns = df.width(), "stage complete");
    stages.push(StageSummary {
        stage,
        rows: df.height(),
        columns: df.width(),
    });
}
