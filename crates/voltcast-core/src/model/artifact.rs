use std::path::Path;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::model::regressors::{FittedRegressor, ModelKind};
use crate::model::scaler::FeatureScaler;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model: ModelKind,
    pub target: String,
    pub feature_names: Vec<String>,
    pub seed: u64,
    pub test_rmse: f64,
    pub trained_at: DateTime<Utc>,
}

/// The serialized trained-model artifact: scaler state, fitted regressor and
/// enough metadata to audit how it was produced. Features are consumed
/// positionally, so callers must assemble columns in the training order.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    scaler: FeatureScaler,
    regressor: FittedRegressor,
}

impl ModelArtifact {
    pub(crate) fn new(
        metadata: ArtifactMetadata,
        scaler: FeatureScaler,
        regressor: FittedRegressor,
    ) -> Self {
        Self {
            metadata,
            scaler,
            regressor,
        }
    }

    /// Predicts from a feature table whose columns are read by position.
    /// Only the column count is checked; ordering is the caller's contract.
    pub fn predict_frame(&self, features: &DataFrame) -> Result<Vec<f64>> {
        let expected = self.metadata.feature_names.len();
        if features.width() != expected {
            return Err(PipelineError::Training(format!(
                "feature table has {} columns, model expects {expected}",
                features.width()
            )));
        }

        let mut rows = vec![Vec::with_capacity(expected); features.height()];
        for column in features.get_columns() {
            let cast = column.cast(&DataType::Float64)?;
            let values = cast.f64()?;
            for (idx, row) in rows.iter_mut().enumerate() {
                row.push(values.get(idx).unwrap_or(f64::NAN));
            }
        }

        self.predict_rows(&rows)
    }

    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let scaled = self.scaler.transform_matrix(rows);
        self.regressor.predict(&scaled)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(PipelineError::MissingResource(parent.to_path_buf()));
            }
        }
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingResource(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}
