use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::elastic_net::{ElasticNet, ElasticNetParameters};

use crate::error::{PipelineError, Result};

/// Candidate regressors. Hyperparameters are fixed; the workflow selects
/// among candidates by cross-validated RMSE but does not tune them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    RandomForest,
    ElasticNet,
}

impl ModelKind {
    pub fn all() -> [ModelKind; 2] {
        [ModelKind::RandomForest, ModelKind::ElasticNet]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "RandomForest",
            ModelKind::ElasticNet => "ElasticNet",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize)]
pub enum FittedRegressor {
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    ElasticNet(ElasticNet<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

impl FittedRegressor {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedRegressor::RandomForest(_) => ModelKind::RandomForest,
            FittedRegressor::ElasticNet(_) => ModelKind::ElasticNet,
        }
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let x = to_matrix(rows)?;
        let predicted = match self {
            FittedRegressor::RandomForest(model) => model.predict(&x),
            FittedRegressor::ElasticNet(model) => model.predict(&x),
        };
        predicted
            .map_err(|err| PipelineError::Training(format!("{} predict failed: {err}", self.kind())))
    }
}

/// Fits one candidate. The seed is threaded explicitly into every
/// randomized estimator; nothing reads ambient process-wide state.
pub fn fit(kind: ModelKind, rows: &[Vec<f64>], targets: &[f64], seed: u64) -> Result<FittedRegressor> {
    if rows.is_empty() || rows.len() != targets.len() {
        return Err(PipelineError::Training(format!(
            "feature/target mismatch: {} feature rows, {} targets",
            rows.len(),
            targets.len()
        )));
    }

    let x = to_matrix(rows)?;
    let y = targets.to_vec();

    match kind {
        ModelKind::RandomForest => {
            let parameters = RandomForestRegressorParameters {
                max_depth: None,
                min_samples_leaf: 1,
                min_samples_split: 2,
                n_trees: 700,
                m: Some(3),
                keep_samples: false,
                seed,
            };
            let model = RandomForestRegressor::fit(&x, &y, parameters)
                .map_err(|err| PipelineError::Training(format!("RandomForest fit failed: {err}")))?;
            Ok(FittedRegressor::RandomForest(model))
        }
        ModelKind::ElasticNet => {
            let parameters = ElasticNetParameters::default()
                .with_alpha(0.1)
                .with_l1_ratio(0.5)
                .with_max_iter(5000);
            let model = ElasticNet::fit(&x, &y, parameters)
                .map_err(|err| PipelineError::Training(format!("ElasticNet fit failed: {err}")))?;
            Ok(FittedRegressor::ElasticNet(model))
        }
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n_samples = rows.len();
    let n_features = rows.first().map(Vec::len).unwrap_or(0);

    let mut flat_data = Vec::with_capacity(n_samples * n_features);
    for row in rows {
        if row.len() != n_features {
            return Err(PipelineError::Training(
                "all feature rows must have the same length".to_string(),
            ));
        }
        flat_data.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat_data, false))
}
