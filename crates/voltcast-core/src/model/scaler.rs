use serde::{Deserialize, Serialize};

use crate::stats;

/// Per-feature median imputation plus min-max scaling for the leading
/// weather features; trailing calendar features pass through unchanged.
/// Fitted on the training partition only and carried inside the artifact so
/// prediction applies the identical transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    scaled: usize,
    medians: Vec<f64>,
    mins: Vec<f64>,
    maxs: Vec<f64>,
    range: (f64, f64),
}

impl FeatureScaler {
    pub fn fit(rows: &[Vec<f64>], scaled: usize, range: (f64, f64)) -> Self {
        let mut medians = Vec::with_capacity(scaled);
        let mut mins = Vec::with_capacity(scaled);
        let mut maxs = Vec::with_capacity(scaled);

        for feature in 0..scaled {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.get(feature))
                .copied()
                .filter(|value| !value.is_nan())
                .collect();

            let median = stats::median(&values).unwrap_or(0.0);
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            medians.push(median);
            mins.push(if min.is_finite() { min } else { median });
            maxs.push(if max.is_finite() { max } else { median });
        }

        Self {
            scaled,
            medians,
            mins,
            maxs,
            range,
        }
    }

    pub fn transform_matrix(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(feature, value)| {
                if feature < self.scaled {
                    self.transform_value(feature, *value)
                } else {
                    *value
                }
            })
            .collect()
    }

    fn transform_value(&self, feature: usize, value: f64) -> f64 {
        let value = if value.is_nan() {
            self.medians[feature]
        } else {
            value
        };

        let span = self.maxs[feature] - self.mins[feature];
        if span == 0.0 {
            self.range.0
        } else {
            self.range.0 + (value - self.mins[feature]) / span * (self.range.1 - self.range.0)
        }
    }
}
