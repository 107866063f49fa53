use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Workflow settings, loadable from a TOML file. Every field has a default
/// so a partial file (or none at all) works; CLI flags override on top.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub raw_filename: String,
    pub processed_filename: String,
    pub model_path: PathBuf,
    pub median_window: usize,
    pub drop_timestamp: bool,
    pub target: String,
    pub train_ratio: f64,
    pub folds: usize,
    pub seed: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            raw_filename: "power_tetouan_city_modified.csv".to_string(),
            processed_filename: "power_tetouan_city_processed.csv".to_string(),
            model_path: PathBuf::from("models/best_model.bin"),
            median_window: 25,
            drop_timestamp: true,
            target: "PowerConsumption_Zone2".to_string(),
            train_ratio: 0.8,
            folds: 5,
            seed: 42,
        }
    }
}

impl WorkflowConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.raw_dir.join(&self.raw_filename)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.processed_dir.join(&self.processed_filename)
    }
}
