use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Model serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("Source table has {found} columns, expected {expected_min} to {expected_max}")]
    ColumnCount {
        expected_min: usize,
        expected_max: usize,
        found: usize,
    },

    #[error("Missing file or directory: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("Training failed: {0}")]
    Training(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
