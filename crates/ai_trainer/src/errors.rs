use agrisense_ai_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the yield trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("CSV file not found at: {}", .0.display())]
    CsvNotFound(PathBuf),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("could not auto-detect a target column; available columns: {}", .available.join(", "))]
    NoTarget { available: Vec<String> },

    #[error("target column '{0}' has no numeric values")]
    EmptyTarget(String),

    #[error("no usable feature columns besides target '{0}'")]
    NoFeatures(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training error: {0}")]
    Training(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
