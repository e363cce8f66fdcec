//! Error types for the AgriSense core crate

use thiserror::Error;

/// Errors that can occur while loading data, fitting transformers or
/// handling model artifacts.
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Binary artifact (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column required by a fitted transformer is absent from the input
    #[error("Column '{0}' is missing from the input frame")]
    MissingColumn(String),

    /// Frame has no rows where at least one is required
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Columns or rows do not line up
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// Model structure failed validation
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Persisted artifact does not match its recorded digest
    #[error("Artifact integrity check failed: expected {expected}, found {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
