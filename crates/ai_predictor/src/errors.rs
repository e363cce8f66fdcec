use agrisense_ai_core::CoreError;
use thiserror::Error;

/// Errors returned by the prediction service.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("model unavailable: {0}")]
    Model(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
