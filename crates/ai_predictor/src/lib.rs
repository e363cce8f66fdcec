//! AgriSense AI Predictor
//!
//! Replays a persisted yield model on one JSON record at a time:
//! - `row`: request parsing and feature row construction
//! - `features`: where the expected feature list comes from
//! - `service`: the loaded model and the prediction entry point

pub mod errors;
pub mod features;
pub mod row;
pub mod service;

pub use errors::PredictorError;
pub use features::{FeatureSource, ModelFeatureNames, SummaryFeatureNames};
pub use row::{build_row, parse_input, to_frame};
pub use service::{PredictionOutput, PredictionService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
