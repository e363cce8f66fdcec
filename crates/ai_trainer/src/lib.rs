//! AgriSense AI Trainer - Random forest yield model trainer
//!
//! Picks a target column, partitions the remaining columns into numeric
//! and categorical features, fits a preprocessing + random forest pipeline
//! and persists it with a JSON summary for the prediction service.

pub mod cart;
pub mod config;
pub mod errors;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod split;
pub mod target;
pub mod trainer;

use std::path::Path;

pub use config::TrainerConfig;
pub use errors::TrainerError;
pub use features::{FeaturePartition, FeaturePartitioner};
pub use forest::ForestTrainer;
pub use metrics::{confidence_from_std, Evaluation, Uncertainty};
pub use target::{TargetResolver, TargetSelection, TargetStrategy};
pub use trainer::{TrainingReport, YieldTrainer};

/// Train from `path` with otherwise default settings, writing the artifacts
/// to `model_dir`.
pub fn train_model_from_csv(path: &Path, model_dir: &Path) -> Result<TrainingReport, TrainerError> {
    let config = TrainerConfig {
        csv: path.to_path_buf(),
        model_dir: model_dir.to_path_buf(),
        ..TrainerConfig::default()
    };
    YieldTrainer::new(config).run()
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
