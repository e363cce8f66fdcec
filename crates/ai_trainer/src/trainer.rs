//! Yield model training
//!
//! One run goes: load CSV → resolve target → drop rows without a numeric
//! target → partition features → split → fit preprocessor and forest →
//! evaluate → estimate confidence → persist the artifact and summary.
//! Nothing is written to the output directory until every earlier step
//! has succeeded.

use agrisense_ai_core::stats::mean;
use agrisense_ai_core::{
    ArtifactPaths, Column, ColumnTransformer, DataFrame, FittedPipeline, ModelArtifact,
    ModelMetrics, ModelSummary,
};
use std::fs;
use tracing::{debug, info, warn};

use crate::config::TrainerConfig;
use crate::errors::TrainerError;
use crate::features::{FeaturePartition, FeaturePartitioner};
use crate::forest::ForestTrainer;
use crate::metrics::{Evaluation, Uncertainty};
use crate::split::train_test_split;
use crate::target::{TargetResolver, TargetSelection};

/// Rows shown in the dataset preview log
const PREVIEW_ROWS: usize = 3;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub target: TargetSelection,
    pub partition: FeaturePartition,
    pub n_train: usize,
    pub n_test: usize,
    pub evaluation: Evaluation,
    pub uncertainty: Option<Uncertainty>,
    pub paths: ArtifactPaths,
    pub summary: ModelSummary,
}

/// Trains and persists the yield model
pub struct YieldTrainer {
    config: TrainerConfig,
    resolver: TargetResolver,
    partitioner: FeaturePartitioner,
}

impl YieldTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        let resolver = TargetResolver::with_min_numeric(config.min_numeric_values);
        let partitioner = FeaturePartitioner::new(config.max_cardinality);
        Self {
            config,
            resolver,
            partitioner,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Load the configured CSV
    pub fn load_dataset(&self) -> Result<DataFrame, TrainerError> {
        let path = &self.config.csv;
        if !path.is_file() {
            return Err(TrainerError::CsvNotFound(path.clone()));
        }
        info!("Loading dataset from: {}", path.display());
        let frame = DataFrame::from_csv(path)?;
        info!(
            "Loaded {} rows with {} columns",
            frame.n_rows(),
            frame.n_cols()
        );
        for line in frame.preview(PREVIEW_ROWS) {
            debug!("  {}", line);
        }
        Ok(frame)
    }

    /// Run the whole pipeline on the configured CSV
    pub fn run(&self) -> Result<TrainingReport, TrainerError> {
        self.config.validate()?;
        let frame = self.load_dataset()?;
        self.train(frame)
    }

    /// Run the pipeline on an already loaded frame
    pub fn train(&self, frame: DataFrame) -> Result<TrainingReport, TrainerError> {
        self.config.validate()?;
        if frame.is_empty() {
            return Err(TrainerError::Dataset("dataset has no rows".to_string()));
        }

        let target = self.resolver.resolve(&frame)?;
        let frame = coerce_target(frame, &target.column)?;

        let partition = self.partitioner.partition(&frame, &target.column);
        if partition.is_empty() {
            return Err(TrainerError::NoFeatures(target.column.clone()));
        }
        info!("Numeric features: {:?}", partition.numeric);
        info!("Categorical features (one-hot): {:?}", partition.categorical);

        let y = target_values(&frame, &target.column)?;
        let split = train_test_split(frame.n_rows(), self.config.test_size, self.config.random_state)?;
        let train_frame = frame.take_rows(&split.train);
        let test_frame = frame.take_rows(&split.test);
        let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();
        info!(
            "Training on {} rows, validating on {} rows...",
            y_train.len(),
            y_test.len()
        );

        let (preprocessor, x_train) =
            ColumnTransformer::fit_transform(&train_frame, &partition.numeric, &partition.categorical)?;
        let x_test = preprocessor.transform(&test_frame)?;
        debug!(
            "Transformed features: {:?}",
            preprocessor.feature_names_out()
        );

        let forest = ForestTrainer::new(self.config.forest.clone(), self.config.random_state)
            .fit(&x_train, &y_train)?;
        info!("Training complete.");

        let predictions = forest.predict(&x_test)?;
        let evaluation = Evaluation::compute(&y_test, &predictions);
        info!(
            "Metrics: R2={:.4} RMSE={:.4} MAE={:.4}",
            evaluation.r2, evaluation.rmse, evaluation.mae
        );

        let y_train_mean = mean(&y_train).unwrap_or(0.0);
        let uncertainty = match forest.prediction_std(&x_test) {
            Ok(Some(stds)) => Some(Uncertainty::from_stds(stds, y_train_mean)),
            Ok(None) => {
                warn!("Could not compute per-sample uncertainty: forest exposes no estimators");
                None
            }
            Err(err) => {
                warn!("Could not compute per-sample uncertainty from the ensemble: {}", err);
                None
            }
        };
        let avg_confidence = uncertainty.as_ref().and_then(Uncertainty::avg_confidence);
        if let Some(u) = &uncertainty {
            log_uncertainty(u);
        }

        let pipeline = FittedPipeline::new(preprocessor, forest);
        let artifact = ModelArtifact::new(
            pipeline,
            target.column.clone(),
            partition.numeric.clone(),
            partition.categorical.clone(),
            ModelMetrics {
                r2: evaluation.r2,
                rmse: evaluation.rmse,
                mae: evaluation.mae,
                avg_confidence,
            },
        );

        let paths = self.config.artifact_paths();
        fs::create_dir_all(&paths.dir).map_err(agrisense_ai_core::CoreError::from)?;
        let model_hash = artifact.save(&paths)?;
        info!("Saved model artifact to: {}", paths.model.display());

        let summary = ModelSummary::from_artifact(&artifact, frame.n_rows(), model_hash);
        summary.write(&paths.summary)?;
        info!("Wrote model summary to: {}", paths.summary.display());

        Ok(TrainingReport {
            target,
            partition,
            n_train: y_train.len(),
            n_test: y_test.len(),
            evaluation,
            uncertainty,
            paths,
            summary,
        })
    }
}

/// Replace the target with its numeric coercion and drop rows where it is
/// missing.
fn coerce_target(mut frame: DataFrame, target: &str) -> Result<DataFrame, TrainerError> {
    let values = frame
        .column(target)
        .map(Column::to_numeric)
        .ok_or_else(|| TrainerError::Dataset(format!("target column '{target}' disappeared")))?;

    let keep: Vec<bool> = values.iter().map(Option::is_some).collect();
    let kept = keep.iter().filter(|&&k| k).count();
    if kept == 0 {
        return Err(TrainerError::EmptyTarget(target.to_string()));
    }
    if kept < values.len() {
        info!(
            "Dropping {} rows without a numeric '{}' value",
            values.len() - kept,
            target
        );
    }

    frame.set_column(Column::numeric(target, values))?;
    Ok(frame.filter_rows(&keep))
}

fn target_values(frame: &DataFrame, target: &str) -> Result<Vec<f64>, TrainerError> {
    let column = frame
        .column(target)
        .ok_or_else(|| TrainerError::Dataset(format!("target column '{target}' disappeared")))?;
    column
        .to_numeric()
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| TrainerError::Dataset(format!("target missing at row {row}")))
        })
        .collect()
}

fn log_uncertainty(uncertainty: &Uncertainty) {
    if let Some(mean_std) = uncertainty.mean_std() {
        info!("Mean std across test set: {:.4}", mean_std);
    }
    let first: Vec<String> = uncertainty
        .confidences
        .iter()
        .take(5)
        .map(|c| format!("{c:.2}"))
        .collect();
    info!("Sample confidence (first 5): [{}]", first.join(", "));
    if let Some(avg) = uncertainty.avg_confidence() {
        info!("Average confidence: {:.2}%", avg);
    }
}
