//! Fitted preprocessing + forest pipeline

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};
use crate::forest::RandomForest;
use crate::frame::DataFrame;
use crate::preprocess::ColumnTransformer;

/// Preprocessor and regressor fitted together on the same training split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub preprocessor: ColumnTransformer,
    pub model: RandomForest,
}

impl FittedPipeline {
    pub fn new(preprocessor: ColumnTransformer, model: RandomForest) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    /// Both halves must agree on the transformed row width.
    pub fn validate(&self) -> Result<()> {
        let width = self.preprocessor.output_width();
        if width != self.model.feature_count {
            return Err(CoreError::InvalidModel(format!(
                "preprocessor emits {width} features but forest expects {}",
                self.model.feature_count
            )));
        }
        self.model.validate()
    }

    /// Input columns the pipeline reads, numeric first
    pub fn feature_names_in(&self) -> Vec<String> {
        self.preprocessor.input_columns()
    }

    /// Point predictions for every row of the frame
    pub fn predict(&self, frame: &DataFrame) -> Result<Vec<f64>> {
        let rows = self.preprocessor.transform(frame)?;
        self.model.predict(&rows)
    }

    /// Point prediction for a single-row frame
    pub fn predict_one(&self, frame: &DataFrame) -> Result<f64> {
        if frame.n_rows() != 1 {
            return Err(CoreError::Shape(format!(
                "expected a single row, got {}",
                frame.n_rows()
            )));
        }
        let rows = self.preprocessor.transform(frame)?;
        self.model.predict_row(&rows[0])
    }

    /// Per-tree predictions for a single-row frame
    pub fn member_predictions_one(&self, frame: &DataFrame) -> Result<Option<Vec<f64>>> {
        if frame.n_rows() != 1 {
            return Err(CoreError::Shape(format!(
                "expected a single row, got {}",
                frame.n_rows()
            )));
        }
        let rows = self.preprocessor.transform(frame)?;
        self.model.member_predictions_row(&rows[0])
    }
}
