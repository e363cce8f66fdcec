//! Random forest regression model
//!
//! - `tree`: flat regression tree nodes and traversal
//! - `model`: the bagged ensemble and its per-tree outputs
//!
//! Fitting lives in the trainer crate; this module only holds what the
//! predictor needs to replay a persisted forest.

pub mod model;
pub mod tree;

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

pub use model::RandomForest;
pub use tree::{Node, Tree};

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,

    /// Maximum tree depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,

    /// Draw a bootstrap sample for each tree
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: Some(12),
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    /// Return every problem with these parameters
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.n_estimators == 0 {
            problems.push("n_estimators must be at least 1".to_string());
        }
        if self.max_depth == Some(0) {
            problems.push("max_depth must be at least 1".to_string());
        }
        if self.min_samples_split < 2 {
            problems.push("min_samples_split must be at least 2".to_string());
        }
        if self.min_samples_leaf == 0 {
            problems.push("min_samples_leaf must be at least 1".to_string());
        }
        problems
    }

    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config(problems.join("; ")))
        }
    }
}
