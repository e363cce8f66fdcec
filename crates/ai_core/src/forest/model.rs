//! Bagged regression forest
//!
//! The forest prediction is the plain mean of its trees. Individual tree
//! outputs are exposed so callers can measure ensemble spread.

use serde::{Deserialize, Serialize};

use super::tree::Tree;
use super::ForestParams;
use crate::errors::{CoreError, Result};
use crate::stats::std_dev;

/// Random forest regressor over transformed feature rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Fitted trees
    pub trees: Vec<Tree>,

    /// Width of the rows the trees were fitted on
    pub feature_count: usize,

    /// Parameters the forest was trained with
    pub params: ForestParams,
}

impl RandomForest {
    pub fn new(trees: Vec<Tree>, feature_count: usize, params: ForestParams) -> Self {
        Self {
            trees,
            feature_count,
            params,
        }
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Check every tree against the recorded row width
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(CoreError::InvalidModel("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count)
                .map_err(|e| CoreError::InvalidModel(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.feature_count {
            return Err(CoreError::Shape(format!(
                "row has {} features, forest expects {}",
                row.len(),
                self.feature_count
            )));
        }
        Ok(())
    }

    /// Mean prediction for one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let members = self.member_predictions_row(row)?.ok_or_else(|| {
            CoreError::InvalidModel("cannot predict with an empty forest".to_string())
        })?;
        Ok(members.iter().sum::<f64>() / members.len() as f64)
    }

    /// Mean prediction for each row
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Per-tree predictions for one row, `None` when the forest has no trees
    pub fn member_predictions_row(&self, row: &[f64]) -> Result<Option<Vec<f64>>> {
        self.check_width(row)?;
        if self.trees.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.trees.iter().map(|t| t.evaluate(row)).collect()))
    }

    /// Spread of tree predictions for each row, `None` when estimator-level
    /// predictions are unavailable.
    pub fn prediction_std(&self, rows: &[Vec<f64>]) -> Result<Option<Vec<f64>>> {
        let mut stds = Vec::with_capacity(rows.len());
        for row in rows {
            match self.member_predictions_row(row)? {
                Some(members) => stds.push(std_dev(&members).unwrap_or(0.0)),
                None => return Ok(None),
            }
        }
        Ok(Some(stds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::Node;

    fn forest() -> RandomForest {
        let low = Tree::new(vec![
            Node::internal(0, 0.0, 1, 2, 4),
            Node::leaf(1.0, 2),
            Node::leaf(3.0, 2),
        ]);
        let high = Tree::new(vec![Node::leaf(5.0, 4)]);
        RandomForest::new(vec![low, high], 2, ForestParams::default())
    }

    #[test]
    fn test_mean_of_trees() {
        let forest = forest();
        assert_eq!(forest.predict_row(&[-1.0, 0.0]).unwrap(), 3.0);
        assert_eq!(forest.predict_row(&[1.0, 0.0]).unwrap(), 4.0);
        assert_eq!(
            forest.member_predictions_row(&[1.0, 0.0]).unwrap(),
            Some(vec![3.0, 5.0])
        );
    }

    #[test]
    fn test_prediction_std() {
        let forest = forest();
        let stds = forest
            .prediction_std(&[vec![-1.0, 0.0], vec![1.0, 0.0]])
            .unwrap()
            .unwrap();
        assert_eq!(stds, vec![2.0, 1.0]);
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        assert!(forest().predict_row(&[1.0]).is_err());
    }

    #[test]
    fn test_empty_forest() {
        let empty = RandomForest::new(vec![], 2, ForestParams::default());
        assert!(empty.validate().is_err());
        assert!(empty.predict_row(&[0.0, 0.0]).is_err());
        assert_eq!(empty.prediction_std(&[vec![0.0, 0.0]]).unwrap(), None);
    }
}
