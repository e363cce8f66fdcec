//! Random forest trainer
//!
//! Each tree is grown on its own bootstrap sample. Tree seeds are derived
//! from the run seed and the tree index, so the fitted forest does not
//! depend on how rayon schedules the work.

use agrisense_ai_core::{ForestParams, RandomForest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cart::{CartBuilder, TreeConfig};
use crate::errors::TrainerError;

/// Fits a [`RandomForest`] on transformed feature rows
pub struct ForestTrainer {
    params: ForestParams,
    seed: u64,
}

impl ForestTrainer {
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self { params, seed }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Seed for tree `index`, decorrelated with a SplitMix64 finalizer
    fn tree_seed(&self, index: usize) -> u64 {
        let mut z = self
            .seed
            .wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Train the forest
    pub fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<RandomForest, TrainerError> {
        self.params.validate()?;

        if features.is_empty() {
            return Err(TrainerError::Training(
                "cannot fit a forest on zero rows".to_string(),
            ));
        }
        if features.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let feature_count = features[0].len();
        if let Some(row) = features.iter().position(|r| r.len() != feature_count) {
            return Err(TrainerError::Training(format!(
                "row {row} has {} features, expected {feature_count}",
                features[row].len()
            )));
        }
        if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
            return Err(TrainerError::Training(format!(
                "target at row {row} is not finite"
            )));
        }

        info!(
            "Growing {} trees (max_depth={:?}, min_samples_leaf={}) on {} rows x {} features",
            self.params.n_estimators,
            self.params.max_depth,
            self.params.min_samples_leaf,
            features.len(),
            feature_count
        );

        let config = TreeConfig::from(&self.params);
        let n = features.len();

        let trees = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|index| {
                let sample: Vec<usize> = if self.params.bootstrap {
                    let mut rng = StdRng::seed_from_u64(self.tree_seed(index));
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let tree = CartBuilder::new(features, targets, config.clone()).build(&sample);
                debug!(
                    "Tree {}: {} nodes, depth {}",
                    index,
                    tree.nodes.len(),
                    tree.depth()
                );
                tree
            })
            .collect();

        Ok(RandomForest::new(trees, feature_count, self.params.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets: Vec<f64> = (0..n).map(|i| 2.0 * i as f64 + 1.0).collect();
        (features, targets)
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 8,
            max_depth: Some(6),
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_fit_shapes() {
        let (features, targets) = linear_data(50);
        let forest = ForestTrainer::new(small_params(), 42)
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(forest.n_estimators(), 8);
        assert_eq!(forest.feature_count, 2);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (features, targets) = linear_data(40);
        let a = ForestTrainer::new(small_params(), 42).fit(&features, &targets).unwrap();
        let b = ForestTrainer::new(small_params(), 42).fit(&features, &targets).unwrap();
        assert_eq!(a, b);

        let c = ForestTrainer::new(small_params(), 7).fit(&features, &targets).unwrap();
        assert_ne!(a.trees, c.trees);
    }

    #[test]
    fn test_fits_training_signal() {
        let (features, targets) = linear_data(60);
        let forest = ForestTrainer::new(small_params(), 1)
            .fit(&features, &targets)
            .unwrap();
        let pred = forest.predict_row(&[30.0, 0.0]).unwrap();
        assert!((pred - 61.0).abs() < 10.0, "prediction {pred} too far from 61");
    }

    #[test]
    fn test_without_bootstrap_trees_are_identical() {
        let (features, targets) = linear_data(20);
        let params = ForestParams {
            bootstrap: false,
            ..small_params()
        };
        let forest = ForestTrainer::new(params, 3).fit(&features, &targets).unwrap();
        assert!(forest.trees.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let trainer = ForestTrainer::new(small_params(), 0);
        assert!(trainer.fit(&[], &[]).is_err());
        assert!(trainer.fit(&[vec![1.0]], &[1.0, 2.0]).is_err());
        assert!(trainer.fit(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_err());
        assert!(trainer.fit(&[vec![1.0]], &[f64::NAN]).is_err());

        let bad = ForestTrainer::new(
            ForestParams {
                n_estimators: 0,
                ..ForestParams::default()
            },
            0,
        );
        assert!(bad.fit(&[vec![1.0]], &[1.0]).is_err());
    }
}
