//! CART (Classification and Regression Tree) builder
//!
//! Grows a single regression tree with the squared-error criterion and an
//! exact-greedy search over midpoints between consecutive distinct values.

use agrisense_ai_core::{ForestParams, Node, Tree};

/// Nodes whose squared error falls below this are treated as pure
const PURITY_EPSILON: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig::from(&ForestParams::default())
    }
}

impl From<&ForestParams> for TreeConfig {
    fn from(params: &ForestParams) -> Self {
        Self {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            min_samples_leaf: params.min_samples_leaf.max(1),
        }
    }
}

/// Best split found for a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// Build a regression tree over a (possibly repeated) subset of rows
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    targets: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(features: &'a [Vec<f64>], targets: &'a [f64], config: TreeConfig) -> Self {
        assert_eq!(features.len(), targets.len());
        let feature_count = features.first().map(Vec::len).unwrap_or(0);
        Self {
            config,
            features,
            targets,
            feature_count,
        }
    }

    /// Build a tree from the given row indices. Repeated indices act as
    /// sample weights, which is how bootstrap samples are passed in.
    pub fn build(&self, sample: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        if sample.is_empty() {
            nodes.push(Node::leaf(0.0, 0));
        } else {
            self.build_node(sample.to_vec(), 0, &mut nodes);
        }
        Tree::new(nodes)
    }

    /// Recursively build tree nodes, returning the index of the new node
    fn build_node(&self, indices: Vec<usize>, depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current_idx = nodes.len() as u32;
        let n = indices.len();

        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, ss), &i| {
            let y = self.targets[i];
            (s + y, ss + y * y)
        });
        let mean = sum / n as f64;
        let sse = sum_sq - sum * mean;

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || sse <= PURITY_EPSILON * n as f64
        {
            nodes.push(Node::leaf(mean, n as u32));
            return current_idx;
        }

        let Some(split) = self.find_best_split(&indices, sum) else {
            nodes.push(Node::leaf(mean, n as u32));
            return current_idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][split.feature] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(
            split.feature as u32,
            split.threshold,
            0,
            0,
            n as u32,
        ));

        let left_idx = self.build_node(left, depth + 1, nodes);
        let right_idx = self.build_node(right, depth + 1, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Exact-greedy search maximizing `S_l²/n_l + S_r²/n_r`, which is
    /// equivalent to minimizing the children's total squared error.
    fn find_best_split(&self, indices: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf;
        let parent_score = total * total / n as f64;
        let mut best: Option<SplitCandidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in 0..self.feature_count {
            pairs.clear();
            pairs.extend(
                indices
                    .iter()
                    .map(|&i| (self.features[i][feature], self.targets[i])),
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            if pairs[0].0 == pairs[n - 1].0 {
                continue; // constant feature in this node
            }

            let mut left_sum = 0.0;
            for left_n in 1..n {
                left_sum += pairs[left_n - 1].1;
                if left_n < min_leaf || n - left_n < min_leaf {
                    continue;
                }
                let (lo, hi) = (pairs[left_n - 1].0, pairs[left_n].0);
                if lo == hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / left_n as f64
                    + right_sum * right_sum / (n - left_n) as f64;

                if best.map_or(true, |b| score > b.score) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi || !threshold.is_finite() {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best.filter(|b| b.score >= parent_score - PURITY_EPSILON * parent_score.abs().max(1.0))
    }
}
