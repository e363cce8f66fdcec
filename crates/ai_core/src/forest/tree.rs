//! Regression tree structure and traversal
//!
//! Trees are stored as a flat node vector with node 0 as the root. Internal
//! nodes route a row left when `row[feature] <= threshold`.

use serde::{Deserialize, Serialize};

/// A regression tree node (internal or leaf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Feature column to split on (ignored for leaves)
    pub feature: u32,

    /// Split threshold (ignored for leaves)
    pub threshold: f64,

    /// Left child index
    pub left: u32,

    /// Right child index
    pub right: u32,

    /// Leaf prediction (`Some` only for leaves)
    pub value: Option<f64>,

    /// Number of training samples that reached this node
    pub samples: u32,
}

impl Node {
    pub fn internal(feature: u32, threshold: f64, left: u32, right: u32, samples: u32) -> Self {
        Self {
            feature,
            threshold,
            left,
            right,
            value: None,
            samples,
        }
    }

    pub fn leaf(value: f64, samples: u32) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
            samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }
}

/// A single regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a transformed feature row.
    ///
    /// Assumes the tree passed [`Tree::validate`] for the row width.
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if let Some(value) = node.value {
                return value;
            }
            let x = row.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if x <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Depth of the deepest leaf (a lone root leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure against the expected row width
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                continue;
            }
            // Children are always appended after their parent, which also
            // rules out cycles.
            for (side, child) in [("left", node.left), ("right", node.right)] {
                let child = child as usize;
                if child <= i || child >= self.nodes.len() {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
            }
            if node.feature as usize >= feature_count {
                return Err(format!(
                    "node {i} splits on feature {} but rows have {feature_count}",
                    node.feature
                ));
            }
            if !node.threshold.is_finite() {
                return Err(format!("node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(vec![
            Node::internal(0, 0.5, 1, 2, 4),
            Node::leaf(10.0, 2),
            Node::leaf(20.0, 2),
        ])
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0.1]), 10.0);
        assert_eq!(tree.evaluate(&[0.5]), 10.0); // equal goes left
        assert_eq!(tree.evaluate(&[0.9]), 20.0);
    }

    #[test]
    fn test_depth_and_leaves() {
        assert_eq!(stump().depth(), 1);
        assert_eq!(stump().leaf_count(), 2);
        assert_eq!(Tree::new(vec![Node::leaf(1.0, 1)]).depth(), 0);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1).is_ok());
        assert!(stump().validate(0).is_err());

        let bad_child = Tree::new(vec![
            Node::internal(0, 0.5, 5, 2, 4),
            Node::leaf(10.0, 2),
            Node::leaf(20.0, 2),
        ]);
        assert!(bad_child.validate(1).is_err());

        let cycle = Tree::new(vec![Node::internal(0, 0.5, 0, 0, 1)]);
        assert!(cycle.validate(1).is_err());

        assert!(Tree::default().validate(1).is_err());
    }
}
