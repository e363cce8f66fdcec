//! Feature partitioning
//!
//! Every column except the target is classified once, in header order:
//! blacklisted and all-null columns are dropped, numeric columns are kept as
//! continuous features, and text columns become categorical features only
//! when their cardinality is small enough.

use agrisense_ai_core::{Column, DataFrame};
use tracing::{debug, info};

/// Identifier/metadata names never used as features (compared lowercased)
pub const NON_FEATURE_COLUMNS: &[&str] = &[
    "id",
    "cid",
    "provider",
    "txhash",
    "timestamp",
    "time",
    "date",
    "name",
    "tokenuri",
];

/// Maximum distinct values for a text column to be one-hot encoded
pub const MAX_CATEGORICAL_CARDINALITY: usize = 30;

/// Why a column was left out of the feature set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Target,
    Blacklisted,
    AllNull,
    HighCardinality { unique: usize },
}

/// Role assigned to a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Dropped(DropReason),
}

/// Result of partitioning a frame's columns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeaturePartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub dropped: Vec<(String, DropReason)>,
}

impl FeaturePartition {
    /// Numeric then categorical, the order the pipeline consumes them
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits columns into numeric and categorical features
#[derive(Debug, Clone)]
pub struct FeaturePartitioner {
    pub max_cardinality: usize,
}

impl Default for FeaturePartitioner {
    fn default() -> Self {
        Self {
            max_cardinality: MAX_CATEGORICAL_CARDINALITY,
        }
    }
}

impl FeaturePartitioner {
    pub fn new(max_cardinality: usize) -> Self {
        Self { max_cardinality }
    }

    /// Decide the role of a single column
    pub fn classify(&self, column: &Column, target: &str) -> ColumnRole {
        if column.name() == target {
            return ColumnRole::Dropped(DropReason::Target);
        }
        if NON_FEATURE_COLUMNS.contains(&column.name().to_lowercase().as_str()) {
            return ColumnRole::Dropped(DropReason::Blacklisted);
        }
        if column.non_null_count() == 0 {
            return ColumnRole::Dropped(DropReason::AllNull);
        }
        if column.is_numeric() {
            return ColumnRole::Numeric;
        }
        let unique = column.n_unique();
        if unique <= self.max_cardinality {
            ColumnRole::Categorical
        } else {
            ColumnRole::Dropped(DropReason::HighCardinality { unique })
        }
    }

    pub fn partition(&self, frame: &DataFrame, target: &str) -> FeaturePartition {
        let mut out = FeaturePartition::default();

        for column in frame.columns() {
            let name = column.name().to_string();
            match self.classify(column, target) {
                ColumnRole::Numeric => out.numeric.push(name),
                ColumnRole::Categorical => out.categorical.push(name),
                ColumnRole::Dropped(reason) => {
                    match &reason {
                        DropReason::HighCardinality { unique } => info!(
                            "Skipping high-cardinality text column for now: {} (unique={})",
                            name, unique
                        ),
                        other => debug!("Excluding column {}: {:?}", name, other),
                    }
                    out.dropped.push((name, reason));
                }
            }
        }

        out
    }
}
