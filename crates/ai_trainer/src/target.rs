//! Target column detection
//!
//! The target is chosen by an ordered list of strategies; the first one that
//! returns a column wins. Each strategy can be exercised on its own.

use agrisense_ai_core::DataFrame;
use tracing::{debug, info};

use crate::errors::TrainerError;

/// Known yield column names, highest priority first (compared lowercased)
pub const TARGET_CANDIDATES: &[&str] = &[
    "estimated_yield_t_ha",
    "estimated_yield",
    "yield_t_ha",
    "yield",
    "yield_estimate",
    "predicted_yield",
    "target",
    "label",
    "y",
];

/// Identifier/metadata names never picked by the numeric fallback
pub const TARGET_BLACKLIST: &[&str] = &[
    "id",
    "cid",
    "provider",
    "txhash",
    "timestamp",
    "time",
    "date",
    "name",
];

/// Minimum numeric values a column needs for the numeric fallback
pub const MIN_NUMERIC_VALUES: usize = 30;

/// One way of picking a target column
pub trait TargetStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(&self, frame: &DataFrame) -> Option<String>;
}

/// Exact case-insensitive match against [`TARGET_CANDIDATES`], in list order
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateName;

impl TargetStrategy for CandidateName {
    fn name(&self) -> &'static str {
        "candidate-list"
    }

    fn select(&self, frame: &DataFrame) -> Option<String> {
        let names = frame.column_names();
        TARGET_CANDIDATES.iter().find_map(|cand| {
            // Later headers win on a case-insensitive collision, as with a
            // lowercase-keyed lookup table.
            names
                .iter()
                .rev()
                .find(|name| name.to_lowercase() == *cand)
                .cloned()
        })
    }
}

/// First column whose name contains "yield" and holds any numeric value
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldSubstring;

impl TargetStrategy for YieldSubstring {
    fn name(&self) -> &'static str {
        "yield-substring"
    }

    fn select(&self, frame: &DataFrame) -> Option<String> {
        frame
            .columns()
            .iter()
            .find(|c| c.name().to_lowercase().contains("yield") && c.numeric_count() > 0)
            .map(|c| c.name().to_string())
    }
}

/// Densest numeric column outside the blacklist, with at least
/// `min_values` numeric cells
#[derive(Debug, Clone, Copy)]
pub struct DensestNumeric {
    pub min_values: usize,
}

impl Default for DensestNumeric {
    fn default() -> Self {
        Self {
            min_values: MIN_NUMERIC_VALUES,
        }
    }
}

impl TargetStrategy for DensestNumeric {
    fn name(&self) -> &'static str {
        "densest-numeric"
    }

    fn select(&self, frame: &DataFrame) -> Option<String> {
        frame
            .columns()
            .iter()
            .filter(|c| !TARGET_BLACKLIST.contains(&c.name().to_lowercase().as_str()))
            .map(|c| (c.numeric_count(), c.name()))
            .filter(|(count, _)| *count >= self.min_values)
            .max()
            .map(|(_, name)| name.to_string())
    }
}

/// Outcome of target resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelection {
    pub column: String,
    pub strategy: &'static str,
}

/// Ordered list of target strategies
pub struct TargetResolver {
    strategies: Vec<Box<dyn TargetStrategy>>,
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(CandidateName),
            Box::new(YieldSubstring),
            Box::new(DensestNumeric::default()),
        ])
    }
}

impl TargetResolver {
    pub fn new(strategies: Vec<Box<dyn TargetStrategy>>) -> Self {
        Self { strategies }
    }

    /// Default strategies with a custom numeric-count floor
    pub fn with_min_numeric(min_values: usize) -> Self {
        Self::new(vec![
            Box::new(CandidateName),
            Box::new(YieldSubstring),
            Box::new(DensestNumeric { min_values }),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order and return the first match.
    pub fn resolve(&self, frame: &DataFrame) -> Result<TargetSelection, TrainerError> {
        for strategy in &self.strategies {
            match strategy.select(frame) {
                Some(column) => {
                    info!(
                        "Selected target '{}' via {} strategy",
                        column,
                        strategy.name()
                    );
                    return Ok(TargetSelection {
                        column,
                        strategy: strategy.name(),
                    });
                }
                None => debug!("Target strategy {} found no match", strategy.name()),
            }
        }

        Err(TrainerError::NoTarget {
            available: frame.column_names(),
        })
    }
}
