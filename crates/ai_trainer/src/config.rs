//! Trainer configuration
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! `AGRISENSE_*` environment variables. The CLI applies its explicit flags
//! last and calls [`TrainerConfig::validate`] before any work starts.

use agrisense_ai_core::config::{DEFAULT_MODEL_DIR, MODEL_DIR_ENV};
use agrisense_ai_core::{ArtifactPaths, ForestParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::errors::TrainerError;
use crate::features::MAX_CATEGORICAL_CARDINALITY;
use crate::target::MIN_NUMERIC_VALUES;

/// Default training dataset
pub const DEFAULT_CSV: &str = "data/predictions_dataset.csv";

pub const CSV_ENV: &str = "AGRISENSE_CSV";
pub const TEST_SIZE_ENV: &str = "AGRISENSE_TEST_SIZE";
pub const RANDOM_STATE_ENV: &str = "AGRISENSE_RANDOM_STATE";
pub const TREES_ENV: &str = "AGRISENSE_TREES";
pub const MAX_DEPTH_ENV: &str = "AGRISENSE_MAX_DEPTH";

/// Everything a training run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Input dataset
    pub csv: PathBuf,

    /// Output directory for `model.bin`, `model.hash` and `model_summary.json`
    pub model_dir: PathBuf,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the split and the bootstrap samples
    pub random_state: u64,

    /// Text columns with more distinct values are not used as features
    pub max_cardinality: usize,

    /// Numeric values a column needs to be picked as a fallback target
    pub min_numeric_values: usize,

    pub forest: ForestParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from(DEFAULT_CSV),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            test_size: 0.2,
            random_state: 42,
            max_cardinality: MAX_CATEGORICAL_CARDINALITY,
            min_numeric_values: MIN_NUMERIC_VALUES,
            forest: ForestParams::default(),
        }
    }
}

impl TrainerConfig {
    /// Read a TOML file. Missing keys keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainerError::InvalidConfig(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TrainerError> {
        toml::from_str(content)
            .map_err(|e| TrainerError::InvalidConfig(format!("failed to parse config: {e}")))
    }

    /// Apply overrides from the process environment
    pub fn load_from_env(&mut self) -> Result<(), TrainerError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    /// Blank values are ignored; values that fail to parse are an error.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), TrainerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(val) = get(CSV_ENV) {
            debug!("{} overrides csv", CSV_ENV);
            self.csv = PathBuf::from(val);
        }
        if let Some(val) = get(MODEL_DIR_ENV) {
            debug!("{} overrides model_dir", MODEL_DIR_ENV);
            self.model_dir = PathBuf::from(val);
        }
        if let Some(val) = get(TEST_SIZE_ENV) {
            self.test_size = parse_var(TEST_SIZE_ENV, &val)?;
        }
        if let Some(val) = get(RANDOM_STATE_ENV) {
            self.random_state = parse_var(RANDOM_STATE_ENV, &val)?;
        }
        if let Some(val) = get(TREES_ENV) {
            self.forest.n_estimators = parse_var(TREES_ENV, &val)?;
        }
        if let Some(val) = get(MAX_DEPTH_ENV) {
            self.forest.max_depth = Some(parse_var(MAX_DEPTH_ENV, &val)?);
        }
        Ok(())
    }

    /// Return every problem with this configuration
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            problems.push(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            ));
        }
        if self.max_cardinality == 0 {
            problems.push("max_cardinality must be at least 1".to_string());
        }
        if self.min_numeric_values == 0 {
            problems.push("min_numeric_values must be at least 1".to_string());
        }
        if self.csv.as_os_str().is_empty() {
            problems.push("csv path is empty".to_string());
        }
        if self.model_dir.as_os_str().is_empty() {
            problems.push("model_dir is empty".to_string());
        }

        problems.extend(self.forest.problems());
        problems
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TrainerError::InvalidConfig(problems.join("; ")))
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.model_dir)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, TrainerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| TrainerError::InvalidConfig(format!("{key}={value:?}: {e}")))
}
