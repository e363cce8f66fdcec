//! Artifact locations shared by the trainer and the predictor

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default output directory for model artifacts
pub const DEFAULT_MODEL_DIR: &str = "server/models";

/// Serialized pipeline bundle
pub const MODEL_FILE: &str = "model.bin";

/// BLAKE3 digest of the bundle, hex encoded
pub const HASH_FILE: &str = "model.hash";

/// JSON summary consumed by the predictor and external callers
pub const SUMMARY_FILE: &str = "model_summary.json";

/// Environment variable overriding the model directory
pub const MODEL_DIR_ENV: &str = "AGRISENSE_MODEL_DIR";

/// Paths of the three files that make up a persisted model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub model: PathBuf,
    pub hash: PathBuf,
    pub summary: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            model: dir.join(MODEL_FILE),
            hash: dir.join(HASH_FILE),
            summary: dir.join(SUMMARY_FILE),
            dir,
        }
    }

    /// Resolve the model directory: explicit value, then
    /// `AGRISENSE_MODEL_DIR`, then [`DEFAULT_MODEL_DIR`].
    pub fn resolve(explicit: Option<&Path>) -> Self {
        match explicit {
            Some(dir) => Self::in_dir(dir),
            None => match std::env::var(MODEL_DIR_ENV) {
                Ok(dir) if !dir.trim().is_empty() => Self::in_dir(dir.trim()),
                _ => Self::in_dir(DEFAULT_MODEL_DIR),
            },
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_MODEL_DIR)
    }
}
