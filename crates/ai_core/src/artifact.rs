//! Persisted model artifact and JSON summary
//!
//! A trained model is stored as three files (see [`ArtifactPaths`]):
//! the bincode bundle, its BLAKE3 digest and a canonical JSON summary.
//! Every file is written to a temporary sibling and renamed into place, so a
//! reader sees either the previous version or the new one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::ArtifactPaths;
use crate::errors::{CoreError, Result};
use crate::pipeline::FittedPipeline;
use crate::serialization::canonical_json_string;

/// Bundle format version
pub const ARTIFACT_VERSION: u32 = 1;

/// Held-out accuracy and confidence of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Mean confidence percentage over the test split; `None` when
    /// estimator-level predictions were unavailable
    pub avg_confidence: Option<f64>,
}

/// Everything the predictor needs to replay a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    /// UTC seconds
    pub created_at: i64,
    pub pipeline: FittedPipeline,
    pub target_col: String,
    pub numeric_features: Vec<String>,
    pub categorical_features: Vec<String>,
    pub metrics: ModelMetrics,
}

impl ModelArtifact {
    pub fn new(
        pipeline: FittedPipeline,
        target_col: String,
        numeric_features: Vec<String>,
        categorical_features: Vec<String>,
        metrics: ModelMetrics,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            pipeline,
            target_col,
            numeric_features,
            categorical_features,
            metrics,
        }
    }

    /// Feature names in pipeline order (numeric then categorical)
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_features
            .iter()
            .chain(self.categorical_features.iter())
            .cloned()
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and validate a bundle
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = bincode::deserialize(bytes)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(CoreError::InvalidModel(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            )));
        }
        artifact.pipeline.validate()?;
        Ok(artifact)
    }

    /// Write the bundle and its digest. Returns the digest.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<String> {
        let bytes = self.to_bytes()?;
        let digest = digest_hex(&bytes);
        write_atomic(&paths.model, &bytes)?;
        write_atomic(&paths.hash, digest.as_bytes())?;
        debug!(path = %paths.model.display(), bytes = bytes.len(), "wrote model bundle");
        Ok(digest)
    }

    /// Read and validate the bundle, checking it against the recorded
    /// digest when one exists.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let bytes = fs::read(&paths.model)?;
        match fs::read_to_string(&paths.hash) {
            Ok(expected) => {
                let expected = expected.trim().to_string();
                let actual = digest_hex(&bytes);
                if expected != actual {
                    return Err(CoreError::IntegrityMismatch { expected, actual });
                }
            }
            Err(err) => warn!(
                path = %paths.hash.display(),
                error = %err,
                "model digest unavailable; skipping integrity check"
            ),
        }
        Self::from_bytes(&bytes)
    }
}

/// JSON summary written next to the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub n_rows: usize,
    pub n_features: usize,
    pub target_col: String,
    pub feature_names: Vec<String>,
    pub numeric_features: Vec<String>,
    pub categorical_features: Vec<String>,
    pub metrics: ModelMetrics,
    pub model_hash: String,
    pub created_at: i64,
}

impl ModelSummary {
    pub fn from_artifact(artifact: &ModelArtifact, n_rows: usize, model_hash: String) -> Self {
        let feature_names = artifact.feature_names();
        Self {
            n_rows,
            n_features: feature_names.len(),
            target_col: artifact.target_col.clone(),
            feature_names,
            numeric_features: artifact.numeric_features.clone(),
            categorical_features: artifact.categorical_features.clone(),
            metrics: artifact.metrics.clone(),
            model_hash,
            created_at: artifact.created_at,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = canonical_json_string(self)?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// BLAKE3 digest, hex encoded
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
    Ok(())
}
