//! AgriSense AI core
//!
//! Shared building blocks for the yield trainer and the prediction service.
//!
//! Modules:
//! - `frame`: CSV-backed data frame with per-column type inference
//! - `coerce`: the lenient numeric coercion policy
//! - `stats`: mean, median, spread and mode helpers
//! - `preprocess`: imputers, scaler, one-hot encoder and column transformer
//! - `forest`: regression trees and the bagged forest
//! - `pipeline`: preprocessor + forest fitted as one unit
//! - `artifact`: persisted bundle, digest and JSON summary
//! - `serialization`: canonical JSON writer
//! - `config`: artifact locations
//! - `log`: tracing subscriber setup

pub mod artifact;
pub mod coerce;
pub mod config;
pub mod errors;
pub mod forest;
pub mod frame;
pub mod log;
pub mod pipeline;
pub mod preprocess;
pub mod serialization;
pub mod stats;

pub use artifact::{ModelArtifact, ModelMetrics, ModelSummary, ARTIFACT_VERSION};
pub use coerce::{coerce_numeric, coerce_numeric_or_default, parse_numeric, NUMERIC_FILL};
pub use config::ArtifactPaths;
pub use errors::{CoreError, Result};
pub use forest::{ForestParams, Node, RandomForest, Tree};
pub use frame::{Column, ColumnData, DataFrame};
pub use pipeline::FittedPipeline;
pub use preprocess::ColumnTransformer;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
