//! Subscriber setup for the AgriSense binaries

use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::errors::{CoreError, Result};

/// Where formatted log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    /// Used by the predictor, whose stdout carries the JSON response
    Stderr,
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_logging(default_level: Level, target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let writer = match target {
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| CoreError::Config(format!("failed to set tracing subscriber: {e}")))
}
