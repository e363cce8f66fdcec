//! Shared fixture: train a small yield model into a temp directory

#![allow(dead_code)]

use agrisense_ai_core::ArtifactPaths;
use agrisense_ai_trainer::{TrainerConfig, YieldTrainer};
use anyhow::Result;
use std::io::Write;
use tempfile::TempDir;

/// Number of trees in the fixture model
pub const FIXTURE_TREES: usize = 20;

pub fn train(dir: &TempDir) -> Result<ArtifactPaths> {
    let csv_path = dir.path().join("fields.csv");
    let mut csv = std::fs::File::create(&csv_path)?;
    writeln!(csv, "ndvi,rainfall_mm,soil_type,estimated_yield_t_ha")?;
    for i in 0..100 {
        let soil = ["loam", "clay", "sand"][i % 3];
        let ndvi = 0.25 + (i % 11) as f64 * 0.06;
        let rainfall = 70 + (i * 13) % 100;
        let y = 1.2 + 4.5 * ndvi + rainfall as f64 / 90.0;
        writeln!(csv, "{ndvi:.2},{rainfall},{soil},{y:.3}")?;
    }
    csv.flush()?;

    let mut config = TrainerConfig {
        csv: csv_path,
        model_dir: dir.path().join("models"),
        ..TrainerConfig::default()
    };
    config.forest.n_estimators = FIXTURE_TREES;
    let report = YieldTrainer::new(config).run()?;
    Ok(report.paths)
}
