//! Artifact persistence tests
//!
//! Ensures a saved bundle replays identically and that tampering is caught.

use agrisense_ai_core::{
    artifact::digest_hex, ArtifactPaths, Column, ColumnTransformer, CoreError, DataFrame,
    FittedPipeline, ForestParams, ModelArtifact, ModelMetrics, ModelSummary, Node, RandomForest,
    Tree,
};
use anyhow::Result;
use std::fs;
use tempfile::TempDir;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn training_frame() -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::numeric("ndvi", vec![Some(0.2), Some(0.4), Some(0.6), Some(0.8)]),
        Column::text(
            "soil_type",
            vec![
                Some("loam".to_string()),
                Some("clay".to_string()),
                Some("sand".to_string()),
                Some("loam".to_string()),
            ],
        ),
    ])?)
}

fn sample_artifact() -> Result<ModelArtifact> {
    let frame = training_frame()?;
    let preprocessor = ColumnTransformer::fit(&frame, &names(&["ndvi"]), &names(&["soil_type"]))?;
    let width = preprocessor.output_width();

    let trees = vec![
        Tree::new(vec![
            Node::internal(0, 0.0, 1, 2, 4),
            Node::leaf(2.0, 2),
            Node::leaf(4.0, 2),
        ]),
        Tree::new(vec![Node::leaf(3.0, 4)]),
    ];
    let forest = RandomForest::new(trees, width, ForestParams::default());

    Ok(ModelArtifact::new(
        FittedPipeline::new(preprocessor, forest),
        "estimated_yield_t_ha".to_string(),
        names(&["ndvi"]),
        names(&["soil_type"]),
        ModelMetrics {
            r2: 0.9,
            rmse: 0.3,
            mae: 0.2,
            avg_confidence: None,
        },
    ))
}

#[test]
fn test_save_and_load_roundtrip() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = ArtifactPaths::in_dir(dir.path());
    let artifact = sample_artifact()?;

    let digest = artifact.save(&paths)?;
    assert_eq!(fs::read_to_string(&paths.hash)?, digest);

    let loaded = ModelArtifact::load(&paths)?;
    assert_eq!(loaded, artifact);

    let frame = training_frame()?;
    assert_eq!(
        loaded.pipeline.predict(&frame)?,
        artifact.pipeline.predict(&frame)?
    );
    Ok(())
}

#[test]
fn test_tampered_bundle_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = ArtifactPaths::in_dir(dir.path());
    sample_artifact()?.save(&paths)?;

    let mut bytes = fs::read(&paths.model)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&paths.model, &bytes)?;

    match ModelArtifact::load(&paths) {
        Err(CoreError::IntegrityMismatch { actual, .. }) => {
            assert_eq!(actual, digest_hex(&bytes));
        }
        other => panic!("expected integrity mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_missing_digest_still_loads() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = ArtifactPaths::in_dir(dir.path());
    let artifact = sample_artifact()?;
    artifact.save(&paths)?;
    fs::remove_file(&paths.hash)?;

    assert_eq!(ModelArtifact::load(&paths)?, artifact);
    Ok(())
}

#[test]
fn test_width_mismatch_fails_validation() -> Result<()> {
    let mut artifact = sample_artifact()?;
    artifact.pipeline.model.feature_count += 1;
    let bytes = artifact.to_bytes()?;
    assert!(matches!(
        ModelArtifact::from_bytes(&bytes),
        Err(CoreError::InvalidModel(_))
    ));
    Ok(())
}

#[test]
fn test_summary_roundtrip_and_null_confidence() -> Result<()> {
    let dir = TempDir::new()?;
    let paths = ArtifactPaths::in_dir(dir.path());
    let artifact = sample_artifact()?;
    let digest = artifact.save(&paths)?;

    let summary = ModelSummary::from_artifact(&artifact, 4, digest.clone());
    summary.write(&paths.summary)?;

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.summary)?)?;
    assert_eq!(raw["target_col"], "estimated_yield_t_ha");
    assert_eq!(raw["n_features"], 2);
    assert_eq!(raw["feature_names"], serde_json::json!(["ndvi", "soil_type"]));
    // Absent confidence is written as an explicit null, not dropped or zeroed
    assert!(raw["metrics"]
        .as_object()
        .is_some_and(|m| m.contains_key("avg_confidence")));
    assert!(raw["metrics"]["avg_confidence"].is_null());
    assert_eq!(raw["model_hash"], digest);

    assert_eq!(ModelSummary::read(&paths.summary)?, summary);
    Ok(())
}
