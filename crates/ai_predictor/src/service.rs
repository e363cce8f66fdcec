//! Prediction service
//!
//! Built once per process from injected artifact paths. The bundle is
//! mandatory; the JSON summary is optional and only feeds the expected
//! feature list and the reported accuracy.

use agrisense_ai_core::stats::std_dev;
use agrisense_ai_core::{ArtifactPaths, CoreError, DataFrame, ModelArtifact};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use tracing::{debug, info, warn};

use crate::errors::PredictorError;
use crate::features::{default_sources, resolve_expected, FeatureSource};
use crate::row::{build_row, to_frame};

/// Keys searched for the stored accuracy, first non-null wins
pub const ACCURACY_KEYS: &[&str] = &["r2", "r2_score"];

/// Response written to stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutput {
    pub predicted: f64,
    pub std: Option<f64>,
    pub per_tree: Option<Vec<f64>>,
    pub model_accuracy: Option<f64>,
    pub feature_inputs: Map<String, Value>,
}

pub struct PredictionService {
    artifact: ModelArtifact,
    summary: Map<String, Value>,
    expected: Vec<String>,
}

impl PredictionService {
    /// Load the model and summary with the default feature sources
    pub fn open(paths: &ArtifactPaths) -> Result<Self, PredictorError> {
        Self::open_with_sources(paths, &default_sources())
    }

    pub fn open_with_sources(
        paths: &ArtifactPaths,
        sources: &[Box<dyn FeatureSource>],
    ) -> Result<Self, PredictorError> {
        let artifact = ModelArtifact::load(paths).map_err(|e| {
            PredictorError::Model(format!("{}: {e}", paths.model.display()))
        })?;
        let summary = read_summary(paths);
        Ok(Self::from_parts(artifact, summary, sources))
    }

    /// Build a service from an already loaded artifact and summary
    pub fn from_parts(
        artifact: ModelArtifact,
        summary: Map<String, Value>,
        sources: &[Box<dyn FeatureSource>],
    ) -> Self {
        let (expected, source) = resolve_expected(sources, &summary, &artifact);
        match source {
            Some(name) => debug!(source = name, count = expected.len(), "expected features resolved"),
            None => warn!("no expected feature list; passing request fields through"),
        }
        Self {
            artifact,
            summary,
            expected,
        }
    }

    pub fn expected_features(&self) -> &[String] {
        &self.expected
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Stored accuracy: summary top level, then its `metrics` object, then
    /// the R² recorded in the bundle.
    pub fn model_accuracy(&self) -> Option<f64> {
        let metrics = self.summary.get("metrics").and_then(Value::as_object);
        let scopes = std::iter::once(&self.summary).chain(metrics);
        scopes
            .flat_map(|scope| ACCURACY_KEYS.iter().filter_map(move |k| scope.get(*k)))
            .find_map(Value::as_f64)
            .or_else(|| Some(self.artifact.metrics.r2).filter(|r2| r2.is_finite()))
    }

    /// Predict one record
    pub fn predict(&self, input: &Map<String, Value>) -> Result<PredictionOutput, PredictorError> {
        let row = build_row(input, &self.expected);
        let frame = to_frame(&row, self.artifact.pipeline.preprocessor.categorical_columns())?;
        let pipeline = &self.artifact.pipeline;

        let predicted = infer_with_retry(&frame, |f| pipeline.predict_one(f))?;

        let per_tree = match pipeline.member_predictions_one(&frame) {
            Ok(members) => members,
            Err(err) => {
                warn!("Per-tree predictions unavailable: {}", err);
                None
            }
        };
        let std = per_tree.as_deref().and_then(std_dev);

        info!(predicted, ?std, "prediction complete");
        Ok(PredictionOutput {
            predicted,
            std,
            per_tree,
            model_accuracy: self.model_accuracy(),
            feature_inputs: row,
        })
    }
}

/// Run `infer` on `frame`, retrying once with the same frame on failure.
fn infer_with_retry<F>(frame: &DataFrame, mut infer: F) -> Result<f64, PredictorError>
where
    F: FnMut(&DataFrame) -> Result<f64, CoreError>,
{
    match infer(frame) {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!("Inference failed ({}); retrying once", first);
            infer(frame).map_err(|e| PredictorError::Inference(e.to_string()))
        }
    }
}

/// Summary as a JSON object; anything unreadable counts as empty.
fn read_summary(paths: &ArtifactPaths) -> Map<String, Value> {
    let raw = match fs::read_to_string(&paths.summary) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %paths.summary.display(), error = %err, "model summary unreadable");
            return Map::new();
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(path = %paths.summary.display(), "model summary is not a JSON object");
            Map::new()
        }
        Err(err) => {
            warn!(path = %paths.summary.display(), error = %err, "model summary unparseable");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrisense_ai_core::{
        ColumnTransformer, FittedPipeline, ForestParams, ModelMetrics, Node,
        RandomForest, Tree,
    };
    use serde_json::json;

    /// Two trees on the scaled ndvi column: one split, one constant
    fn service(summary: Value) -> PredictionService {
        let frame =
            DataFrame::from_reader("ndvi,soil_type\n0.4,loam\n0.8,clay\n".as_bytes()).unwrap();
        let preprocessor =
            ColumnTransformer::fit(&frame, &["ndvi".to_string()], &["soil_type".to_string()])
                .unwrap();
        let width = preprocessor.output_width();
        let split = Tree::new(vec![
            Node::internal(0, 0.0, 1, 2, 2),
            Node::leaf(2.0, 1),
            Node::leaf(4.0, 1),
        ]);
        let flat = Tree::new(vec![Node::leaf(3.0, 2)]);
        let forest = RandomForest::new(vec![split, flat], width, ForestParams::default());
        let artifact = ModelArtifact::new(
            FittedPipeline::new(preprocessor, forest),
            "yield".to_string(),
            vec!["ndvi".to_string()],
            vec!["soil_type".to_string()],
            ModelMetrics {
                r2: 0.9,
                rmse: 0.1,
                mae: 0.1,
                avg_confidence: Some(80.0),
            },
        );
        let summary = summary.as_object().cloned().unwrap_or_default();
        PredictionService::from_parts(artifact, summary, &default_sources())
    }

    fn one_row() -> DataFrame {
        DataFrame::from_reader("ndvi\n0.5\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_inference_retried_once() {
        let mut calls = 0;
        let value = infer_with_retry(&one_row(), |_| {
            calls += 1;
            if calls == 1 {
                Err(CoreError::Shape("transient".to_string()))
            } else {
                Ok(4.2)
            }
        })
        .unwrap();
        assert_eq!(value, 4.2);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_inference_gives_up_after_second_failure() {
        let mut calls = 0;
        let err = infer_with_retry(&one_row(), |_| {
            calls += 1;
            Err(CoreError::MissingColumn("ndvi".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, PredictorError::Inference(ref msg) if msg.contains("ndvi")));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_retry_sees_identical_frame() {
        let frame = one_row();
        let mut seen: Vec<DataFrame> = Vec::new();
        let _ = infer_with_retry(&frame, |f| {
            seen.push(f.clone());
            Err(CoreError::Shape("always".to_string()))
        });
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], frame);
    }

    #[test]
    fn test_first_success_is_not_retried() {
        let mut calls = 0;
        let value = infer_with_retry(&one_row(), |_| {
            calls += 1;
            Ok(1.0)
        })
        .unwrap();
        assert_eq!((value, calls), (1.0, 1));
    }

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_predict_with_full_input() {
        let svc = service(json!({}));
        let out = svc.predict(&input(json!({"ndvi": 0.8, "soil_type": "clay"}))).unwrap();
        // ndvi 0.8 scales to +1 and takes the right leaf
        assert_eq!(out.per_tree, Some(vec![4.0, 3.0]));
        assert_eq!(out.predicted, 3.5);
        assert_eq!(out.std, Some(0.5));
    }

    #[test]
    fn test_empty_input_still_predicts() {
        let svc = service(json!({}));
        let out = svc.predict(&Map::new()).unwrap();
        // ndvi coerces to 0, which scales below the threshold
        assert_eq!(out.predicted, 2.5);
        assert_eq!(out.feature_inputs["ndvi"], Value::Null);
        assert_eq!(out.feature_inputs["soil_type"], Value::Null);
    }

    #[test]
    fn test_accuracy_lookup_order() {
        assert_eq!(service(json!({"r2": 0.7, "r2_score": 0.1})).model_accuracy(), Some(0.7));
        assert_eq!(service(json!({"r2": null, "r2_score": 0.1})).model_accuracy(), Some(0.1));
        assert_eq!(service(json!({"metrics": {"r2": 0.6}})).model_accuracy(), Some(0.6));
        assert_eq!(service(json!({})).model_accuracy(), Some(0.9));
    }

    #[test]
    fn test_summary_feature_list_is_used() {
        let svc = service(json!({"feature_names": ["ndvi", "soil_type", "rainfall_mm"]}));
        assert_eq!(svc.expected_features(), ["ndvi", "soil_type", "rainfall_mm"]);
        let out = svc.predict(&input(json!({"ndvi": 0.4}))).unwrap();
        assert_eq!(out.feature_inputs["rainfall_mm"], Value::Null);
    }
}
