//! Expected input features
//!
//! The feature list comes from an ordered list of sources; the first one
//! that knows the features wins. With no source at all the request is
//! passed through as-is.

use agrisense_ai_core::ModelArtifact;
use serde_json::{Map, Value};

/// One place the expected feature names can come from
pub trait FeatureSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn features(&self, summary: &Map<String, Value>, artifact: &ModelArtifact) -> Option<Vec<String>>;
}

/// `feature_names` in the JSON summary
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFeatureNames;

impl FeatureSource for SummaryFeatureNames {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn features(&self, summary: &Map<String, Value>, _artifact: &ModelArtifact) -> Option<Vec<String>> {
        let list = summary.get("feature_names")?.as_array()?;
        list.iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

/// Input columns recorded in the fitted pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelFeatureNames;

impl FeatureSource for ModelFeatureNames {
    fn name(&self) -> &'static str {
        "model"
    }

    fn features(&self, _summary: &Map<String, Value>, artifact: &ModelArtifact) -> Option<Vec<String>> {
        let names = artifact.pipeline.feature_names_in();
        (!names.is_empty()).then_some(names)
    }
}

/// Default source order: summary, then model
pub fn default_sources() -> Vec<Box<dyn FeatureSource>> {
    vec![Box::new(SummaryFeatureNames), Box::new(ModelFeatureNames)]
}

/// First source that yields a list, or an empty list with no source name.
pub fn resolve_expected(
    sources: &[Box<dyn FeatureSource>],
    summary: &Map<String, Value>,
    artifact: &ModelArtifact,
) -> (Vec<String>, Option<&'static str>) {
    sources
        .iter()
        .find_map(|s| s.features(summary, artifact).map(|f| (f, Some(s.name()))))
        .unwrap_or((Vec::new(), None))
}
