//! Request parsing and feature row construction

use agrisense_ai_core::coerce::{coerce_numeric_or_default, render_number};
use agrisense_ai_core::{Column, DataFrame};
use serde_json::{Map, Value};

use crate::errors::PredictorError;

/// Fill for categorical cells with no usable value. Never a fitted
/// category, so it encodes as the all-zero indicator row.
pub const MISSING_CATEGORY: &str = "0";

/// Parse the raw request body. Blank input is an empty record.
pub fn parse_input(raw: &str) -> Result<Map<String, Value>, PredictorError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| PredictorError::Input(format!("request is not valid JSON: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PredictorError::Input(format!(
            "request must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Expected features first (null when absent), then any extra input fields.
pub fn build_row(input: &Map<String, Value>, expected: &[String]) -> Map<String, Value> {
    let mut row = Map::new();
    for name in expected {
        row.insert(
            name.clone(),
            input.get(name).cloned().unwrap_or(Value::Null),
        );
    }
    for (key, value) in input {
        if !row.contains_key(key) {
            row.insert(key.clone(), value.clone());
        }
    }
    row
}

/// One-row frame for the pipeline. Columns in `categorical` keep their
/// text; every other column goes through [`coerce_numeric_or_default`].
pub fn to_frame(row: &Map<String, Value>, categorical: &[String]) -> Result<DataFrame, PredictorError> {
    let columns = row
        .iter()
        .map(|(name, value)| {
            if categorical.contains(name) {
                Column::text(name.as_str(), vec![Some(category_text(value))])
            } else {
                Column::numeric(name.as_str(), vec![Some(coerce_numeric_or_default(value))])
            }
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn category_text(value: &Value) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n
            .as_f64()
            .map(render_number)
            .unwrap_or_else(|| n.to_string()),
        Value::Bool(b) => b.to_string(),
        _ => MISSING_CATEGORY.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
