//! Numeric coercion policy
//!
//! Raw cells (CSV text or JSON values) are converted to numbers leniently:
//! anything that cannot be read as a finite number becomes "not a number"
//! and, where a default is requested, is replaced by [`NUMERIC_FILL`].
//! This is lossy on purpose. Callers that need to know whether a value was
//! usable should call [`coerce_numeric`] and inspect the `Option`.

use serde_json::Value;

/// Value substituted for missing or non-coercible numeric cells.
pub const NUMERIC_FILL: f64 = 0.0;

/// Tokens read as null when they appear as a whole (trimmed) cell.
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true when a raw text cell should be treated as missing.
pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Parse a text cell as a finite number.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_null_token(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON value to a finite number.
///
/// Numbers pass through, strings are parsed, booleans map to 1/0.
/// Null, arrays and objects are not coercible.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_numeric(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a JSON value to a number, substituting [`NUMERIC_FILL`] for
/// anything that is missing or cannot be read as one.
pub fn coerce_numeric_or_default(value: &Value) -> f64 {
    coerce_numeric(value).unwrap_or(NUMERIC_FILL)
}

/// Render a number the way a categorical column sees it.
///
/// Integral values drop the fractional part so that `3` and `3.0` land in
/// the same category.
pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
