//! Canonical JSON for the model summary
//!
//! Object keys are ordered at every depth and nesting is indented by two
//! spaces. Two summaries of the same model differ only in `created_at`.

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use std::collections::BTreeMap;
use std::io::Write;

const INDENT: &[u8] = b"  ";

/// `value` with the keys of every nested object in ascending order
pub fn sorted_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, inner)| (key, sorted_value(inner)))
                .collect();
            Value::Object(ordered.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_value).collect()),
        scalar => scalar,
    }
}

pub fn write_canonical_json<T, W>(writer: W, value: &T) -> serde_json::Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let tree = sorted_value(serde_json::to_value(value)?);
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    tree.serialize(&mut serializer)
}

pub fn canonical_json_string<T>(value: &T) -> serde_json::Result<String>
where
    T: Serialize + ?Sized,
{
    let mut buffer = Vec::new();
    write_canonical_json(&mut buffer, value)?;
    String::from_utf8(buffer).map_err(serde_json::Error::custom)
}
