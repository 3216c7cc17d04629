//! Document nodes
//!
//! Raw configuration documents are kept as [`serde_yaml::Value`] nodes, so
//! nothing the document says is lost before a component config is decoded
//! from it: mapping keys of any scalar type, unsigned integers beyond the
//! `i64` range and tagged values all survive parsing. JSON documents are
//! read into the same node type.

use indexmap::IndexMap;
use serde_yaml::Mapping;

pub use serde_yaml::Value;

/// Get a nested node by path segments
///
/// Segments index mappings by key and sequences by decimal index. Scalar
/// mapping keys match their textual form, so segment `"200"` finds key
/// `200`. Returns `None` when any segment doesn't match.
pub fn lookup<'a, S: AsRef<str>>(node: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut current = node;
    for segment in segments {
        let segment = segment.as_ref();
        current = match untag(current) {
            Value::Mapping(map) => map
                .iter()
                .find(|(k, _)| key_string(k).as_deref() == Some(segment))
                .map(|(_, v)| v)?,
            Value::Sequence(seq) => seq.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Returns the kind of a node as used in shape errors
pub fn kind_name(node: &Value) -> &'static str {
    match untag(node) {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Sequence(_) => "array",
        Value::Mapping(_) => "object",
        Value::Tagged(_) => "tagged",
    }
}

/// Textual form of a scalar mapping key, `None` for collection keys
pub fn key_string(key: &Value) -> Option<String> {
    match untag(key) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".into()),
        _ => None,
    }
}

/// Re-key a mapping by the textual form of its keys
///
/// Hands the mapping back untouched if any key is a collection.
pub(crate) fn string_keyed(mapping: Mapping) -> Result<IndexMap<String, Value>, Mapping> {
    if !mapping.keys().all(|k| key_string(k).is_some()) {
        return Err(mapping);
    }
    Ok(mapping
        .into_iter()
        .filter_map(|(k, v)| Some((key_string(&k)?, v)))
        .collect())
}

fn untag(node: &Value) -> &Value {
    match node {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Convert a node to JSON for schema validation
///
/// Scalar keys become their textual form, collection keys their JSON text.
pub(crate) fn to_json(node: &Value) -> serde_json::Value {
    match node {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(to_json).collect()),
        Value::Mapping(map) => {
            let obj: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| {
                    let key = key_string(k).unwrap_or_else(|| to_json(k).to_string());
                    (key, to_json(v))
                })
                .collect();
            serde_json::Value::Object(obj)
        }
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}
