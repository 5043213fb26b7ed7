use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::TalusError;

pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing string field 'id'")]
    MissingId,
    #[error("field 'id' must be a string")]
    NonStringId,
}

/// A single result document. Only `id` is required; everything else is opaque
/// to the engine apart from query evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    document: Map<String, Value>,
}

impl Record {
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(document) = value else {
            return Err(RecordError::NotAnObject);
        };
        match document.get(ID_FIELD) {
            Some(Value::String(_)) => Ok(Self { document }),
            Some(_) => Err(RecordError::NonStringId),
            None => Err(RecordError::MissingId),
        }
    }

    pub fn id(&self) -> &str {
        self.document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Walks a dot-separated path (`data.registers.eax`) into the document.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.document.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.document
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|candidate| candidate == tag)
    }

    /// Canonical serialized form: compact JSON with object keys in sorted
    /// order.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, TalusError> {
        serde_json::to_vec(&self.document)
            .map_err(|source| TalusError::ResponseSerialization { source })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Record, RecordError};

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).expect("fixture record should be valid")
    }

    #[test]
    fn from_value_requires_object_with_string_id() {
        assert_eq!(Record::from_value(json!([1, 2])), Err(RecordError::NotAnObject));
        assert_eq!(Record::from_value(json!({"id": 7})), Err(RecordError::NonStringId));
        assert_eq!(Record::from_value(json!({"name": "x"})), Err(RecordError::MissingId));
        assert_eq!(record(json!({"id": "abc"})).id(), "abc");
    }

    #[test]
    fn lookup_walks_nested_objects_and_arrays() {
        let result = record(json!({
            "id": "r1",
            "data": {"registers": {"eax": 1094795585}, "frames": ["main", "crash"]}
        }));
        assert_eq!(
            result.lookup("data.registers.eax"),
            Some(&json!(1094795585))
        );
        assert_eq!(result.lookup("data.frames.1"), Some(&json!("crash")));
        assert_eq!(result.lookup("data.missing"), None);
        assert_eq!(result.lookup("id.deeper"), None);
    }

    #[test]
    fn tags_ignore_non_string_entries() {
        let result = record(json!({"id": "r1", "tags": ["IE", 3, "alice"]}));
        assert_eq!(result.tags().collect::<Vec<_>>(), vec!["IE", "alice"]);
        assert!(result.has_tag("alice"));
        assert!(!result.has_tag("3"));
    }

    #[test]
    fn canonical_json_sorts_keys() {
        let result = record(json!({"tool": "fuzz", "id": "r1", "data": {"z": 1, "a": 2}}));
        let bytes = result.to_canonical_json().expect("serialize");
        assert_eq!(
            String::from_utf8(bytes).expect("utf-8"),
            r#"{"data":{"a":2,"z":1},"id":"r1","tool":"fuzz"}"#
        );
    }
}
