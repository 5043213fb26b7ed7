use std::cmp::Ordering;
use std::path::Path;

use serde_json::Value;

use crate::error::TalusError;
use crate::query::{FieldValue, Scope, SearchQuery, SortKey};
use crate::record::Record;

/// The fetch capability the resolver runs queries against.
///
/// `fetch` must return records ordered by `query.sort` and truncated to
/// `query.num` when present.
pub trait RecordSource {
    fn fetch(&self, query: &SearchQuery) -> Result<Vec<Record>, TalusError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Record>, TalusError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
}

impl Operator {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }
}

/// A result collection loaded from a JSON array on disk.
#[derive(Debug, Clone, Default)]
pub struct JsonFileStore {
    records: Vec<Record>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, TalusError> {
        let bytes = std::fs::read(path).map_err(|error| TalusError::io(path, error))?;
        let invalid = |message: String| TalusError::InvalidStore {
            path: path.display().to_string(),
            message,
        };

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|error| invalid(error.to_string()))?;
        let Value::Array(items) = value else {
            return Err(invalid("expected a top-level JSON array".to_string()));
        };

        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Record::from_value(item)
                    .map_err(|error| invalid(format!("record {index}: {error}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(path = %path.display(), records = records.len(), "loaded result store");
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl RecordSource for JsonFileStore {
    fn fetch(&self, query: &SearchQuery) -> Result<Vec<Record>, TalusError> {
        if query.fields.keys().any(|key| key.starts_with("$where")) {
            return Err(TalusError::InvalidRequest {
                message: "'$where' expressions are not supported by the local result store"
                    .to_string(),
            });
        }

        let mut matched = Vec::new();
        for record in &self.records {
            if record_matches(record, query) {
                matched.push(record.clone());
            }
        }

        if let Some(sort) = &query.sort {
            matched.sort_by(|left, right| compare_for_sort(left, right, sort));
        }
        if let Some(num) = query.num {
            matched.truncate(num as usize);
        }

        tracing::debug!(matched = matched.len(), "fetched results");
        Ok(matched)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Record>, TalusError> {
        Ok(self.records.iter().find(|record| record.id() == id).cloned())
    }
}

fn record_matches(record: &Record, query: &SearchQuery) -> bool {
    if !query.tags.iter().all(|tag| record.has_tag(tag)) {
        return false;
    }

    if let Scope::User(user) = &query.scope
        && !record.has_tag(user)
    {
        return false;
    }

    if let Some(identifier) = query.name_or_tag.as_deref() {
        let by_name = record.lookup("name").and_then(Value::as_str) == Some(identifier);
        if !by_name && !record.has_tag(identifier) {
            return false;
        }
    }

    query
        .fields
        .iter()
        .all(|(key, expected)| field_matches(record, key, expected))
}

fn split_operator(key: &str) -> (&str, Operator) {
    if let Some((path, suffix)) = key.rsplit_once("__")
        && let Some(operator) = Operator::from_suffix(suffix)
    {
        return (path, operator);
    }
    (key, Operator::Eq)
}

fn field_matches(record: &Record, key: &str, expected: &FieldValue) -> bool {
    let (path, operator) = split_operator(key);
    let actual = record.lookup(path);

    match operator {
        Operator::Eq => actual.is_some_and(|value| value_equals(value, expected)),
        Operator::Ne => !actual.is_some_and(|value| value_equals(value, expected)),
        Operator::Contains => actual.is_some_and(|value| match value {
            Value::String(text) => text.contains(&expected.to_string()),
            Value::Array(items) => items
                .iter()
                .any(|item| compare(item, expected).is_some_and(Ordering::is_eq)),
            _ => false,
        }),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let Some(ordering) = actual.and_then(|value| compare(value, expected)) else {
                return false;
            };
            match operator {
                Operator::Gt => ordering.is_gt(),
                Operator::Gte => ordering.is_ge(),
                Operator::Lt => ordering.is_lt(),
                _ => ordering.is_le(),
            }
        }
    }
}

/// Scalar equality, or membership when the stored value is an array.
fn value_equals(actual: &Value, expected: &FieldValue) -> bool {
    match actual {
        Value::Array(items) => items
            .iter()
            .any(|item| compare(item, expected).is_some_and(Ordering::is_eq)),
        _ => compare(actual, expected).is_some_and(Ordering::is_eq),
    }
}

fn compare(actual: &Value, expected: &FieldValue) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(number), FieldValue::Integer(wanted)) => match number.as_i64() {
            Some(value) => Some(value.cmp(wanted)),
            None => number.as_f64()?.partial_cmp(&(*wanted as f64)),
        },
        (Value::Bool(value), FieldValue::Boolean(wanted)) => Some(value.cmp(wanted)),
        (Value::String(value), FieldValue::Text(wanted)) => Some(value.cmp(wanted)),
        _ => None,
    }
}

fn compare_for_sort(left: &Record, right: &Record, sort: &SortKey) -> Ordering {
    match (left.lookup(&sort.field), right.lookup(&sort.field)) {
        (Some(left), Some(right)) => {
            let ordering = compare_values(left, right);
            if sort.descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => match (left.as_i64(), right.as_i64()) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => left
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&right.as_f64().unwrap_or_default()),
        },
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
