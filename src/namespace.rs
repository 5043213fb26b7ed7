use std::collections::BTreeSet;

use crate::query::SearchQuery;

pub const DATA_PREFIX: &str = "data.";

/// Fields the result schema exposes at the top level of a document.
pub const RESULT_ROOT_FIELDS: &[&str] = &[
    "created", "tags", "job", "tool", "$where", "sort", "num", "dest", "id", "name",
];

const OPERATOR_SEPARATOR: &str = "__";

/// Rewrites short user-facing field names (`crashing_module`) into their
/// storage path under a namespace (`data.crashing_module`).
#[derive(Debug, Clone)]
pub struct NamespaceMapper {
    prefix: String,
    root_fields: BTreeSet<String>,
}

impl NamespaceMapper {
    pub fn new<I, S>(prefix: impl Into<String>, root_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            root_fields: root_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn for_results() -> Self {
        Self::new(DATA_PREFIX, RESULT_ROOT_FIELDS.iter().copied())
    }

    pub fn is_root(&self, key: &str) -> bool {
        key.starts_with(&self.prefix) || self.root_fields.contains(root_segment(key))
    }

    pub fn map_key(&self, key: &str) -> String {
        if self.is_root(key) {
            key.to_string()
        } else {
            format!("{}{key}", self.prefix)
        }
    }

    pub fn map(&self, query: SearchQuery) -> SearchQuery {
        let fields = query
            .fields
            .into_iter()
            .map(|(key, value)| (self.map_key(&key), value))
            .collect();
        SearchQuery { fields, ..query }
    }
}

/// The part of a key before the first path or operator separator:
/// `created__gt` and `created.seconds` both have root segment `created`.
pub fn root_segment(key: &str) -> &str {
    let dot = key.find('.').unwrap_or(key.len());
    let operator = key.find(OPERATOR_SEPARATOR).unwrap_or(key.len());
    &key[..dot.min(operator)]
}
