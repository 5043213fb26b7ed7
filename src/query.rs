use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::TalusError;
use crate::flags::{ClassifiedArgs, FlagValue, Switch};
use crate::notice::Notice;

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_SORT: &str = "-created";

pub const SORT_KEY: &str = "sort";
pub const NUM_KEY: &str = "num";
pub const TAGS_KEY: &str = "tags";
pub const DEST_KEY: &str = "dest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Field path to order results by; a leading `-` in the textual form means
/// descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self, TalusError> {
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field, true),
            None => (raw.strip_prefix('+').unwrap_or(raw), false),
        };

        if field.trim().is_empty() {
            return Err(TalusError::invalid_value(
                SORT_KEY,
                raw,
                "expected a field name, optionally prefixed with '-'",
            ));
        }

        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(&self.field)
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Everyone,
    User(String),
}

impl Scope {
    pub fn is_everyone(&self) -> bool {
        matches!(self, Self::Everyone)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Scope::is_everyone")]
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_or_tag: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl SearchQuery {
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Removes the output path so the query can be forwarded to a record
    /// source.
    pub fn take_dest(&mut self) -> Option<PathBuf> {
        self.dest.take()
    }

    pub fn with_name_or_tag(&self, identifier: &str) -> Self {
        Self {
            name_or_tag: Some(identifier.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub query: SearchQuery,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone)]
pub struct SearchTermBuilder {
    no_hex_keys: BTreeSet<String>,
    default_limit: Option<u32>,
    default_sort: SortKey,
    user: Option<String>,
    user_default_filter: bool,
}

impl SearchTermBuilder {
    pub fn new() -> Self {
        Self {
            no_hex_keys: BTreeSet::new(),
            default_limit: Some(DEFAULT_LIMIT),
            default_sort: SortKey {
                field: DEFAULT_SORT.trim_start_matches('-').to_string(),
                descending: true,
            },
            user: None,
            user_default_filter: false,
        }
    }

    /// Keys whose values are always kept verbatim, even when they look numeric.
    pub fn no_hex_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.no_hex_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_limit(mut self, limit: Option<u32>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    /// Restricts queries to the current user's results unless `--all` is
    /// given. Has no effect when no user is configured.
    pub fn user_default_filter(mut self, enabled: bool) -> Self {
        self.user_default_filter = enabled;
        self
    }

    pub fn build(&self, args: &ClassifiedArgs) -> Result<BuiltQuery, TalusError> {
        self.build_terms(&args.flags, &args.switches)
    }

    pub fn build_terms(
        &self,
        flags: &[FlagValue],
        switches: &BTreeSet<Switch>,
    ) -> Result<BuiltQuery, TalusError> {
        let mut query = SearchQuery::default();

        for FlagValue { key, value } in flags {
            match key.as_str() {
                SORT_KEY => query.sort = Some(SortKey::parse(value)?),
                NUM_KEY => query.num = Some(parse_limit(value)?),
                TAGS_KEY => query.tags = parse_tags(value),
                DEST_KEY => query.dest = Some(PathBuf::from(value)),
                _ if self.no_hex_keys.contains(key) => {
                    query
                        .fields
                        .insert(key.clone(), FieldValue::Text(value.clone()));
                }
                _ => {
                    query.fields.insert(key.clone(), coerce_value(key, value)?);
                }
            }
        }

        let all_mine = switches.contains(&Switch::AllMine);
        let all = switches.contains(&Switch::All);
        if all_mine {
            let user = self.user.clone().ok_or_else(|| TalusError::InvalidRequest {
                message: "--all-mine needs a current user; pass --user or set TALUS_USER"
                    .to_string(),
            })?;
            query.scope = Scope::User(user);
        } else if self.user_default_filter
            && !all
            && let Some(user) = &self.user
        {
            query.scope = Scope::User(user.clone());
        }

        if query.sort.is_none() {
            query.sort = Some(self.default_sort.clone());
        }

        let mut notices = Vec::new();
        if let Some(limit) = self.default_limit
            && query.num.is_none()
            && !all_mine
            && !all
        {
            query.num = Some(limit);
            notices.push(Notice::default_limit(limit));
        }

        tracing::debug!(?query, "built search query");
        Ok(BuiltQuery { query, notices })
    }
}

impl Default for SearchTermBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerces a raw flag value: prefixed hex, then decimal integer, then
/// boolean, then plain text.
pub fn coerce_value(key: &str, raw: &str) -> Result<FieldValue, TalusError> {
    if let Some(digits) = hex_pattern()
        .captures(raw)
        .and_then(|captures| captures.get(1))
    {
        return i64::from_str_radix(digits.as_str(), 16)
            .map(FieldValue::Integer)
            .map_err(|error| TalusError::invalid_value(key, raw, error.to_string()));
    }

    if decimal_pattern().is_match(raw) {
        return raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|error| TalusError::invalid_value(key, raw, error.to_string()));
    }

    if raw.eq_ignore_ascii_case("true") {
        return Ok(FieldValue::Boolean(true));
    }
    if raw.eq_ignore_ascii_case("false") {
        return Ok(FieldValue::Boolean(false));
    }

    Ok(FieldValue::Text(raw.to_string()))
}

fn parse_limit(raw: &str) -> Result<u32, TalusError> {
    let invalid = || TalusError::invalid_value(NUM_KEY, raw, "expected a positive integer");
    match coerce_value(NUM_KEY, raw).map_err(|_| invalid())? {
        FieldValue::Integer(value) if value >= 1 => u32::try_from(value).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn hex_pattern() -> &'static Regex {
    static HEX: OnceLock<Regex> = OnceLock::new();
    HEX.get_or_init(|| Regex::new(r"^0[xX]([0-9a-fA-F]+)$").expect("hex regex should compile"))
}

fn decimal_pattern() -> &'static Regex {
    static DECIMAL: OnceLock<Regex> = OnceLock::new();
    DECIMAL.get_or_init(|| Regex::new(r"^[+-]?[0-9]+$").expect("decimal regex should compile"))
}
