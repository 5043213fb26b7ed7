use std::fmt;
use std::num::NonZeroUsize;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::TalusError;
use crate::query::SearchQuery;
use crate::record::Record;
use crate::source::RecordSource;

/// Which single record a command addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `+N`: the N-th match in the query's sort order, counting from 1.
    Ordinal(NonZeroUsize),
    /// A database id, falling back to a name or tag.
    Identifier(String),
}

impl Reference {
    pub fn parse(token: &str) -> Result<Self, TalusError> {
        let Some(captures) = ordinal_pattern().captures(token) else {
            return Ok(Self::Identifier(token.to_string()));
        };

        let digits = captures.get(1).map_or("", |digits| digits.as_str());
        digits
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::Ordinal)
            .ok_or_else(|| {
                TalusError::invalid_value("reference", token, "ordinals count from +1")
            })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(position) => write!(f, "+{position}"),
            Self::Identifier(identifier) => f.write_str(identifier),
        }
    }
}

/// Only the first leftover token may be a reference; anything after it is an
/// error.
pub fn parse_reference<S: AsRef<str>>(leftover: &[S]) -> Result<Option<Reference>, TalusError> {
    match leftover {
        [] => Ok(None),
        [token] => Reference::parse(token.as_ref()).map(Some),
        [_, extra, ..] => Err(TalusError::UnexpectedArgument {
            argument: extra.as_ref().to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Search,
    Ordinal,
    Id,
    NameOrTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: Record,
    pub resolved_by: ResolvedBy,
}

/// Reduces a query plus an optional reference to exactly one record.
pub fn resolve_one(
    reference: Option<&Reference>,
    query: &SearchQuery,
    source: &dyn RecordSource,
) -> Result<Resolution, TalusError> {
    match reference {
        None => {
            let candidates = source.fetch(query)?;
            let record = exactly_one(candidates, "<search>")?;
            Ok(Resolution {
                record,
                resolved_by: ResolvedBy::Search,
            })
        }
        Some(Reference::Ordinal(position)) => {
            let candidates = source.fetch(query)?;
            tracing::debug!(
                candidates = candidates.len(),
                position = position.get(),
                "resolving ordinal reference"
            );
            let record = candidates
                .into_iter()
                .nth(position.get() - 1)
                .ok_or_else(|| TalusError::NotFound {
                    reference: format!("+{position}"),
                })?;
            Ok(Resolution {
                record,
                resolved_by: ResolvedBy::Ordinal,
            })
        }
        Some(Reference::Identifier(identifier)) => {
            if let Some(record) = source.find_by_id(identifier)? {
                return Ok(Resolution {
                    record,
                    resolved_by: ResolvedBy::Id,
                });
            }

            tracing::debug!(%identifier, "no id match, searching by name or tag");
            let candidates = source.fetch(&query.with_name_or_tag(identifier))?;
            let record = exactly_one(candidates, identifier)?;
            Ok(Resolution {
                record,
                resolved_by: ResolvedBy::NameOrTag,
            })
        }
    }
}

fn exactly_one(candidates: Vec<Record>, reference: &str) -> Result<Record, TalusError> {
    let count = candidates.len();
    let mut candidates = candidates.into_iter();
    match (candidates.next(), count) {
        (Some(record), 1) => Ok(record),
        (None, _) => Err(TalusError::NotFound {
            reference: reference.to_string(),
        }),
        (Some(_), _) => Err(TalusError::AmbiguousReference {
            reference: reference.to_string(),
            candidates: count,
        }),
    }
}

fn ordinal_pattern() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| Regex::new(r"^\+([0-9]+)$").expect("ordinal regex should compile"))
}
