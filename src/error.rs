use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TalusError {
    #[error("Malformed arguments: {message}")]
    MalformedArguments { message: String },

    #[error("Flag '--{flag}' requires a value")]
    MissingValue { flag: String },

    #[error("Unexpected argument '{argument}'")]
    UnexpectedArgument { argument: String },

    #[error("Invalid value '{value}' for '{key}': {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("Could not find a result matching '{reference}'")]
    NotFound { reference: String },

    #[error("Reference '{reference}' matched {candidates} results")]
    AmbiguousReference {
        reference: String,
        candidates: usize,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Result store '{path}' is invalid: {message}")]
    InvalidStore { path: String, message: String },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },
}

impl TalusError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn invalid_value(key: &str, value: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (kind, suggestion) = match self {
            Self::MalformedArguments { .. } => (
                "malformed_arguments",
                Some("Check that every quote in the command line is closed".to_string()),
            ),
            Self::MissingValue { .. } => (
                "missing_value",
                Some("Every --field flag takes exactly one value".to_string()),
            ),
            Self::UnexpectedArgument { .. } => (
                "unexpected_argument",
                Some("Pass at most one reference (an id, a name, or +N)".to_string()),
            ),
            Self::InvalidValue { .. } => ("invalid_value", None),
            Self::NotFound { .. } => (
                "not_found",
                Some("Run 'talus result list' with the same search terms to see candidates".to_string()),
            ),
            Self::AmbiguousReference { .. } => (
                "ambiguous_reference",
                Some("Narrow the search terms or pick one with +N".to_string()),
            ),
            Self::InvalidRequest { .. } => ("invalid_request", None),
            Self::Io { .. } => ("io_error", None),
            Self::InvalidStore { .. } => (
                "invalid_store",
                Some("The store must be a JSON array of objects with a string 'id'".to_string()),
            ),
            Self::ResponseSerialization { .. } => ("serialization_error", None),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: kind.to_string(),
                message: self.to_string(),
                suggestion,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::TalusError;

    fn assert_error_type(
        error: TalusError,
        expected_type: &str,
        expected_suggestion_substring: Option<&str>,
    ) {
        let response = error.to_error_response();
        assert_eq!(response.error.r#type, expected_type);

        match (
            response.error.suggestion.as_deref(),
            expected_suggestion_substring,
        ) {
            (Some(actual), Some(expected_substring)) => {
                assert!(
                    actual.contains(expected_substring),
                    "suggestion should contain '{expected_substring}', got '{actual}'"
                );
            }
            (None, None) => {}
            (actual, expected) => {
                panic!("suggestion mismatch; actual={actual:?}, expected_contains={expected:?}")
            }
        }
    }

    #[test]
    fn argument_errors_map_to_distinct_types() {
        assert_error_type(
            TalusError::MalformedArguments {
                message: "missing closing quote".to_string(),
            },
            "malformed_arguments",
            Some("quote"),
        );
        assert_error_type(
            TalusError::MissingValue {
                flag: "tags".to_string(),
            },
            "missing_value",
            Some("exactly one value"),
        );
        assert_error_type(
            TalusError::UnexpectedArgument {
                argument: "extra".to_string(),
            },
            "unexpected_argument",
            Some("+N"),
        );
        assert_error_type(
            TalusError::invalid_value("num", "abc", "expected a positive integer"),
            "invalid_value",
            None,
        );
    }

    #[test]
    fn resolution_errors_carry_guidance() {
        assert_error_type(
            TalusError::NotFound {
                reference: "+5".to_string(),
            },
            "not_found",
            Some("result list"),
        );
        assert_error_type(
            TalusError::AmbiguousReference {
                reference: "crash".to_string(),
                candidates: 3,
            },
            "ambiguous_reference",
            Some("+N"),
        );
    }

    #[test]
    fn missing_value_message_names_the_flag() {
        let error = TalusError::MissingValue {
            flag: "crashing_module".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Flag '--crashing_module' requires a value"
        );
    }

    #[test]
    fn io_and_store_errors_keep_distinct_response_types() {
        assert_error_type(
            TalusError::Io {
                path: "results.json".to_string(),
                source: std::io::Error::other("boom"),
            },
            "io_error",
            None,
        );
        assert_error_type(
            TalusError::InvalidStore {
                path: "results.json".to_string(),
                message: "expected an array".to_string(),
            },
            "invalid_store",
            Some("JSON array"),
        );
    }
}
