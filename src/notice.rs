use std::path::PathBuf;

use serde::Serialize;

/// Caller-visible informational messages. These never change the outcome of a
/// command; they explain what was done implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    DefaultLimit { num: u32, message: String },
    DestinationExists { path: PathBuf, message: String },
}

impl Notice {
    pub fn default_limit(num: u32) -> Self {
        Self::DefaultLimit {
            num,
            message: format!("showing first {num} results, use --all to see everything"),
        }
    }

    pub fn destination_exists(path: PathBuf) -> Self {
        let message = format!(
            "export path ({}) already exists, not overwriting it",
            path.display()
        );
        Self::DestinationExists { path, message }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::DefaultLimit { message, .. } | Self::DestinationExists { message, .. } => message,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::DestinationExists { .. })
    }

    /// Forwards the notice to the log so it reaches stderr as well as the
    /// JSON response.
    pub fn emit(&self) {
        if self.is_warning() {
            tracing::warn!("{}", self.message());
        } else {
            tracing::info!("{}", self.message());
        }
    }
}
