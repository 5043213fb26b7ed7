use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::TalusError;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Written,
    Skipped,
}

pub fn default_destination(record: &Record) -> PathBuf {
    PathBuf::from(format!("{}.json", record.id()))
}

/// Writes the record's canonical JSON to `path`. An existing file is left
/// untouched and reported as [`ExportStatus::Skipped`].
pub fn write_record(record: &Record, path: &Path) -> Result<ExportStatus, TalusError> {
    let bytes = record.to_canonical_json()?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::AlreadyExists => {
            return Ok(ExportStatus::Skipped);
        }
        Err(error) => return Err(TalusError::io(path, error)),
    };

    file.write_all(&bytes)
        .and_then(|()| file.sync_all())
        .map_err(|error| TalusError::io(path, error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "exported result");
    Ok(ExportStatus::Written)
}
