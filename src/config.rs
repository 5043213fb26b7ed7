use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::TalusError;

pub const STORE_ENV: &str = "TALUS_STORE";
pub const HOME_ENV: &str = "TALUS_HOME";
pub const USER_ENV: &str = "TALUS_USER";
pub const STORE_FILE_NAME: &str = "results.json";

/// Resolved runtime settings. Each value comes from the command line first,
/// then the environment, then a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: PathBuf,
    pub user: Option<String>,
}

impl Settings {
    pub fn resolve(store: Option<PathBuf>, user: Option<String>) -> Result<Self, TalusError> {
        Self::resolve_with(store, user, |name| env::var_os(name))
    }

    /// Same as [`Settings::resolve`] with an injectable environment lookup.
    pub fn resolve_with<F>(
        store: Option<PathBuf>,
        user: Option<String>,
        lookup: F,
    ) -> Result<Self, TalusError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let store = match store.or_else(|| lookup(STORE_ENV).map(PathBuf::from)) {
            Some(path) => path,
            None => talus_home(&lookup)?.join(STORE_FILE_NAME),
        };

        let user = user
            .or_else(|| env_string(&lookup, USER_ENV))
            .or_else(|| env_string(&lookup, "USER"))
            .or_else(|| env_string(&lookup, "USERNAME"));

        Ok(Self { store, user })
    }
}

fn env_string<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<OsString>,
{
    lookup(name)
        .and_then(|value| value.into_string().ok())
        .filter(|value| !value.trim().is_empty())
}

fn talus_home<F>(lookup: &F) -> Result<PathBuf, TalusError>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(value) = lookup(HOME_ENV) {
        return Ok(PathBuf::from(value));
    }

    let home = default_home_dir(lookup).ok_or_else(|| TalusError::InvalidRequest {
        message: format!(
            "cannot locate the result store: pass --store, or set {STORE_ENV} or {HOME_ENV}"
        ),
    })?;
    Ok(PathBuf::from(home).join(".talus"))
}

#[cfg(not(target_os = "windows"))]
fn default_home_dir<F>(lookup: &F) -> Option<OsString>
where
    F: Fn(&str) -> Option<OsString>,
{
    lookup("HOME")
}

#[cfg(target_os = "windows")]
fn default_home_dir<F>(lookup: &F) -> Option<OsString>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(value) = lookup("USERPROFILE") {
        return Some(value);
    }

    let home_drive = lookup("HOMEDRIVE")?;
    let home_path = lookup("HOMEPATH")?;
    let mut combined = PathBuf::from(home_drive);
    combined.push(home_path);
    Some(combined.into_os_string())
}
