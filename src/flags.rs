use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::TalusError;

/// A `--key value` pair with the key normalized (`--crashing-module` becomes
/// `crashing_module`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValue {
    pub key: String,
    pub value: String,
}

impl FlagValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Standalone boolean flags that take no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Switch {
    All,
    AllMine,
}

impl Switch {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "--all" => Some(Self::All),
            "--all-mine" => Some(Self::AllMine),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedArgs {
    pub flags: Vec<FlagValue>,
    pub leftover: Vec<String>,
    pub switches: BTreeSet<Switch>,
}

impl ClassifiedArgs {
    pub fn has_switch(&self, switch: Switch) -> bool {
        self.switches.contains(&switch)
    }
}

pub fn classify<S: AsRef<str>>(tokens: &[S]) -> Result<ClassifiedArgs, TalusError> {
    let mut classified = ClassifiedArgs::default();
    let mut iter = tokens.iter().map(AsRef::<str>::as_ref);

    while let Some(token) = iter.next() {
        if let Some(switch) = Switch::from_token(token) {
            classified.switches.insert(switch);
            continue;
        }

        let Some(raw_key) = token.strip_prefix("--") else {
            classified.leftover.push(token.to_string());
            continue;
        };

        if raw_key.is_empty() {
            return Err(TalusError::MalformedArguments {
                message: "'--' must be followed by a field name".to_string(),
            });
        }

        let key = normalize_key(raw_key);
        let Some(value) = iter.next() else {
            return Err(TalusError::MissingValue { flag: key });
        };
        classified.flags.push(FlagValue::new(key, value));
    }

    Ok(classified)
}

pub fn normalize_key(raw_key: &str) -> String {
    raw_key.replace('-', "_")
}
