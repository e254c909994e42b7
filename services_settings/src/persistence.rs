//! Settings override file
//!
//! Overrides are stored as one JSON object with plain values, so a user can
//! edit the file by hand:
//!
//! ```json
//! { "version": 1, "overrides": { "ui.theme": "dark", "history.undo_limit": 50 } }
//! ```
//!
//! Entries whose value is not a boolean, integer or string are skipped on
//! load rather than failing the whole file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{SettingKey, SettingValue};

/// On-disk shape of the overrides file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverridesData {
    pub version: u32,
    #[serde(default)]
    pub overrides: BTreeMap<String, SettingValue>,
}

impl SettingsOverridesData {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_overrides(overrides: &BTreeMap<SettingKey, SettingValue>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            overrides: overrides
                .iter()
                .map(|(key, value)| (key.as_str().to_owned(), value.clone()))
                .collect(),
        }
    }

    pub fn to_overrides(&self) -> BTreeMap<SettingKey, SettingValue> {
        self.overrides
            .iter()
            .map(|(key, value)| (SettingKey::new(key.clone()), value.clone()))
            .collect()
    }
}

impl Default for SettingsOverridesData {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("settings could not be encoded: {0}")]
    SerializationFailed(String),

    #[error("settings file is not valid JSON: {0}")]
    DeserializationFailed(String),

    #[error("settings file version {0} is not supported")]
    UnsupportedVersion(u32),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

fn to_json(value: &SettingValue) -> Value {
    match value {
        SettingValue::Boolean(b) => Value::Bool(*b),
        SettingValue::Integer(n) => Value::from(*n),
        SettingValue::String(s) => Value::String(s.clone()),
    }
}

fn from_json(value: &Value) -> Option<SettingValue> {
    match value {
        Value::Bool(b) => Some(SettingValue::Boolean(*b)),
        Value::Number(n) => n.as_i64().map(SettingValue::Integer),
        Value::String(s) => Some(SettingValue::String(s.clone())),
        _ => None,
    }
}

#[derive(Serialize)]
struct FileOut<'a> {
    version: u32,
    overrides: BTreeMap<&'a str, Value>,
}

#[derive(Deserialize)]
struct FileIn {
    version: u32,
    #[serde(default)]
    overrides: BTreeMap<String, Value>,
}

/// Encodes overrides as pretty JSON with keys in sorted order.
pub fn serialize_overrides(data: &SettingsOverridesData) -> PersistenceResult<Vec<u8>> {
    let file = FileOut {
        version: data.version,
        overrides: data
            .overrides
            .iter()
            .map(|(key, value)| (key.as_str(), to_json(value)))
            .collect(),
    };
    serde_json::to_vec_pretty(&file).map_err(|e| PersistenceError::SerializationFailed(e.to_string()))
}

pub fn deserialize_overrides(bytes: &[u8]) -> PersistenceResult<SettingsOverridesData> {
    let file: FileIn = serde_json::from_slice(bytes)
        .map_err(|e| PersistenceError::DeserializationFailed(e.to_string()))?;
    if file.version != SettingsOverridesData::CURRENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(file.version));
    }

    let overrides = file
        .overrides
        .iter()
        .filter_map(|(key, value)| from_json(value).map(|value| (key.clone(), value)))
        .collect();
    Ok(SettingsOverridesData {
        version: file.version,
        overrides,
    })
}

/// Unreadable or foreign files load as "no overrides".
pub fn load_overrides_safe(bytes: &[u8]) -> SettingsOverridesData {
    deserialize_overrides(bytes).unwrap_or_default()
}
