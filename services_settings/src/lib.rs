//! # Settings Registry Service
//!
//! A typed settings system for the rich-text editor.
//!
//! ## Philosophy
//!
//! - **Typed settings**: All settings have explicit types, not stringly-typed
//! - **Layered**: Read-only defaults + persisted overrides
//! - **Deterministic**: Settings are serializable and reproducible
//! - **Testable**: All settings logic can be tested independently
//!
//! ## Example
//!
//! ```ignore
//! use services_settings::{create_default_registry, keys, SettingValue};
//!
//! let mut registry = create_default_registry();
//! registry.set_override(keys::TABLES_MAX_DIMENSION, SettingValue::Integer(20))?;
//! let config = EditorConfig::from_registry(&registry);
//! ```

pub mod config;
pub mod persistence;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{EditorConfig, InsertionAnchor, Theme};

/// Setting key (path-like identifier)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SettingKey(String);

impl SettingKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks if this key starts with the given prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SettingKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Setting value (strongly typed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl SettingValue {
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            SettingValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Boolean(_) => "boolean",
            SettingValue::Integer(_) => "integer",
            SettingValue::String(_) => "string",
        }
    }

    fn same_type(&self, other: &SettingValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Boolean(v) => write!(f, "{}", v),
            SettingValue::Integer(v) => write!(f, "{}", v),
            SettingValue::String(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(SettingKey),

    #[error("Setting {key} expects {expected}, got {actual}")]
    TypeMismatch {
        key: SettingKey,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Settings registry
#[derive(Debug, Clone, Default)]
pub struct SettingsRegistry {
    /// Default settings (read-only)
    defaults: BTreeMap<SettingKey, SettingValue>,
    overrides: BTreeMap<SettingKey, SettingValue>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a default setting
    pub fn register_default(&mut self, key: impl Into<SettingKey>, value: SettingValue) {
        self.defaults.insert(key.into(), value);
    }

    /// Sets an override; the key must have a default of the same type
    pub fn set_override(
        &mut self,
        key: impl Into<SettingKey>,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        let key = key.into();
        let default = self
            .defaults
            .get(&key)
            .ok_or_else(|| SettingsError::UnknownKey(key.clone()))?;
        if !default.same_type(&value) {
            return Err(SettingsError::TypeMismatch {
                key,
                expected: default.type_name(),
                actual: value.type_name(),
            });
        }
        self.overrides.insert(key, value);
        Ok(())
    }

    pub fn remove_override(&mut self, key: &SettingKey) -> bool {
        self.overrides.remove(key).is_some()
    }

    /// Gets the effective value (override or default)
    pub fn get(&self, key: &SettingKey) -> Option<&SettingValue> {
        self.overrides.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn get_default(&self, key: &SettingKey) -> Option<&SettingValue> {
        self.defaults.get(key)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(&SettingKey::new(key)).and_then(SettingValue::as_integer)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(&SettingKey::new(key)).and_then(SettingValue::as_string)
    }

    pub fn list_defaults(&self) -> Vec<SettingKey> {
        self.defaults.keys().cloned().collect()
    }

    pub fn list_overrides(&self) -> Vec<SettingKey> {
        self.overrides.keys().cloned().collect()
    }

    /// Returns all effective settings with a given prefix
    pub fn list_with_prefix(&self, prefix: &str) -> Vec<(SettingKey, SettingValue)> {
        self.defaults
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Exports overrides for persistence
    pub fn export_overrides(&self) -> BTreeMap<SettingKey, SettingValue> {
        self.overrides.clone()
    }

    /// Imports overrides, skipping unknown keys and mistyped values.
    /// Returns the keys that were rejected.
    pub fn import_overrides(
        &mut self,
        overrides: BTreeMap<SettingKey, SettingValue>,
    ) -> Vec<SettingKey> {
        let mut rejected = Vec::new();
        for (key, value) in overrides {
            if self.set_override(key.clone(), value).is_err() {
                rejected.push(key);
            }
        }
        rejected
    }
}

/// Common setting keys
pub mod keys {
    pub const STORAGE_DOCUMENT_KEY: &str = "storage.document_key";
    pub const STORAGE_SETTINGS_KEY: &str = "storage.settings_key";
    pub const IMAGES_DEFAULT_WIDTH: &str = "images.default_width";
    pub const IMAGES_DEFAULT_HEIGHT: &str = "images.default_height";
    pub const IMAGES_INSERTION_ANCHOR: &str = "images.insertion_anchor";
    pub const TABLES_MAX_DIMENSION: &str = "tables.max_dimension";
    pub const HISTORY_UNDO_LIMIT: &str = "history.undo_limit";
    pub const UI_THEME: &str = "ui.theme";
    pub const LOG_CAPACITY: &str = "log.capacity";
}

/// Creates a settings registry with default settings
pub fn create_default_registry() -> SettingsRegistry {
    let defaults = EditorConfig::default();
    let mut registry = SettingsRegistry::new();

    registry.register_default(
        keys::STORAGE_DOCUMENT_KEY,
        SettingValue::String(defaults.document_key),
    );
    registry.register_default(
        keys::STORAGE_SETTINGS_KEY,
        SettingValue::String(defaults.settings_key),
    );

    registry.register_default(
        keys::IMAGES_DEFAULT_WIDTH,
        SettingValue::Integer(i64::from(defaults.image_width)),
    );
    registry.register_default(
        keys::IMAGES_DEFAULT_HEIGHT,
        SettingValue::Integer(i64::from(defaults.image_height)),
    );
    registry.register_default(
        keys::IMAGES_INSERTION_ANCHOR,
        SettingValue::String(defaults.insertion_anchor.as_str().to_string()),
    );

    registry.register_default(
        keys::TABLES_MAX_DIMENSION,
        SettingValue::Integer(i64::from(defaults.max_table_dimension)),
    );
    registry.register_default(
        keys::HISTORY_UNDO_LIMIT,
        SettingValue::Integer(defaults.undo_limit as i64),
    );

    registry.register_default(
        keys::UI_THEME,
        SettingValue::String(defaults.theme.as_str().to_string()),
    );
    registry.register_default(
        keys::LOG_CAPACITY,
        SettingValue::Integer(defaults.log_capacity as i64),
    );

    registry
}
