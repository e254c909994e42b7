//! Typed editor configuration resolved from the registry

use crate::{keys, SettingsRegistry};

/// When an image's insertion point is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertionAnchor {
    /// Caret captured when the image is requested
    #[default]
    Request,
    /// Whatever the selection is when decoding completes
    Completion,
}

impl InsertionAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertionAnchor::Request => "request",
            InsertionAnchor::Completion => "completion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "request" => Some(InsertionAnchor::Request),
            "completion" => Some(InsertionAnchor::Completion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub document_key: String,
    pub settings_key: String,
    pub image_width: u32,
    pub image_height: u32,
    pub insertion_anchor: InsertionAnchor,
    pub max_table_dimension: u32,
    pub undo_limit: usize,
    pub theme: Theme,
    pub log_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            document_key: "richtext.document".to_string(),
            settings_key: "richtext.settings".to_string(),
            image_width: 300,
            image_height: 200,
            insertion_anchor: InsertionAnchor::Request,
            max_table_dimension: 50,
            undo_limit: 100,
            theme: Theme::Light,
            log_capacity: 256,
        }
    }
}

impl EditorConfig {
    /// Resolves the effective configuration. Missing or out-of-range values
    /// keep their defaults.
    pub fn from_registry(registry: &SettingsRegistry) -> Self {
        let defaults = Self::default();
        let positive_u32 = |key: &str, fallback: u32| {
            registry
                .get_integer(key)
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(fallback)
        };
        let positive_usize = |key: &str, fallback: usize| {
            registry
                .get_integer(key)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(fallback)
        };
        let non_empty = |key: &str, fallback: String| {
            registry
                .get_string(key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };

        Self {
            document_key: non_empty(keys::STORAGE_DOCUMENT_KEY, defaults.document_key),
            settings_key: non_empty(keys::STORAGE_SETTINGS_KEY, defaults.settings_key),
            image_width: positive_u32(keys::IMAGES_DEFAULT_WIDTH, defaults.image_width),
            image_height: positive_u32(keys::IMAGES_DEFAULT_HEIGHT, defaults.image_height),
            insertion_anchor: registry
                .get_string(keys::IMAGES_INSERTION_ANCHOR)
                .and_then(InsertionAnchor::parse)
                .unwrap_or(defaults.insertion_anchor),
            max_table_dimension: positive_u32(
                keys::TABLES_MAX_DIMENSION,
                defaults.max_table_dimension,
            ),
            undo_limit: positive_usize(keys::HISTORY_UNDO_LIMIT, defaults.undo_limit),
            theme: registry
                .get_string(keys::UI_THEME)
                .and_then(Theme::parse)
                .unwrap_or(defaults.theme),
            log_capacity: positive_usize(keys::LOG_CAPACITY, defaults.log_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_default_registry, SettingValue};

    #[test]
    fn test_defaults_match_registry() {
        let config = EditorConfig::from_registry(&create_default_registry());
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_overrides_applied() {
        let mut registry = create_default_registry();
        registry
            .set_override(keys::IMAGES_INSERTION_ANCHOR, SettingValue::String("completion".into()))
            .unwrap();
        registry
            .set_override(keys::UI_THEME, SettingValue::String("dark".into()))
            .unwrap();
        registry
            .set_override(keys::HISTORY_UNDO_LIMIT, SettingValue::Integer(5))
            .unwrap();

        let config = EditorConfig::from_registry(&registry);
        assert_eq!(config.insertion_anchor, InsertionAnchor::Completion);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.undo_limit, 5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut registry = create_default_registry();
        registry
            .set_override(keys::IMAGES_DEFAULT_WIDTH, SettingValue::Integer(-4))
            .unwrap();
        registry
            .set_override(keys::UI_THEME, SettingValue::String("neon".into()))
            .unwrap();
        registry
            .set_override(keys::STORAGE_DOCUMENT_KEY, SettingValue::String(String::new()))
            .unwrap();

        let config = EditorConfig::from_registry(&registry);
        assert_eq!(config.image_width, 300);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.document_key, "richtext.document");
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
