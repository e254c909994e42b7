//! Inline styles, colors and the font size scale

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ordinal font size scale: `(ordinal, pixels)`.
pub const FONT_SIZE_SCALE: [(u8, u32); 7] = [
    (1, 10),
    (2, 13),
    (3, 16),
    (4, 18),
    (5, 24),
    (6, 32),
    (7, 48),
];

/// Returns the key whose value is nearest to `px`.
///
/// Keys are scanned in slice order and only a strictly smaller distance
/// replaces the current best, so ties go to the earlier key.
pub fn nearest_by_distance<K: Copy>(scale: &[(K, u32)], px: u32) -> Option<K> {
    let mut best: Option<(K, u32)> = None;
    for &(key, value) in scale {
        let diff = px.abs_diff(value);
        match best {
            Some((_, min_diff)) if diff >= min_diff => {}
            _ => best = Some((key, diff)),
        }
    }
    best.map(|(key, _)| key)
}

/// Maps a pixel size to the nearest ordinal of [`FONT_SIZE_SCALE`].
pub fn font_size_to_scale(px: u32) -> u8 {
    nearest_by_distance(&FONT_SIZE_SCALE, px).unwrap_or(1)
}

/// Stored style values that fail validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Font size ordinal {0} is outside 1..=7")]
    InvalidFontSize(u8),
}

/// Font size as an ordinal on the 1..=7 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct FontSize(u8);

impl FontSize {
    pub fn from_px(px: u32) -> Self {
        Self(font_size_to_scale(px))
    }

    /// Returns `None` outside 1..=7
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        FONT_SIZE_SCALE
            .iter()
            .any(|&(ord, _)| ord == ordinal)
            .then_some(Self(ordinal))
    }

    pub fn ordinal(&self) -> u8 {
        self.0
    }

    pub fn px(&self) -> u32 {
        FONT_SIZE_SCALE
            .iter()
            .find(|&&(ord, _)| ord == self.0)
            .map(|&(_, px)| px)
            .unwrap_or(16)
    }
}

impl TryFrom<u8> for FontSize {
    type Error = StyleError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal).ok_or(StyleError::InvalidFontSize(ordinal))
    }
}

/// A hex color, normalized to lowercase `#rrggbb`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(String);

impl Color {
    /// Parses `#rgb` or `#rrggbb`.
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        Some(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = StyleError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or(StyleError::InvalidColor(raw))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boolean inline attributes that toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Style carried by a text run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<FontSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl InlineStyle {
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    pub fn flag(&self, flag: InlineFlag) -> bool {
        match flag {
            InlineFlag::Bold => self.bold,
            InlineFlag::Italic => self.italic,
            InlineFlag::Underline => self.underline,
            InlineFlag::Strikethrough => self.strikethrough,
        }
    }

    pub fn set_flag(&mut self, flag: InlineFlag, on: bool) {
        match flag {
            InlineFlag::Bold => self.bold = on,
            InlineFlag::Italic => self.italic = on,
            InlineFlag::Underline => self.underline = on,
            InlineFlag::Strikethrough => self.strikethrough = on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_scale_exact_values() {
        for &(ordinal, px) in FONT_SIZE_SCALE.iter() {
            assert_eq!(font_size_to_scale(px), ordinal);
        }
    }

    #[test]
    fn test_font_size_nearest() {
        assert_eq!(font_size_to_scale(0), 1);
        assert_eq!(font_size_to_scale(12), 2);
        assert_eq!(font_size_to_scale(20), 4);
        assert_eq!(font_size_to_scale(40), 6);
        assert_eq!(font_size_to_scale(1000), 7);
    }

    #[test]
    fn test_font_size_tie_goes_to_lower_ordinal() {
        // 17 is 1 away from both 16 (ord 3) and 18 (ord 4)
        assert_eq!(font_size_to_scale(17), 3);
        // 28 is 4 away from both 24 (ord 5) and 32 (ord 6)
        assert_eq!(font_size_to_scale(28), 5);

        let scale = [("a", 10), ("b", 20)];
        assert_eq!(nearest_by_distance(&scale, 15), Some("a"));
    }

    #[test]
    fn test_font_size_idempotent_on_own_output() {
        for px in 0..100 {
            let ordinal = font_size_to_scale(px);
            let size = FontSize::from_ordinal(ordinal).unwrap();
            assert_eq!(font_size_to_scale(size.px()), ordinal);
        }
    }

    #[test]
    fn test_nearest_by_distance_empty_scale() {
        let scale: [(u8, u32); 0] = [];
        assert_eq!(nearest_by_distance(&scale, 10), None);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#FF0000").unwrap().as_str(), "#ff0000");
        assert_eq!(Color::parse("#abc").unwrap().as_str(), "#aabbcc");
        assert!(Color::parse("red").is_none());
        assert!(Color::parse("#12345").is_none());
        assert!(Color::parse("#zzzzzz").is_none());
    }

    #[test]
    fn test_stored_values_are_validated() {
        let color: Color = serde_json::from_str("\"#ABC\"").unwrap();
        assert_eq!(color.as_str(), "#aabbcc");
        assert!(serde_json::from_str::<Color>("\"red\\\"><b>\"").is_err());

        let size: FontSize = serde_json::from_str("5").unwrap();
        assert_eq!(size.px(), 24);
        assert!(serde_json::from_str::<FontSize>("0").is_err());
        assert!(serde_json::from_str::<FontSize>("200").is_err());

        let style = InlineStyle {
            color: Color::parse("#123456"),
            size: FontSize::from_ordinal(2),
            ..InlineStyle::default()
        };
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(serde_json::from_str::<InlineStyle>(&json).unwrap(), style);
    }

    #[test]
    fn test_inline_flags() {
        let mut style = InlineStyle::default();
        assert!(style.is_default());
        style.set_flag(InlineFlag::Italic, true);
        assert!(style.flag(InlineFlag::Italic));
        assert!(!style.flag(InlineFlag::Bold));
        assert!(!style.is_default());
    }
}
