//! # Input Types
//!
//! Input event types delivered to the editor by its host.
//!
//! ## Philosophy
//!
//! - **Events, not bytes**: Input is structured events, not raw scan codes
//! - **Testable**: Events are serializable and can be injected for testing
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - Raw hardware scan codes
//! - Pointer or touch input (the host resolves clicks into selections)
//! - Global keyboard state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Keyboard event
    Key(KeyEvent),
    /// Committed text (typing, IME composition, plain paste)
    Text(String),
}

impl InputEvent {
    pub fn key(event: KeyEvent) -> Self {
        Self::Key(event)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(event) => Some(event),
            Self::Text(_) => None,
        }
    }
}

/// Keyboard event
///
/// Represents a single keyboard state change (key press, release, or repeat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers, state: KeyState) -> Self {
        Self {
            code,
            modifiers,
            state,
        }
    }

    /// Creates a key pressed event
    pub fn pressed(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Pressed)
    }

    /// Creates a key released event
    pub fn released(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Released)
    }

    /// Creates a key repeat event
    pub fn repeat(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Repeat)
    }

    /// Press and repeat both act; release never does
    pub fn is_actionable(&self) -> bool {
        self.state != KeyState::Released
    }

    /// Ctrl (or Meta) chord with the given character, case-insensitive
    pub fn is_shortcut(&self, ch: char) -> bool {
        self.modifiers.is_command()
            && matches!(self.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch))
    }

    /// The character this event types, if it types one
    pub fn typed_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.modifiers.is_command() && !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// Key state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

/// Logical key codes the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// A printable character
    Char(char),
    Enter,
    Backspace,
    Delete,
    Escape,
    Tab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    Unknown,
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{}", c),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Modifier keys
///
/// Bitflags representing modifier key states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const NONE: Self = Self { bits: 0 };
    pub const CTRL: Self = Self { bits: 1 << 0 };
    pub const ALT: Self = Self { bits: 1 << 1 };
    pub const SHIFT: Self = Self { bits: 1 << 2 };
    /// Meta/Super/Command key
    pub const META: Self = Self { bits: 1 << 3 };

    pub fn none() -> Self {
        Self::NONE
    }

    pub fn with(mut self, other: Modifiers) -> Self {
        self.bits |= other.bits;
        self
    }

    pub fn contains(&self, other: Modifiers) -> bool {
        (self.bits & other.bits) == other.bits
    }

    pub fn is_ctrl(&self) -> bool {
        self.contains(Self::CTRL)
    }

    pub fn is_alt(&self) -> bool {
        self.contains(Self::ALT)
    }

    pub fn is_shift(&self) -> bool {
        self.contains(Self::SHIFT)
    }

    pub fn is_meta(&self) -> bool {
        self.contains(Self::META)
    }

    /// Ctrl on most hosts, Command on macOS
    pub fn is_command(&self) -> bool {
        self.is_ctrl() || self.is_meta()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_key() {
        let key_event = KeyEvent::pressed(KeyCode::Char('a'), Modifiers::none());
        let event = InputEvent::key(key_event.clone());
        assert_eq!(event.as_key(), Some(&key_event));
        assert_eq!(InputEvent::text("hi").as_key(), None);
    }

    #[test]
    fn test_key_event_states() {
        assert!(KeyEvent::pressed(KeyCode::Enter, Modifiers::NONE).is_actionable());
        assert!(KeyEvent::repeat(KeyCode::Backspace, Modifiers::NONE).is_actionable());
        assert!(!KeyEvent::released(KeyCode::Delete, Modifiers::NONE).is_actionable());
    }

    #[test]
    fn test_shortcut_matching() {
        let ctrl_b = KeyEvent::pressed(KeyCode::Char('B'), Modifiers::CTRL);
        assert!(ctrl_b.is_shortcut('b'));
        let cmd_z = KeyEvent::pressed(KeyCode::Char('z'), Modifiers::META.with(Modifiers::SHIFT));
        assert!(cmd_z.is_shortcut('z'));
        let plain_b = KeyEvent::pressed(KeyCode::Char('b'), Modifiers::NONE);
        assert!(!plain_b.is_shortcut('b'));
    }

    #[test]
    fn test_typed_char() {
        let shifted = KeyEvent::pressed(KeyCode::Char('A'), Modifiers::SHIFT);
        assert_eq!(shifted.typed_char(), Some('A'));
        let chord = KeyEvent::pressed(KeyCode::Char('a'), Modifiers::CTRL);
        assert_eq!(chord.typed_char(), None);
        assert_eq!(KeyEvent::pressed(KeyCode::Enter, Modifiers::NONE).typed_char(), None);
    }

    #[test]
    fn test_modifiers_combined() {
        let mods = Modifiers::CTRL.with(Modifiers::SHIFT);
        assert!(mods.is_ctrl());
        assert!(mods.is_shift());
        assert!(!mods.is_alt());
        assert!(mods.is_command());
        assert!(Modifiers::META.is_command());
        assert!(!Modifiers::SHIFT.is_command());
        assert!(Modifiers::none().is_empty());
    }

    #[test]
    fn test_key_code_display() {
        assert_eq!(KeyCode::Char('x').to_string(), "x");
        assert_eq!(KeyCode::Backspace.to_string(), "Backspace");
    }

    #[test]
    fn test_event_serialization() {
        let event = InputEvent::key(KeyEvent::pressed(KeyCode::Char('b'), Modifiers::CTRL));
        let json = serde_json::to_string(&event).unwrap();
        let decoded: InputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
    }
}
