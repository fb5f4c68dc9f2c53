//! Input events delivered by the host
//!
//! Key events are already normalized (the host maps platform key codes with
//! [`KeyEvent::from_key_code`]). Pointer coordinates are relative to the
//! viewport; the editor adds the scroll offset itself.

use serde::{Deserialize, Serialize};

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Ctrl on most platforms, Cmd on macOS
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Map a DOM key code. Codes without a dedicated key fall back to the
    /// produced character; `None` when there is neither.
    pub fn from_key_code(code: u32, ch: Option<char>, ctrl: bool, meta: bool, shift: bool) -> Option<Self> {
        let key = match code {
            8 => Key::Backspace,
            13 => Key::Enter,
            35 => Key::End,
            36 => Key::Home,
            37 => Key::Left,
            38 => Key::Up,
            39 => Key::Right,
            40 => Key::Down,
            46 => Key::Delete,
            _ => Key::Char(ch?),
        };
        Some(Self { key, ctrl, meta, shift })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Pointer event in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self { x, y, kind: PointerKind::Down }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self { x, y, kind: PointerKind::Move }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self { x, y, kind: PointerKind::Up }
    }
}

/// Everything the host forwards to an [`crate::Editor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    Resize { width: f64, height: f64 },
    /// Time passed, drives caret blink and scrolling
    Tick { ms: u64 },
}

impl InputEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InputEvent::Key(_) => "key",
            InputEvent::Pointer(_) => "pointer",
            InputEvent::Resize { .. } => "resize",
            InputEvent::Tick { .. } => "tick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(
            KeyEvent::from_key_code(8, None, false, false, false).map(|k| k.key),
            Some(Key::Backspace)
        );
        assert_eq!(
            KeyEvent::from_key_code(39, None, false, false, true),
            Some(KeyEvent::new(Key::Right).with_shift())
        );
        assert_eq!(
            KeyEvent::from_key_code(65, Some('a'), true, false, false),
            Some(KeyEvent::new(Key::Char('a')).with_ctrl())
        );
        assert_eq!(KeyEvent::from_key_code(16, None, false, false, true), None);
    }

    #[test]
    fn test_command_modifier() {
        assert!(!KeyEvent::new(Key::Home).has_command_modifier());
        assert!(KeyEvent::new(Key::Home).with_meta().has_command_modifier());
    }

    #[test]
    fn test_script_line_parses() {
        let key: InputEvent =
            serde_json::from_str(r#"{"type":"key","key":{"Char":"x"},"shift":true}"#).unwrap();
        assert_eq!(key, InputEvent::Key(KeyEvent::new(Key::Char('x')).with_shift()));

        let enter: InputEvent = serde_json::from_str(r#"{"type":"key","key":"Enter"}"#).unwrap();
        assert_eq!(enter, InputEvent::Key(KeyEvent::new(Key::Enter)));

        let pointer: InputEvent =
            serde_json::from_str(r#"{"type":"pointer","x":10.0,"y":5.0,"kind":"down"}"#).unwrap();
        assert_eq!(pointer, InputEvent::Pointer(PointerEvent::down(10.0, 5.0)));

        let tick: InputEvent = serde_json::from_str(r#"{"type":"tick","ms":16}"#).unwrap();
        assert_eq!(tick.name(), "tick");
    }
}
