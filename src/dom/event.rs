//! Keyboard events as seen by document listeners.

use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Escape,
    Enter,
    Space,
    Backspace,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
        }
    }

    pub fn shifted(key: Key) -> Self {
        Self {
            key,
            shift: true,
            ctrl: false,
        }
    }
}

/// Result of offering a key to a handler. `Handled` suppresses the
/// default action, like `preventDefault` on a DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
}

impl KeyOutcome {
    pub fn is_handled(self) -> bool {
        self == KeyOutcome::Handled
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        let shift = event.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let (key, shift) = match event.code {
            KeyCode::Tab => (Key::Tab, shift),
            // Terminals report Shift+Tab as a separate key
            KeyCode::BackTab => (Key::Tab, true),
            KeyCode::Esc => (Key::Escape, shift),
            KeyCode::Enter => (Key::Enter, shift),
            KeyCode::Backspace => (Key::Backspace, shift),
            KeyCode::Left => (Key::ArrowLeft, shift),
            KeyCode::Right => (Key::ArrowRight, shift),
            KeyCode::Up => (Key::ArrowUp, shift),
            KeyCode::Down => (Key::ArrowDown, shift),
            KeyCode::Char(' ') => (Key::Space, shift),
            KeyCode::Char(c) => (Key::Char(c), shift),
            _ => (Key::Other, shift),
        };
        Self { key, shift, ctrl }
    }
}
