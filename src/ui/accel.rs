//! Accelerators
//!
//! Accelerator strings use the GTK notation stored in the `accel-*`
//! preferences: zero or more `<modifier>` prefixes followed by a key name.
//!
//! ```text
//! <control><shift>t     Ctrl+Shift+T
//! <control>Page_Up      Ctrl+PageUp
//! F11                   F11
//! Disabled              no accelerator
//! ```

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent};

use super::keymapper::Modifiers;
use crate::preferences::{Preferences, DISABLED_ACCEL};
use crate::wm::Action;

/// Key part of an accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelKey {
    /// Lowercase character
    Char(char),
    F(u8),
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
    Tab,
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Left,
    Right,
}

impl AccelKey {
    fn parse(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(AccelKey::Char(c.to_ascii_lowercase()));
        }

        if let Some(n) = name.strip_prefix(['F', 'f']) {
            if let Ok(n) = n.parse::<u8>() {
                if (1..=24).contains(&n) {
                    return Some(AccelKey::F(n));
                }
            }
        }

        let key = match name.to_ascii_lowercase().as_str() {
            "page_up" | "prior" => AccelKey::PageUp,
            "page_down" | "next" => AccelKey::PageDown,
            "home" => AccelKey::Home,
            "end" => AccelKey::End,
            "insert" => AccelKey::Insert,
            "delete" => AccelKey::Delete,
            "tab" => AccelKey::Tab,
            "return" | "enter" => AccelKey::Enter,
            "escape" => AccelKey::Esc,
            "backspace" => AccelKey::Backspace,
            "up" => AccelKey::Up,
            "down" => AccelKey::Down,
            "left" => AccelKey::Left,
            "right" => AccelKey::Right,
            "space" => AccelKey::Char(' '),
            _ => return None,
        };
        Some(key)
    }

    fn from_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::Char(c) => AccelKey::Char(c.to_ascii_lowercase()),
            KeyCode::F(n) => AccelKey::F(n),
            KeyCode::PageUp => AccelKey::PageUp,
            KeyCode::PageDown => AccelKey::PageDown,
            KeyCode::Home => AccelKey::Home,
            KeyCode::End => AccelKey::End,
            KeyCode::Insert => AccelKey::Insert,
            KeyCode::Delete => AccelKey::Delete,
            KeyCode::Tab | KeyCode::BackTab => AccelKey::Tab,
            KeyCode::Enter => AccelKey::Enter,
            KeyCode::Esc => AccelKey::Esc,
            KeyCode::Backspace => AccelKey::Backspace,
            KeyCode::Up => AccelKey::Up,
            KeyCode::Down => AccelKey::Down,
            KeyCode::Left => AccelKey::Left,
            KeyCode::Right => AccelKey::Right,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for AccelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccelKey::Char(' ') => write!(f, "Space"),
            AccelKey::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            AccelKey::F(n) => write!(f, "F{}", n),
            AccelKey::PageUp => write!(f, "PgUp"),
            AccelKey::PageDown => write!(f, "PgDn"),
            AccelKey::Home => write!(f, "Home"),
            AccelKey::End => write!(f, "End"),
            AccelKey::Insert => write!(f, "Ins"),
            AccelKey::Delete => write!(f, "Del"),
            AccelKey::Tab => write!(f, "Tab"),
            AccelKey::Enter => write!(f, "Enter"),
            AccelKey::Esc => write!(f, "Esc"),
            AccelKey::Backspace => write!(f, "BS"),
            AccelKey::Up => write!(f, "Up"),
            AccelKey::Down => write!(f, "Down"),
            AccelKey::Left => write!(f, "Left"),
            AccelKey::Right => write!(f, "Right"),
        }
    }
}

/// A parsed accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    pub mods: Modifiers,
    pub key: AccelKey,
}

impl Accelerator {
    /// Parse an accelerator string. `Disabled`, empty and malformed strings give `None`.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() || spec == DISABLED_ACCEL {
            return None;
        }

        let mut mods = Modifiers::empty();
        let mut rest = spec;
        while let Some(tail) = rest.strip_prefix('<') {
            let (name, after) = tail.split_once('>')?;
            mods |= match name.to_ascii_lowercase().as_str() {
                "control" | "ctrl" | "ctl" | "primary" => Modifiers::CTRL,
                "shift" | "shft" => Modifiers::SHIFT,
                "alt" | "mod1" | "meta" => Modifiers::ALT,
                _ => return None,
            };
            rest = after;
        }

        let key = AccelKey::parse(rest)?;
        Some(Self { mods, key })
    }

    /// Whether a key event triggers this accelerator.
    ///
    /// Uppercase characters imply Shift, since terminals often report
    /// Shift only through the character case.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let Some(key) = AccelKey::from_code(event.code) else {
            return false;
        };
        let mut mods = Modifiers::from(event.modifiers);
        match event.code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => mods |= Modifiers::SHIFT,
            KeyCode::BackTab => mods |= Modifiers::SHIFT,
            _ => {}
        }
        key == self.key && mods == self.mods
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(Modifiers::CTRL) {
            write!(f, "Ctrl+")?;
        }
        if self.mods.contains(Modifiers::ALT) {
            write!(f, "Alt+")?;
        }
        if self.mods.contains(Modifiers::SHIFT) {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Accelerators of every window action
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<(Accelerator, Action)>,
}

impl Keymap {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let bindings = Action::ALL
            .iter()
            .filter_map(|&action| {
                let setting = action.accel_setting()?;
                let accel = Accelerator::parse(prefs.string(setting))?;
                Some((accel, action))
            })
            .collect();
        Self { bindings }
    }

    /// Action bound to `event`, if any
    pub fn lookup(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(accel, _)| accel.matches(event))
            .map(|(_, action)| *action)
    }

    /// Accelerator shown next to a menu item
    pub fn accel_for(&self, action: Action) -> Option<Accelerator> {
        self.bindings
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(accel, _)| *accel)
    }
}
