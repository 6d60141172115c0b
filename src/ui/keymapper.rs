//! Key mapping for terminal input
//!
//! Converts key events to the byte sequences sent to the active session.
//! Backspace and Delete follow the `binding-backspace` / `binding-delete`
//! preferences.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::preferences::{EraseBinding, Preferences, Setting};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Bytes produced by an erase binding
fn erase_bytes(binding: EraseBinding, auto: &[u8]) -> Vec<u8> {
    match binding {
        EraseBinding::Auto => auto.to_vec(),
        EraseBinding::AsciiBackspace => vec![0x08],
        EraseBinding::AsciiDelete => vec![0x7F],
        EraseBinding::DeleteSequence => b"\x1b[3~".to_vec(),
    }
}

/// Key mapper for converting key events to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapper {
    backspace: EraseBinding,
    delete: EraseBinding,
}

impl Default for KeyMapper {
    fn default() -> Self {
        Self::new(EraseBinding::AsciiBackspace, EraseBinding::DeleteSequence)
    }
}

impl KeyMapper {
    pub fn new(backspace: EraseBinding, delete: EraseBinding) -> Self {
        Self { backspace, delete }
    }

    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self::new(
            prefs.enum_value(Setting::BindingBackspace),
            prefs.enum_value(Setting::BindingDelete),
        )
    }

    /// Map a crossterm KeyEvent to input bytes
    pub fn map(&self, event: &KeyEvent) -> Option<Vec<u8>> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Some(Self::map_char(ch, mods)),

            KeyCode::Enter => Some(vec![0x0D]),

            KeyCode::Backspace => {
                let mut bytes = erase_bytes(self.backspace, &[0x7F]);
                if mods.contains(Modifiers::ALT) {
                    bytes.insert(0, 0x1B);
                }
                Some(bytes)
            }

            KeyCode::Delete if mods.is_empty() => Some(erase_bytes(self.delete, b"\x1b[3~")),

            KeyCode::Tab => {
                if mods.contains(Modifiers::SHIFT) {
                    Some(b"\x1b[Z".to_vec())
                } else {
                    Some(vec![0x09])
                }
            }
            KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),

            KeyCode::Esc => Some(vec![0x1B]),

            KeyCode::Up => Some(Self::special_key(b'A', mods)),
            KeyCode::Down => Some(Self::special_key(b'B', mods)),
            KeyCode::Right => Some(Self::special_key(b'C', mods)),
            KeyCode::Left => Some(Self::special_key(b'D', mods)),
            KeyCode::Home => Some(Self::special_key(b'H', mods)),
            KeyCode::End => Some(Self::special_key(b'F', mods)),

            KeyCode::PageUp => Some(Self::tilde_key(5, mods)),
            KeyCode::PageDown => Some(Self::tilde_key(6, mods)),
            KeyCode::Insert => Some(Self::tilde_key(2, mods)),
            KeyCode::Delete => Some(Self::tilde_key(3, mods)),

            KeyCode::F(n) => Some(Self::function_key(n, mods)).filter(|b| !b.is_empty()),

            _ => None,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> Vec<u8> {
        if mods.contains(Modifiers::CTRL) && !mods.contains(Modifiers::ALT) {
            if ch.is_ascii_alphabetic() {
                return vec![(ch.to_ascii_lowercase() as u8) - b'a' + 1];
            }
            match ch {
                '@' | '`' | ' ' => return vec![0x00],
                '[' => return vec![0x1B],
                '\\' => return vec![0x1C],
                ']' => return vec![0x1D],
                '^' | '~' => return vec![0x1E],
                '_' | '?' => return vec![0x1F],
                _ => {}
            }
        }

        if mods.contains(Modifiers::CTRL | Modifiers::ALT) && ch.is_ascii_alphabetic() {
            return vec![0x1B, (ch.to_ascii_lowercase() as u8) - b'a' + 1];
        }

        let mut bytes = Vec::new();
        if mods.contains(Modifiers::ALT) {
            bytes.push(0x1B);
        }
        bytes.extend(ch.to_string().as_bytes());
        bytes
    }

    /// Cursor and Home/End keys: `ESC [ key` or `ESC [ 1 ; mod key`
    fn special_key(key: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            vec![0x1B, b'[', key]
        } else {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        }
    }

    /// Tilde key sequence (PageUp, PageDown, Insert, Delete)
    fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            format!("\x1b[{}~", code).into_bytes()
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods)).into_bytes()
        }
    }

    /// Function key sequence
    fn function_key(n: u8, mods: Modifiers) -> Vec<u8> {
        let code = match n {
            1..=4 => {
                let key = b"PQRS"[(n - 1) as usize];
                return if mods.is_empty() {
                    vec![0x1B, b'O', key]
                } else {
                    format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
                };
            }
            5 => 15,
            6 => 17,
            7 => 18,
            8 => 19,
            9 => 20,
            10 => 21,
            11 => 23,
            12 => 24,
            _ => return Vec::new(),
        };
        Self::tilde_key(code, mods)
    }

    /// xterm modifier code
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + if mods.contains(Modifiers::SHIFT) { 1 } else { 0 }
            + if mods.contains(Modifiers::ALT) { 2 } else { 0 }
            + if mods.contains(Modifiers::CTRL) { 4 } else { 0 }
    }
}
