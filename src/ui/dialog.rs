//! Dialogs opened by the deferred window actions
//!
//! - **Preferences**: every setting, edited in place
//! - **Set Title**: custom title for the active session
//! - **About**: program information

use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use crate::preferences::{Kind, Setting, SharedPreferences, Value};
use crate::wm::{WindowId, WindowManager};

/// What a dialog wants after handling a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Continue,
    Close,
}

/// One line of the preferences list
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRow {
    pub setting: Setting,
    pub label: &'static str,
    pub value: String,
}

/// Human readable value of `setting`
fn display_value(prefs: &SharedPreferences, setting: Setting) -> String {
    let prefs = prefs.borrow();
    let kind = setting.spec().kind;
    match (prefs.get(setting), kind) {
        (Value::Boolean(b), _) => if *b { "yes" } else { "no" }.to_string(),
        (Value::Enum(v), Kind::Enum { class, .. }) => class.nick_of(*v).unwrap_or("?").to_string(),
        (value, kind) => value.to_text(&kind),
    }
}

/// Editable list of every setting
#[derive(Debug, Default)]
pub struct PreferencesDialog {
    pub selected: usize,
    /// First visible row
    pub scroll: usize,
    /// Text being edited for the selected row
    pub editing: Option<String>,
    /// Last error, shown until the next key
    pub error: Option<String>,
}

impl PreferencesDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, prefs: &SharedPreferences) -> Vec<PreferenceRow> {
        Setting::all()
            .map(|setting| PreferenceRow {
                setting,
                label: setting.spec().blurb,
                value: display_value(prefs, setting),
            })
            .collect()
    }

    pub fn selected_setting(&self) -> Option<Setting> {
        Setting::all().nth(self.selected)
    }

    /// Keep the selection inside a window of `height` rows
    pub fn scroll_to_selection(&mut self, height: usize) {
        let height = height.max(1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent, prefs: &SharedPreferences) -> DialogOutcome {
        self.error = None;

        if let Some(buffer) = self.editing.as_mut() {
            match key.code {
                KeyCode::Esc => self.editing = None,
                KeyCode::Enter => self.commit(prefs),
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return DialogOutcome::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return DialogOutcome::Close,
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(Setting::count() - 1)
            }
            KeyCode::PageUp => self.selected = self.selected.saturating_sub(10),
            KeyCode::PageDown => self.selected = (self.selected + 10).min(Setting::count() - 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(prefs),
            _ => {}
        }
        DialogOutcome::Continue
    }

    /// Toggle booleans, cycle enums, start editing anything else
    fn activate(&mut self, prefs: &SharedPreferences) {
        let Some(setting) = self.selected_setting() else {
            return;
        };
        let kind = setting.spec().kind;
        let current = prefs.borrow().get(setting).clone();

        let next = match (&current, kind) {
            (Value::Boolean(b), _) => Value::Boolean(!b),
            (Value::Enum(v), Kind::Enum { class, .. }) => Value::Enum(class.next_value(*v)),
            (value, kind) => {
                self.editing = Some(value.to_text(&kind));
                return;
            }
        };
        self.apply(prefs, setting, next);
    }

    fn commit(&mut self, prefs: &SharedPreferences) {
        let (Some(setting), Some(text)) = (self.selected_setting(), self.editing.take()) else {
            return;
        };

        if setting.is_accel() {
            if let Err(e) = prefs.borrow_mut().set_accel(setting, Some(text.trim())) {
                self.error = Some(e.to_string());
            }
            return;
        }

        match Value::from_text(text.trim(), &setting.spec().kind) {
            Some(value) => self.apply(prefs, setting, value),
            None => {
                self.error = Some(format!("Invalid {} value \"{}\"", setting.spec().kind.name(), text));
                self.editing = Some(text);
            }
        }
    }

    fn apply(&mut self, prefs: &SharedPreferences, setting: Setting, value: Value) {
        if let Err(e) = prefs.borrow_mut().set(setting, value) {
            warn!("Rejected preference change: {}", e);
            self.error = Some(e.to_string());
        }
    }
}

/// Edit line for a session's custom title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDialog {
    pub window: WindowId,
    pub buffer: String,
}

impl TitleDialog {
    pub fn new(window: WindowId, current: &str) -> Self {
        Self {
            window,
            buffer: current.to_string(),
        }
    }

    /// Enter applies the title (empty restores the dynamic title), Esc cancels
    pub fn handle_key(&mut self, key: &KeyEvent, manager: &mut WindowManager) -> DialogOutcome {
        match key.code {
            KeyCode::Esc => DialogOutcome::Close,
            KeyCode::Enter => {
                if let Some(window) = manager.window(self.window) {
                    let title = Some(self.buffer.trim().to_string()).filter(|t| !t.is_empty());
                    window.borrow_mut().set_active_title(title);
                }
                DialogOutcome::Close
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                DialogOutcome::Continue
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                DialogOutcome::Continue
            }
            _ => DialogOutcome::Continue,
        }
    }
}

/// Lines of the about box
pub fn about_lines() -> Vec<String> {
    vec![
        format!("Terminal {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        "Terminal emulator application shell".to_string(),
        "with tabs, menus and persistent preferences.".to_string(),
        String::new(),
        format!("License: {}", env!("CARGO_PKG_LICENSE")),
        String::new(),
        "Press any key to close".to_string(),
    ]
}

/// Dialog currently shown by the front end
#[derive(Debug)]
pub enum Dialog {
    Preferences(PreferencesDialog),
    Title(TitleDialog),
    About,
}

impl Dialog {
    pub fn handle_key(&mut self, key: &KeyEvent, manager: &mut WindowManager) -> DialogOutcome {
        match self {
            Dialog::Preferences(dialog) => {
                let prefs = manager.preferences().clone();
                dialog.handle_key(key, &prefs)
            }
            Dialog::Title(dialog) => dialog.handle_key(key, manager),
            Dialog::About => DialogOutcome::Close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MainContext;
    use crate::preferences::{Preferences, TitleMode};
    use crossterm::event::KeyModifiers;
    use std::rc::Rc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn select(dialog: &mut PreferencesDialog, setting: Setting) {
        dialog.selected = Setting::all().position(|s| s == setting).unwrap();
    }

    fn type_text(dialog: &mut PreferencesDialog, prefs: &SharedPreferences, text: &str) {
        for c in text.chars() {
            dialog.handle_key(&key(KeyCode::Char(c)), prefs);
        }
    }

    fn prefs() -> SharedPreferences {
        let ctx = Rc::new(MainContext::new());
        Preferences::open(None, &ctx)
    }

    #[test]
    fn test_toggle_boolean_and_cycle_enum() {
        let prefs = prefs();
        let mut dialog = PreferencesDialog::new();

        select(&mut dialog, Setting::MiscCompactDefault);
        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        assert!(prefs.borrow().boolean(Setting::MiscCompactDefault));

        select(&mut dialog, Setting::TitleMode);
        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        assert_eq!(prefs.borrow().enum_value::<TitleMode>(Setting::TitleMode), TitleMode::Hide);
        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        assert_eq!(prefs.borrow().enum_value::<TitleMode>(Setting::TitleMode), TitleMode::Replace);
    }

    #[test]
    fn test_edit_uint_is_clamped() {
        let prefs = prefs();
        let mut dialog = PreferencesDialog::new();
        select(&mut dialog, Setting::ScrollingLines);

        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        assert_eq!(dialog.editing.as_deref(), Some("1000"));
        for _ in 0..4 {
            dialog.handle_key(&key(KeyCode::Backspace), &prefs);
        }
        type_text(&mut dialog, &prefs, "2000000");
        dialog.handle_key(&key(KeyCode::Enter), &prefs);

        assert_eq!(dialog.editing, None);
        assert_eq!(prefs.borrow().uint(Setting::ScrollingLines), 1024 * 1024);
    }

    #[test]
    fn test_bad_color_keeps_editing() {
        let prefs = prefs();
        let mut dialog = PreferencesDialog::new();
        select(&mut dialog, Setting::ColorForeground);

        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        dialog.editing = Some(String::new());
        type_text(&mut dialog, &prefs, "#zz");
        dialog.handle_key(&key(KeyCode::Enter), &prefs);

        assert!(dialog.error.is_some());
        assert_eq!(dialog.editing.as_deref(), Some("#zz"));

        dialog.handle_key(&key(KeyCode::Esc), &prefs);
        assert_eq!(dialog.editing, None);
        assert_eq!(dialog.handle_key(&key(KeyCode::Esc), &prefs), DialogOutcome::Close);
    }

    #[test]
    fn test_empty_accel_is_disabled() {
        let prefs = prefs();
        let mut dialog = PreferencesDialog::new();
        select(&mut dialog, Setting::AccelNewTab);

        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        dialog.editing = Some(String::new());
        dialog.handle_key(&key(KeyCode::Enter), &prefs);
        assert_eq!(prefs.borrow().string(Setting::AccelNewTab), "Disabled");
    }

    #[test]
    fn test_rows_show_every_setting() {
        let prefs = prefs();
        let dialog = PreferencesDialog::new();
        let rows = dialog.rows(&prefs);
        assert_eq!(rows.len(), Setting::count());

        let title_mode = rows.iter().find(|r| r.setting == Setting::TitleMode).unwrap();
        assert_eq!(title_mode.value, "append");
        let bell = rows.iter().find(|r| r.setting == Setting::MiscBellAudible).unwrap();
        assert_eq!(bell.value, "yes");
    }

    #[test]
    fn test_scroll_follows_selection() {
        let mut dialog = PreferencesDialog::new();
        dialog.selected = 12;
        dialog.scroll_to_selection(5);
        assert_eq!(dialog.scroll, 8);
        dialog.selected = 3;
        dialog.scroll_to_selection(5);
        assert_eq!(dialog.scroll, 3);
    }
}
