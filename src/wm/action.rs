//! Window actions
//!
//! Every menu item and shortcut maps to one [`Action`]. The window keeps an
//! [`ActionGroup`] holding per-action sensitivity and toggle state.

use crate::preferences::Setting;

/// One entry of the window's dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewTab,
    NewWindow,
    CloseTab,
    CloseWindow,
    Copy,
    Paste,
    Preferences,
    Fullscreen,
    CompactMode,
    PrevTab,
    NextTab,
    SetTitle,
    Reset,
    ResetAndClear,
    About,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::NewTab,
        Action::NewWindow,
        Action::CloseTab,
        Action::CloseWindow,
        Action::Copy,
        Action::Paste,
        Action::Preferences,
        Action::Fullscreen,
        Action::CompactMode,
        Action::PrevTab,
        Action::NextTab,
        Action::SetTitle,
        Action::Reset,
        Action::ResetAndClear,
        Action::About,
    ];

    /// Action identifier
    pub fn name(self) -> &'static str {
        match self {
            Action::NewTab => "new-tab",
            Action::NewWindow => "new-window",
            Action::CloseTab => "close-tab",
            Action::CloseWindow => "close-window",
            Action::Copy => "copy",
            Action::Paste => "paste",
            Action::Preferences => "preferences",
            Action::Fullscreen => "fullscreen",
            Action::CompactMode => "compact-mode",
            Action::PrevTab => "prev-tab",
            Action::NextTab => "next-tab",
            Action::SetTitle => "set-title",
            Action::Reset => "reset",
            Action::ResetAndClear => "reset-and-clear",
            Action::About => "about",
        }
    }

    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Menu label
    pub fn label(self) -> &'static str {
        match self {
            Action::NewTab => "Open Tab",
            Action::NewWindow => "Open Terminal",
            Action::CloseTab => "Close Tab",
            Action::CloseWindow => "Close Window",
            Action::Copy => "Copy",
            Action::Paste => "Paste",
            Action::Preferences => "Preferences...",
            Action::Fullscreen => "Fullscreen",
            Action::CompactMode => "Compact Mode",
            Action::PrevTab => "Previous Tab",
            Action::NextTab => "Next Tab",
            Action::SetTitle => "Set Title...",
            Action::Reset => "Reset",
            Action::ResetAndClear => "Reset and Clear",
            Action::About => "About",
        }
    }

    /// Preference holding the accelerator for this action
    pub fn accel_setting(self) -> Option<Setting> {
        match self {
            Action::NewTab => Some(Setting::AccelNewTab),
            Action::NewWindow => Some(Setting::AccelNewWindow),
            Action::CloseTab => Some(Setting::AccelCloseTab),
            Action::CloseWindow => Some(Setting::AccelCloseWindow),
            Action::Copy => Some(Setting::AccelCopy),
            Action::Paste => Some(Setting::AccelPaste),
            Action::Preferences => Some(Setting::AccelPreferences),
            Action::Fullscreen => Some(Setting::AccelFullscreen),
            Action::CompactMode => Some(Setting::AccelCompactMode),
            Action::PrevTab => Some(Setting::AccelPrevTab),
            Action::NextTab => Some(Setting::AccelNextTab),
            Action::Reset => Some(Setting::AccelReset),
            Action::ResetAndClear => Some(Setting::AccelResetAndClear),
            Action::SetTitle | Action::About => None,
        }
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, Action::Fullscreen | Action::CompactMode)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Sensitivity and toggle state of every action
#[derive(Debug, Clone)]
pub struct ActionGroup {
    sensitive: [bool; Action::ALL.len()],
    active: [bool; Action::ALL.len()],
}

impl Default for ActionGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionGroup {
    /// All actions sensitive, all toggles off
    pub fn new() -> Self {
        Self {
            sensitive: [true; Action::ALL.len()],
            active: [false; Action::ALL.len()],
        }
    }

    pub fn is_sensitive(&self, action: Action) -> bool {
        self.sensitive[action.index()]
    }

    pub fn set_sensitive(&mut self, action: Action, sensitive: bool) {
        self.sensitive[action.index()] = sensitive;
    }

    /// Toggle state; always false for plain actions
    pub fn is_active(&self, action: Action) -> bool {
        action.is_toggle() && self.active[action.index()]
    }

    pub fn set_active(&mut self, action: Action, active: bool) {
        if action.is_toggle() {
            self.active[action.index()] = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_resolvable() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("split"), None);
    }

    #[test]
    fn test_accel_settings_are_accels() {
        for action in Action::ALL {
            if let Some(setting) = action.accel_setting() {
                assert!(setting.is_accel(), "{}", action.name());
            }
        }
        assert_eq!(Action::About.accel_setting(), None);
    }

    #[test]
    fn test_toggles_only_for_toggle_actions() {
        let mut group = ActionGroup::new();
        group.set_active(Action::Copy, true);
        assert!(!group.is_active(Action::Copy));

        group.set_active(Action::CompactMode, true);
        assert!(group.is_active(Action::CompactMode));

        group.set_sensitive(Action::PrevTab, false);
        assert!(!group.is_sensitive(Action::PrevTab));
        assert!(group.is_sensitive(Action::NextTab));
    }
}
