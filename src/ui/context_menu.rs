//! Popup menu for the active session.
//!
//! Opened by a right click on the session area, or by F10 unless
//! `shortcuts-no-menukey` is set. The same widget also shows the entries of a
//! menubar menu when one of its labels is clicked.
//!
//! # Example
//!
//! ```ignore
//! let mut menu = ContextMenu::new();
//! menu.show(POPUP, &window.actions(), &keymap, click_x, click_y, width, height);
//! menu.down();
//! let action = menu.selected_action();
//! ```

use crate::ui::accel::Keymap;
use crate::wm::menu::MenuEntry;
use crate::wm::{Action, ActionGroup};

/// A single row of the menu
#[derive(Debug, Clone)]
pub enum MenuItem {
    Action {
        action: Action,
        /// Accelerator hint, e.g. "Ctrl+Shift+T"
        shortcut: Option<String>,
        sensitive: bool,
        /// `Some` for toggle actions
        active: Option<bool>,
    },
    Separator,
}

impl MenuItem {
    fn is_selectable(&self) -> bool {
        matches!(self, MenuItem::Action { sensitive: true, .. })
    }

    /// Text of the row without borders
    pub fn text(&self) -> String {
        match self {
            MenuItem::Separator => String::new(),
            MenuItem::Action { action, shortcut, active, .. } => {
                let mark = match active {
                    Some(true) => "[x] ",
                    Some(false) => "[ ] ",
                    None => "",
                };
                match shortcut {
                    Some(s) => format!("{}{} ({})", mark, action.label(), s),
                    None => format!("{}{}", mark, action.label()),
                }
            }
        }
    }
}

/// Context menu state and behavior.
pub struct ContextMenu {
    /// Whether the menu is currently visible.
    pub visible: bool,
    /// X position of the menu (screen coordinates).
    pub x: u16,
    /// Y position of the menu (screen coordinates).
    pub y: u16,
    /// Index of the currently selected/highlighted item.
    pub selected: usize,
    pub items: Vec<MenuItem>,
}

impl Default for ContextMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextMenu {
    pub fn new() -> Self {
        Self {
            visible: false,
            x: 0,
            y: 0,
            selected: 0,
            items: Vec::new(),
        }
    }

    /// Fill the menu from `entries` and show it at the given position,
    /// kept inside the screen
    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        entries: &[MenuEntry],
        actions: &ActionGroup,
        keymap: &Keymap,
        x: u16,
        y: u16,
        screen_width: u16,
        screen_height: u16,
    ) {
        self.items = entries
            .iter()
            .map(|entry| match *entry {
                MenuEntry::Separator => MenuItem::Separator,
                MenuEntry::Item(action) => MenuItem::Action {
                    action,
                    shortcut: keymap.accel_for(action).map(|a| a.to_string()),
                    sensitive: actions.is_sensitive(action),
                    active: action.is_toggle().then(|| actions.is_active(action)),
                },
            })
            .collect();
        self.visible = true;
        self.selected = self.items.iter().position(MenuItem::is_selectable).unwrap_or(0);

        let (width, height) = self.dimensions();
        self.x = x.min(screen_width.saturating_sub(width));
        self.y = y.min(screen_height.saturating_sub(height));
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    fn step(&mut self, forward: bool) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let mut index = self.selected;
        for _ in 0..len {
            index = if forward { (index + 1) % len } else { (index + len - 1) % len };
            if self.items[index].is_selectable() {
                self.selected = index;
                return;
            }
        }
    }

    /// Move selection up, skipping separators and insensitive items
    pub fn up(&mut self) {
        self.step(false);
    }

    /// Move selection down, skipping separators and insensitive items
    pub fn down(&mut self) {
        self.step(true);
    }

    /// Action of the highlighted row, if it can be activated
    pub fn selected_action(&self) -> Option<Action> {
        match self.items.get(self.selected)? {
            MenuItem::Action { action, sensitive: true, .. } => Some(*action),
            _ => None,
        }
    }

    /// Get menu content width (excluding borders)
    pub fn content_width(&self) -> u16 {
        self.items
            .iter()
            .map(|item| item.text().chars().count() + 2)
            .max()
            .unwrap_or(18) as u16
    }

    /// Get menu dimensions (including borders)
    pub fn dimensions(&self) -> (u16, u16) {
        (self.content_width() + 2, self.items.len() as u16 + 2)
    }

    fn item_at(&self, col: u16, row: u16) -> Option<usize> {
        let (width, height) = self.dimensions();
        if col < self.x || col >= self.x + width || row <= self.y || row >= self.y + height - 1 {
            return None;
        }
        Some((row - self.y - 1) as usize)
    }

    /// Handle click inside menu, returns action if a sensitive item was clicked
    pub fn handle_click(&mut self, col: u16, row: u16) -> Option<Action> {
        let index = self.item_at(col, row)?;
        if !self.items[index].is_selectable() {
            return None;
        }
        self.selected = index;
        self.selected_action()
    }

    /// Update selection based on mouse hover position.
    /// Returns true if selection changed.
    pub fn update_hover(&mut self, col: u16, row: u16) -> bool {
        match self.item_at(col, row) {
            Some(index) if index != self.selected && self.items[index].is_selectable() => {
                self.selected = index;
                true
            }
            _ => false,
        }
    }
}
