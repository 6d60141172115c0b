//! Menubar and popup menu layout

use super::action::Action;

/// An entry of a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Item(Action),
    Separator,
}

/// A top-level menu of the menubar
#[derive(Debug, Clone, Copy)]
pub struct Menu {
    pub label: &'static str,
    pub entries: &'static [MenuEntry],
}

use MenuEntry::{Item, Separator};

/// Menubar shown above the notebook unless the window is in compact mode
pub static MENUBAR: [Menu; 5] = [
    Menu {
        label: "File",
        entries: &[
            Item(Action::NewTab),
            Item(Action::NewWindow),
            Separator,
            Item(Action::CloseTab),
            Item(Action::CloseWindow),
        ],
    },
    Menu {
        label: "Edit",
        entries: &[
            Item(Action::Copy),
            Item(Action::Paste),
            Separator,
            Item(Action::Preferences),
        ],
    },
    Menu {
        label: "View",
        entries: &[Item(Action::CompactMode), Item(Action::Fullscreen)],
    },
    Menu {
        label: "Terminal",
        entries: &[
            Item(Action::PrevTab),
            Item(Action::NextTab),
            Separator,
            Item(Action::SetTitle),
            Item(Action::Reset),
            Item(Action::ResetAndClear),
        ],
    },
    Menu {
        label: "Help",
        entries: &[Item(Action::About)],
    },
];

/// Popup menu opened on the active session
pub static POPUP: &[MenuEntry] = &[
    Item(Action::NewWindow),
    Item(Action::NewTab),
    Separator,
    Item(Action::CloseTab),
    Separator,
    Item(Action::Copy),
    Item(Action::Paste),
    Separator,
    Item(Action::CompactMode),
    Item(Action::Fullscreen),
    Item(Action::Preferences),
];

/// Column of each menubar label when drawn as ` File  Edit  View ...`
pub fn menubar_columns() -> Vec<(u16, &'static Menu)> {
    let mut col = 1u16;
    MENUBAR
        .iter()
        .map(|menu| {
            let at = col;
            col += menu.label.len() as u16 + 2;
            (at, menu)
        })
        .collect()
}

/// Menu whose label covers column `col` of the menubar row
pub fn menu_at(col: u16) -> Option<&'static Menu> {
    menubar_columns()
        .into_iter()
        .find(|(at, menu)| col >= *at && col < at + menu.label.len() as u16)
        .map(|(_, menu)| menu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(entries: &[MenuEntry]) -> Vec<Action> {
        entries
            .iter()
            .filter_map(|e| match e {
                Item(a) => Some(*a),
                Separator => None,
            })
            .collect()
    }

    #[test]
    fn test_menubar_covers_every_action_once() {
        let all: Vec<Action> = MENUBAR.iter().flat_map(|m| actions(m.entries)).collect();
        let unique: std::collections::HashSet<Action> = all.iter().copied().collect();
        assert_eq!(all.len(), Action::ALL.len());
        assert_eq!(unique.len(), Action::ALL.len());
    }

    #[test]
    fn test_popup_starts_with_new_window() {
        assert_eq!(actions(POPUP).first(), Some(&Action::NewWindow));
        assert!(!actions(POPUP).contains(&Action::About));
    }

    #[test]
    fn test_menu_at_column() {
        assert_eq!(menu_at(1).map(|m| m.label), Some("File"));
        assert_eq!(menu_at(7).map(|m| m.label), Some("Edit"));
        assert!(menu_at(0).is_none());
        assert!(menu_at(5).is_none());
    }
}
