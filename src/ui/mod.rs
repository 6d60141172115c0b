//! User interface rendering and input handling.
//!
//! - **renderer**: Menubar, tab bar, session lines, status line and overlays
//! - **accel**: Accelerator strings from the `accel-*` preferences
//! - **keymapper**: Keyboard input to session byte sequence mapping
//! - **context_menu**: Popup menu for window actions
//! - **dialog**: Preferences, Set Title and About dialogs

pub mod accel;
pub mod context_menu;
pub mod dialog;
pub mod keymapper;
pub mod renderer;

pub use accel::Keymap;
pub use context_menu::ContextMenu;
pub use dialog::{Dialog, DialogOutcome, PreferencesDialog, TitleDialog};
pub use keymapper::KeyMapper;
pub use renderer::{Renderer, ScreenLayout, View};
