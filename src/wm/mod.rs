//! Window shell - windows, their notebooks and actions.
//!
//! - **manager**: `WindowManager`, the window factory and event sink
//! - **window**: `TerminalWindow`, one notebook of sessions plus actions
//! - **tab**: `Notebook` holding the pages
//! - **action**: Action identifiers and their sensitivity/toggle state
//! - **menu**: Menubar and popup menu layout
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs      - Module exports
//! ├── manager.rs  - WindowManager (top-level coordinator)
//! ├── window.rs   - TerminalWindow (notebook + actions + deferred dialogs)
//! ├── tab.rs      - Notebook (pages of terminal widgets)
//! ├── action.rs   - Action, ActionGroup
//! └── menu.rs     - MENUBAR, POPUP
//! ```

pub mod action;
pub mod manager;
pub mod menu;
pub mod tab;
pub mod window;

pub use action::{Action, ActionGroup};
pub use manager::{session_factory, DialogRequest, WindowManager};
pub use tab::{Notebook, TabId};
pub use window::{TerminalWindow, WidgetFactory, WindowEvent, WindowId};
