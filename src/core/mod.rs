//! Core components shared by the window shell.
//!
//! - **mainloop**: Single-threaded idle queue used for deferred work
//! - **widget**: The terminal widget collaborator seen by windows
//! - **session**: A widget running a child shell over pipes
//!
//! # Architecture
//!
//! ```text
//! MainContext (idle tasks, debounced persist)
//! TerminalWindow
//! └── Notebook
//!     └── Box<dyn TerminalWidget>  (ShellSession)
//!         ├── Child process (stdin/stdout/stderr pipes)
//!         └── Reader threads -> mpsc -> process_output()
//! ```

pub mod mainloop;
pub mod session;
pub mod widget;

pub use mainloop::{MainContext, Priority, SourceId};
pub use session::{SessionConfig, ShellSession};
pub use widget::{GeometryHints, LaunchError, TerminalWidget};
