//! Terminal widget seen by the window shell.
//!
//! A window hosts one widget per notebook page and only talks to it through
//! this trait. [`crate::core::session::ShellSession`] is the implementation
//! used by the binary; tests use a recording mock.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("No command to run")]
    NoCommand,

    #[error("Failed to execute child process \"{command}\": {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to set up child process I/O: {0}")]
    Io(#[source] io::Error),
}

/// Size hints used to turn a character grid into a window size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHints {
    pub base_width: u32,
    pub base_height: u32,
    pub width_inc: u32,
    pub height_inc: u32,
}

impl Default for GeometryHints {
    fn default() -> Self {
        Self {
            base_width: 0,
            base_height: 0,
            width_inc: 1,
            height_inc: 1,
        }
    }
}

impl GeometryHints {
    /// Pixel size needed to show `cols` x `rows`
    pub fn size_for_grid(&self, cols: u16, rows: u16) -> (u32, u32) {
        (
            self.base_width + self.width_inc * cols as u32,
            self.base_height + self.height_inc * rows as u32,
        )
    }

    /// Largest grid that fits in `width` x `height`, at least 1x1
    pub fn grid_for_size(&self, width: u32, height: u32) -> (u16, u16) {
        let cols = width.saturating_sub(self.base_width) / self.width_inc.max(1);
        let rows = height.saturating_sub(self.base_height) / self.height_inc.max(1);
        (
            cols.clamp(1, u16::MAX as u32) as u16,
            rows.clamp(1, u16::MAX as u32) as u16,
        )
    }
}

/// One terminal session hosted in a notebook page
pub trait TerminalWidget {
    /// Grid size in columns and rows
    fn grid_size(&self) -> (u16, u16);

    fn set_grid_size(&mut self, cols: u16, rows: u16);

    fn geometry_hints(&self) -> GeometryHints;

    /// Title shown in the tab and, for the active page, the window
    fn title(&self) -> String;

    /// Title set by the user; `None` restores the dynamic title
    fn set_custom_title(&mut self, title: Option<String>);

    fn has_selection(&self) -> bool;

    fn copy_clipboard(&mut self);

    fn paste_clipboard(&mut self);

    /// Reset terminal state; `clear` also drops the scrollback
    fn reset(&mut self, clear: bool);

    /// Start the child process
    fn launch_child(&mut self) -> Result<(), LaunchError>;

    /// Pull pending child output. Returns true if anything changed.
    fn process_output(&mut self) -> bool {
        false
    }

    /// False once the child has exited
    fn is_alive(&self) -> bool {
        true
    }

    /// Send input bytes to the child
    fn feed_input(&mut self, _bytes: &[u8]) {}

    /// Lines to display, oldest first, at most `rows`
    fn visible_lines(&self, _rows: usize) -> Vec<String> {
        Vec::new()
    }

    /// Select the text on the given visible rows (inclusive)
    fn select_rows(&mut self, _first: usize, _last: usize) {}
}
