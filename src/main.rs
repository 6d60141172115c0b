//! terminal - a tabbed terminal emulator shell
//!
//! Windows hold a notebook of shell sessions. Menu actions, accelerators
//! and preferences follow the X terminal conventions; preferences persist
//! to `$XDG_CONFIG_HOME/Terminal/terminalrc`.
//!
//! # Quick Start
//!
//! ```text
//! terminal                          # Start with the login shell
//! terminal --geometry=100x30        # First session is 100x30
//! terminal --display=:1             # DISPLAY exported to sessions
//! ```
//!
//! # Default accelerators
//!
//! | Key | Action |
//! |-----|--------|
//! | Ctrl+Shift+T | New tab |
//! | Ctrl+Shift+N | New window |
//! | Ctrl+Shift+W | Close tab |
//! | Ctrl+Shift+Q | Close window |
//! | Ctrl+PageUp/PageDown | Previous/Next tab |
//! | F11 | Fullscreen |
//! | Ctrl+F11 | Compact mode |
//! | F10 | Popup menu |

mod core;
mod options;
mod preferences;
mod ui;
mod wm;

use std::env;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::core::MainContext;
use crate::options::{parse_args, Command, TerminalOptions};
use crate::preferences::{PreferenceChange, Preferences, Setting};
use crate::ui::{
    ContextMenu, Dialog, DialogOutcome, KeyMapper, Keymap, PreferencesDialog, Renderer, ScreenLayout,
    TitleDialog, View,
};
use crate::wm::menu::{menu_at, POPUP};
use crate::wm::{session_factory, DialogRequest, WindowManager};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("terminal {}", VERSION);
}

fn print_usage() {
    eprintln!("Usage: terminal [OPTIONS]");
}

fn print_help() {
    eprintln!("terminal {} - A tabbed terminal emulator", VERSION);
    eprintln!();
    print_usage();
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --display=DISPLAY     X display exported to sessions");
    eprintln!("  --geometry=GEOMETRY   Initial size, COLSxROWS[{{+-}}X{{+-}}Y]");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: $XDG_CONFIG_HOME/Terminal/terminalrc");
    eprintln!("Log level: TERMINAL_LOG (default info)");
}

/// Log to `terminal.log` next to the rc file
fn init_logging() {
    let log_path = preferences::config_dir()
        .map(|dir| dir.join("terminal.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("terminal.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("TERMINAL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_help();
            std::process::exit(0);
        }
        Ok(Command::Version) => {
            print_version();
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("terminal {} starting...", VERSION);

    let mut manager = match launch(&options) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Failed to launch terminal: {}", e);
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    renderer.init()?;

    let mut front_end = FrontEnd::new(&manager);
    let result = front_end.run(&mut manager, &mut renderer);

    manager.shutdown();
    renderer.cleanup()?;
    info!("terminal exiting");
    result
}

/// Build the window manager and open the first window
fn launch(options: &TerminalOptions) -> anyhow::Result<WindowManager> {
    let ctx = Rc::new(MainContext::new());
    let preferences = Preferences::get_default(&ctx);
    let factory = session_factory(&preferences, options.display.clone());
    let mut manager = WindowManager::new(&ctx, &preferences, factory);

    let (width, height) = Renderer::size()?;
    manager.allocate(width as u32, height.saturating_sub(1) as u32);
    manager.launch_with_options(options)?;
    Ok(manager)
}

/// Input state of the crossterm front end
struct FrontEnd {
    keymap: Keymap,
    mapper: KeyMapper,
    changes: Receiver<PreferenceChange>,
    menu: ContextMenu,
    dialog: Option<Dialog>,
    notice: Option<String>,
    /// Body row where a drag selection started
    selection_anchor: Option<usize>,
    dirty: bool,
}

impl FrontEnd {
    fn new(manager: &WindowManager) -> Self {
        let mut prefs = manager.preferences().borrow_mut();
        Self {
            keymap: Keymap::from_preferences(&prefs),
            mapper: KeyMapper::from_preferences(&prefs),
            changes: prefs.subscribe(),
            menu: ContextMenu::new(),
            dialog: None,
            notice: None,
            selection_anchor: None,
            dirty: true,
        }
    }

    fn run(&mut self, manager: &mut WindowManager, renderer: &mut Renderer) -> anyhow::Result<()> {
        let poll_timeout = Duration::from_millis(10);

        loop {
            if manager.iteration() {
                self.dirty = true;
            }
            if !manager.is_running() {
                info!("All windows closed");
                break;
            }

            self.apply_preference_changes(manager);
            self.take_requests(manager);

            if self.dirty {
                self.render(manager, renderer)?;
                self.dirty = false;
            }

            if event::poll(poll_timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(&key, manager)?,
                    Event::Mouse(mouse) => self.handle_mouse(&mouse, manager)?,
                    Event::Resize(width, height) => {
                        manager.allocate(width as u32, height.saturating_sub(1) as u32);
                    }
                    _ => continue,
                }
                self.dirty = true;
            }
        }
        Ok(())
    }

    /// Rebuild the keymap and key mapper when their settings change
    fn apply_preference_changes(&mut self, manager: &WindowManager) {
        let mut accels = false;
        let mut bindings = false;
        for change in self.changes.try_iter() {
            accels |= change.setting.is_accel();
            bindings |= matches!(change.setting, Setting::BindingBackspace | Setting::BindingDelete);
            self.dirty = true;
        }

        let prefs = manager.preferences().borrow();
        if accels {
            self.keymap = Keymap::from_preferences(&prefs);
        }
        if bindings {
            self.mapper = KeyMapper::from_preferences(&prefs);
        }
    }

    /// Open queued dialogs and pick up notices
    fn take_requests(&mut self, manager: &mut WindowManager) {
        if let Some(notice) = manager.take_notice() {
            self.notice = Some(notice);
            self.dirty = true;
        }
        if self.dialog.is_some() {
            return;
        }
        let Some(request) = manager.take_dialog() else {
            return;
        };

        self.menu.hide();
        self.dialog = Some(match request {
            DialogRequest::Preferences(_) => Dialog::Preferences(PreferencesDialog::new()),
            DialogRequest::SetTitle(id) => {
                let current = manager
                    .window(id)
                    .and_then(|w| {
                        let window = w.borrow();
                        window.active_widget().map(|a| a.title())
                    })
                    .unwrap_or_default();
                Dialog::Title(TitleDialog::new(id, &current))
            }
            DialogRequest::About(_) => Dialog::About,
        });
        self.dirty = true;
    }

    fn render(&self, manager: &WindowManager, renderer: &mut Renderer) -> anyhow::Result<()> {
        let Some(window) = manager.active_window() else {
            return Ok(());
        };
        let window = window.borrow();
        let view = View {
            window: &window,
            window_position: manager.window_position(),
            preferences: manager.preferences(),
            menu: Some(&self.menu),
            dialog: self.dialog.as_ref(),
            notice: self.notice.as_deref(),
        };
        renderer.render(&view)?;
        Ok(())
    }

    fn layout(manager: &WindowManager) -> anyhow::Result<Option<ScreenLayout>> {
        let (_, height) = Renderer::size()?;
        let layout = manager.active_window().map(|w| {
            let window = w.borrow();
            ScreenLayout::compute(&window, height)
        });
        Ok(layout)
    }

    fn show_popup(&mut self, manager: &WindowManager, x: u16, y: u16) -> anyhow::Result<()> {
        let Some(window) = manager.active_window() else {
            return Ok(());
        };
        let (width, height) = Renderer::size()?;
        let window = window.borrow();
        self.menu.show(POPUP, window.actions(), &self.keymap, x, y, width, height);
        Ok(())
    }

    fn handle_key(&mut self, key: &KeyEvent, manager: &mut WindowManager) -> anyhow::Result<()> {
        self.notice = None;

        if let Some(dialog) = self.dialog.as_mut() {
            if dialog.handle_key(key, manager) == DialogOutcome::Close {
                self.dialog = None;
            } else if let Dialog::Preferences(prefs_dialog) = dialog {
                let (_, height) = Renderer::size()?;
                prefs_dialog.scroll_to_selection((height as usize).saturating_sub(6));
            }
            return Ok(());
        }

        if self.menu.visible {
            match key.code {
                KeyCode::Esc => self.menu.hide(),
                KeyCode::Up | KeyCode::Char('k') => self.menu.up(),
                KeyCode::Down | KeyCode::Char('j') => self.menu.down(),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let action = self.menu.selected_action();
                    self.menu.hide();
                    if let Some(action) = action {
                        manager.activate(action);
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        let no_menukey = manager.preferences().borrow().boolean(Setting::ShortcutsNoMenukey);
        if key.code == KeyCode::F(10) && !no_menukey {
            let top = Self::layout(manager)?.map_or(0, |l| l.body_top);
            return self.show_popup(manager, 0, top);
        }

        if let Some(action) = self.keymap.lookup(key) {
            manager.activate(action);
            return Ok(());
        }

        if let Some(bytes) = self.mapper.map(key) {
            if let Some(window) = manager.active_window() {
                window.borrow_mut().feed_input(&bytes);
            }
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, manager: &mut WindowManager) -> anyhow::Result<()> {
        if self.dialog.is_some() {
            return Ok(());
        }
        let (col, row) = (mouse.column, mouse.row);

        if self.menu.visible {
            match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.menu.update_hover(col, row);
                }
                MouseEventKind::Down(MouseButton::Left) => {
                    let action = self.menu.handle_click(col, row);
                    self.menu.hide();
                    if let Some(action) = action {
                        manager.activate(action);
                    }
                }
                MouseEventKind::Down(_) => self.menu.hide(),
                _ => {}
            }
            return Ok(());
        }

        let Some(layout) = Self::layout(manager)? else {
            return Ok(());
        };
        let Some(window) = manager.active_window() else {
            return Ok(());
        };
        let body = layout.body_top..layout.body_top + layout.body_rows;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) => self.show_popup(manager, col, row)?,
            MouseEventKind::Down(MouseButton::Left) => {
                if Some(row) == layout.menubar_row {
                    if let Some(menu) = menu_at(col) {
                        let (width, height) = Renderer::size()?;
                        let window = window.borrow();
                        self.menu.show(
                            menu.entries,
                            window.actions(),
                            &self.keymap,
                            col.saturating_sub(1),
                            row + 1,
                            width,
                            height,
                        );
                    }
                } else if Some(row) == layout.tab_row {
                    let index = ui::renderer::tab_at(&window.borrow(), col);
                    if let Some(index) = index {
                        window.borrow_mut().set_current_page(index);
                    }
                } else if row == layout.status_row {
                    manager.focus_next_window();
                } else if body.contains(&row) {
                    let line = (row - layout.body_top) as usize;
                    self.selection_anchor = Some(line);
                    window.borrow_mut().select_rows(line, line);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(anchor) = self.selection_anchor {
                    let last = layout.body_rows.saturating_sub(1) as usize;
                    let line = (row.saturating_sub(layout.body_top) as usize).min(last);
                    window.borrow_mut().select_rows(anchor.min(line), anchor.max(line));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.selection_anchor = None,
            _ => {}
        }
        Ok(())
    }
}
