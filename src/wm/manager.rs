//! Window Manager - creates windows and reacts to their events
//!
//! Windows report back over an mpsc channel; the manager is the only place
//! that opens new windows, forgets destroyed ones and turns deferred dialog
//! requests into work for the front end.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{error, info, warn};

use super::action::Action;
use super::window::{TerminalWindow, WidgetFactory, WindowEvent, WindowId};
use crate::core::{LaunchError, MainContext, SessionConfig, ShellSession, TerminalWidget};
use crate::options::TerminalOptions;
use crate::preferences::SharedPreferences;

/// Dialog the front end should open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogRequest {
    Preferences(WindowId),
    SetTitle(WindowId),
    About(WindowId),
}

/// Factory building [`ShellSession`]s from the current preferences
pub fn session_factory(preferences: &SharedPreferences, display: Option<String>) -> WidgetFactory {
    let preferences = preferences.clone();
    Rc::new(move || {
        let config = SessionConfig::from_preferences(&preferences.borrow(), display.as_deref());
        Box::new(ShellSession::new(config)) as Box<dyn TerminalWidget>
    })
}

pub struct WindowManager {
    ctx: Rc<MainContext>,
    preferences: SharedPreferences,
    factory: WidgetFactory,
    windows: Vec<Rc<RefCell<TerminalWindow>>>,
    /// Window shown by the front end
    active: Option<WindowId>,
    next_window_id: WindowId,
    events_tx: Sender<WindowEvent>,
    events_rx: Receiver<WindowEvent>,
    dialogs: VecDeque<DialogRequest>,
    notices: VecDeque<String>,
    /// Size handed to new windows
    screen: Option<(u32, u32)>,
}

impl WindowManager {
    pub fn new(ctx: &Rc<MainContext>, preferences: &SharedPreferences, factory: WidgetFactory) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            ctx: ctx.clone(),
            preferences: preferences.clone(),
            factory,
            windows: Vec::new(),
            active: None,
            next_window_id: 1,
            events_tx,
            events_rx,
            dialogs: VecDeque::new(),
            notices: VecDeque::new(),
            screen: None,
        }
    }

    pub fn preferences(&self) -> &SharedPreferences {
        &self.preferences
    }

    /// Open the initial window. Failure here is fatal for the caller.
    pub fn launch_with_options(&mut self, options: &TerminalOptions) -> Result<WindowId, LaunchError> {
        let grid = options.geometry.and_then(|g| g.grid());
        if let Some(geometry) = &options.geometry {
            if geometry.x.is_some() {
                info!("Ignoring window position in geometry {:?}", geometry);
            }
        }
        self.open_window(grid)
    }

    /// Open a window with one session, optionally forcing its grid size
    pub fn open_window(&mut self, grid: Option<(u16, u16)>) -> Result<WindowId, LaunchError> {
        let id = self.next_window_id;
        self.next_window_id += 1;

        let window = TerminalWindow::new(
            id,
            &self.ctx,
            &self.preferences,
            self.factory.clone(),
            self.events_tx.clone(),
        );

        let mut widget = (self.factory)();
        if let Some((cols, rows)) = grid {
            widget.set_grid_size(cols, rows);
        }

        let result = {
            let mut window = window.borrow_mut();
            let tab = window.add(widget);
            if let Some((width, height)) = self.screen.filter(|_| grid.is_none()) {
                window.allocate(width, height);
            }
            let launched = match window.active_widget_mut() {
                Some(widget) => widget.launch_child(),
                None => Ok(()),
            };
            if launched.is_err() {
                window.remove(tab);
            }
            launched
        };

        // a failed window destroyed itself; forget its event
        self.windows.push(window);
        self.dispatch_events();
        result?;

        info!("Opened window {}", id);
        self.active = Some(id);
        Ok(id)
    }

    pub fn window(&self, id: WindowId) -> Option<Rc<RefCell<TerminalWindow>>> {
        self.windows.iter().find(|w| w.borrow().id() == id).cloned()
    }

    pub fn active_window_id(&self) -> Option<WindowId> {
        self.active
    }

    pub fn active_window(&self) -> Option<Rc<RefCell<TerminalWindow>>> {
        self.active.and_then(|id| self.window(id))
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Index of the active window and the window count
    pub fn window_position(&self) -> (usize, usize) {
        let index = self
            .active
            .and_then(|id| self.windows.iter().position(|w| w.borrow().id() == id))
            .unwrap_or(0);
        (index, self.windows.len())
    }

    /// Show the next window
    pub fn focus_next_window(&mut self) {
        let (index, count) = self.window_position();
        if count > 1 {
            self.active = Some(self.windows[(index + 1) % count].borrow().id());
        }
    }

    /// Run `action` on the active window
    pub fn activate(&mut self, action: Action) {
        let Some(window) = self.active_window() else {
            return;
        };
        let result = window.borrow_mut().activate(action);
        if let Err(e) = result {
            error!("Failed to launch terminal: {}", e);
            self.notices.push_back(format!("Failed to launch terminal: {}", e));
        }
        self.dispatch_events();
    }

    /// Handle queued window events
    pub fn dispatch_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                WindowEvent::NewWindow(source) => {
                    let grid = self.window(source).and_then(|w| {
                        let window = w.borrow();
                        window.active_widget().map(|a| a.grid_size())
                    });
                    if let Err(e) = self.open_window(grid) {
                        error!("Failed to open window: {}", e);
                        self.notices.push_back(format!("Failed to open window: {}", e));
                    }
                }
                WindowEvent::Destroyed(id) => self.forget(id),
                WindowEvent::ShowPreferences(id) => {
                    self.dialogs.push_back(DialogRequest::Preferences(id))
                }
                WindowEvent::SetTitle(id) => self.dialogs.push_back(DialogRequest::SetTitle(id)),
                WindowEvent::ShowAbout(id) => self.dialogs.push_back(DialogRequest::About(id)),
            }
        }
    }

    fn forget(&mut self, id: WindowId) {
        let Some(index) = self.windows.iter().position(|w| w.borrow().id() == id) else {
            return;
        };
        self.windows.remove(index);
        self.dialogs.retain(|d| match d {
            DialogRequest::Preferences(w) | DialogRequest::SetTitle(w) | DialogRequest::About(w) => {
                *w != id
            }
        });

        if self.active == Some(id) {
            let next = index.min(self.windows.len().saturating_sub(1));
            self.active = self.windows.get(next).map(|w| w.borrow().id());
        }
        info!("Window {} closed, {} left", id, self.windows.len());
    }

    /// One turn of the loop: child output, idle tasks, window events.
    /// Returns true if something needs redrawing.
    pub fn iteration(&mut self) -> bool {
        let mut changed = false;
        for window in self.windows.clone() {
            if window.borrow_mut().process_output() {
                changed = true;
            }
        }
        self.dispatch_events();

        while self.ctx.iteration() {
            changed = true;
        }
        self.dispatch_events();
        changed
    }

    pub fn is_running(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Front end size changed
    pub fn allocate(&mut self, width: u32, height: u32) {
        self.screen = Some((width, height));
        for window in &self.windows {
            window.borrow_mut().allocate(width, height);
        }
    }

    pub fn take_dialog(&mut self) -> Option<DialogRequest> {
        self.dialogs.pop_front()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notices.pop_front()
    }

    /// Close every window and flush pending idle work such as a queued store
    pub fn shutdown(&mut self) {
        for window in self.windows.clone() {
            window.borrow_mut().destroy();
        }
        self.dispatch_events();

        let flushed = self.ctx.run_pending();
        if flushed > 0 {
            info!("Flushed {} pending tasks at shutdown", flushed);
        }
        if !self.windows.is_empty() {
            warn!("{} windows still open after shutdown", self.windows.len());
        }
    }
}
