//! TerminalWindow - a notebook of terminal sessions plus its actions
//!
//! ```text
//! +--------------------------------------+
//! | File  Edit  View  Terminal  Help     |  menubar (hidden in compact mode)
//! | [bash] [vim]                         |  tab bar (only with > 1 page)
//! |                                      |
//! |  active session                      |
//! +--------------------------------------+
//! ```
//!
//! Page count drives the window state: adding a page always shows it and
//! copies the grid size of the previously active page; removing the last
//! page destroys the window. Dialog actions are deferred to an idle task so
//! the dialog is never built from inside action dispatch.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::Sender;

use tracing::{debug, info};

use super::action::{Action, ActionGroup};
use super::tab::{Notebook, TabId};
use crate::core::{LaunchError, MainContext, Priority, SourceId, TerminalWidget};
use crate::preferences::{Setting, SharedPreferences};

/// Unique identifier for a window
pub type WindowId = u64;

/// Builds the widget for a new page
pub type WidgetFactory = Rc<dyn Fn() -> Box<dyn TerminalWidget>>;

/// Events a window sends to its manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// The user asked for another window
    NewWindow(WindowId),
    Destroyed(WindowId),
    ShowPreferences(WindowId),
    SetTitle(WindowId),
    ShowAbout(WindowId),
}

/// Deferred dialog kinds, one pending idle task each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Preferences,
    Title,
    About,
}

pub struct TerminalWindow {
    id: WindowId,
    ctx: Rc<MainContext>,
    self_ref: Weak<RefCell<TerminalWindow>>,
    events: Sender<WindowEvent>,
    factory: WidgetFactory,
    notebook: Notebook,
    actions: ActionGroup,
    title: String,
    /// Size in geometry-hint units (cells for the crossterm front end)
    size: (u32, u32),
    decorated: bool,
    menubar_visible: bool,
    fullscreen: bool,
    destroyed: bool,
    prefs_idle_id: Option<SourceId>,
    title_idle_id: Option<SourceId>,
    about_idle_id: Option<SourceId>,
}

impl TerminalWindow {
    /// Create an empty window. Compact mode starts from `misc-compact-default`.
    pub fn new(
        id: WindowId,
        ctx: &Rc<MainContext>,
        preferences: &SharedPreferences,
        factory: WidgetFactory,
        events: Sender<WindowEvent>,
    ) -> Rc<RefCell<Self>> {
        let compact = preferences.borrow().boolean(Setting::MiscCompactDefault);

        let window = Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                id,
                ctx: ctx.clone(),
                self_ref: weak.clone(),
                events,
                factory,
                notebook: Notebook::new(),
                actions: ActionGroup::new(),
                title: String::new(),
                size: (0, 0),
                decorated: true,
                menubar_visible: true,
                fullscreen: false,
                destroyed: false,
                prefs_idle_id: None,
                title_idle_id: None,
                about_idle_id: None,
            })
        });
        window.borrow_mut().set_compact(compact);
        window
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn actions(&self) -> &ActionGroup {
        &self.actions
    }

    pub fn geometry(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    pub fn menubar_visible(&self) -> bool {
        self.menubar_visible
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Rows taken by the menubar and the tab bar
    pub fn chrome_rows(&self) -> u32 {
        self.menubar_visible as u32 + self.notebook.show_tabs() as u32
    }

    pub fn active_widget(&self) -> Option<&dyn TerminalWidget> {
        self.notebook.current_widget()
    }

    pub fn active_widget_mut(&mut self) -> Option<&mut (dyn TerminalWidget + 'static)> {
        self.notebook.current_widget_mut()
    }

    /// Add a page for `widget` and make it current
    pub fn add(&mut self, mut widget: Box<dyn TerminalWidget>) -> TabId {
        let mut force_grid = None;
        if let Some(active) = self.notebook.current_widget() {
            let (cols, rows) = active.grid_size();
            widget.set_grid_size(cols, rows);
            force_grid = Some((cols, rows));
        }

        let id = self.notebook.append(widget);
        if let Some(index) = self.notebook.index_of(id) {
            self.notebook.set_current_page(index);
        }

        self.notebook.set_show_tabs(self.notebook.len() > 1);
        self.set_size_force_grid(force_grid);
        self.notify_page();
        debug!("Window {}: added tab {} ({} pages)", self.id, id, self.notebook.len());
        id
    }

    /// Remove a page; removing the last one destroys the window
    pub fn remove(&mut self, tab: TabId) {
        if self.notebook.remove(tab).is_none() {
            return;
        }
        debug!("Window {}: removed tab {}", self.id, tab);

        if self.notebook.is_empty() {
            self.destroy();
            return;
        }

        self.notebook.set_show_tabs(self.notebook.len() > 1);
        self.set_size_force_grid(None);
        self.notify_page();
    }

    /// Build a page through the factory and start its child
    pub fn new_tab(&mut self) -> Result<TabId, LaunchError> {
        let widget = (self.factory)();
        let id = self.add(widget);

        let launched = match self.notebook.widget_mut(id) {
            Some(widget) => widget.launch_child(),
            None => Ok(()),
        };
        if let Err(e) = launched {
            self.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Window size for the active grid, plus chrome rows
    fn set_size_force_grid(&mut self, force_grid: Option<(u16, u16)>) {
        let chrome = self.chrome_rows();
        let Some(active) = self.notebook.current_widget_mut() else {
            return;
        };
        if let Some((cols, rows)) = force_grid {
            active.set_grid_size(cols, rows);
        }

        let hints = active.geometry_hints();
        let (cols, rows) = active.grid_size();
        let (width, height) = hints.size_for_grid(cols, rows);
        self.size = (width, height + chrome * hints.height_inc);
    }

    /// The front end resized the window; every page gets the new grid
    pub fn allocate(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        let chrome = self.chrome_rows();
        for page in self.notebook.pages_mut() {
            let hints = page.widget.geometry_hints();
            let body = height.saturating_sub(chrome * hints.height_inc);
            let (cols, rows) = hints.grid_for_size(width, body);
            page.widget.set_grid_size(cols, rows);
        }
    }

    /// Current page changed
    fn notify_page(&mut self) {
        if let Some(active) = self.notebook.current_widget() {
            self.title = active.title();
            self.update_actions();
        }
    }

    /// Refresh sensitivity of the page-dependent actions
    pub fn update_actions(&mut self) {
        let Some(page) = self.notebook.current_page() else {
            return;
        };
        let n_pages = self.notebook.len();
        let has_selection = self
            .notebook
            .current_widget()
            .map(|w| w.has_selection())
            .unwrap_or(false);

        self.actions.set_sensitive(Action::PrevTab, page > 0);
        self.actions.set_sensitive(Action::NextTab, page + 1 < n_pages);
        self.actions.set_sensitive(Action::Copy, has_selection);
    }

    /// Switch to page `index`
    pub fn set_current_page(&mut self, index: usize) {
        if self.notebook.set_current_page(index) {
            self.notify_page();
        }
    }

    /// Select rows of the active session
    pub fn select_rows(&mut self, first: usize, last: usize) {
        if let Some(widget) = self.notebook.current_widget_mut() {
            widget.select_rows(first, last);
        }
        self.update_actions();
    }

    /// Send input to the active session
    pub fn feed_input(&mut self, bytes: &[u8]) {
        if let Some(widget) = self.notebook.current_widget_mut() {
            widget.feed_input(bytes);
        }
    }

    /// Set or clear the custom title of the active session
    pub fn set_active_title(&mut self, title: Option<String>) {
        if let Some(widget) = self.notebook.current_widget_mut() {
            widget.set_custom_title(title);
        }
        self.notify_page();
    }

    /// Pump child output of every page, follow title changes and reap exited
    /// children. Returns true if anything needs redrawing.
    pub fn process_output(&mut self) -> bool {
        let mut changed = false;
        let mut dead = Vec::new();
        for page in self.notebook.pages_mut() {
            if page.widget.process_output() {
                changed = true;
            }
            if !page.widget.is_alive() {
                dead.push(page.id);
            }
        }

        if changed {
            if let Some(active) = self.notebook.current_widget() {
                let title = active.title();
                if title != self.title {
                    self.title = title;
                }
            }
        }

        for tab in dead {
            info!("Window {}: child of tab {} exited", self.id, tab);
            self.remove(tab);
            changed = true;
        }
        changed
    }

    /// Run `action`. Insensitive actions are ignored.
    pub fn activate(&mut self, action: Action) -> Result<(), LaunchError> {
        if self.destroyed {
            return Ok(());
        }
        if !self.actions.is_sensitive(action) {
            debug!("Window {}: ignoring insensitive action {}", self.id, action.name());
            return Ok(());
        }
        debug!("Window {}: action {}", self.id, action.name());

        match action {
            Action::NewTab => {
                self.new_tab()?;
            }
            Action::NewWindow => self.emit(WindowEvent::NewWindow(self.id)),
            Action::CloseTab => {
                if let Some(tab) = self.notebook.current_id() {
                    self.remove(tab);
                }
            }
            Action::CloseWindow => self.destroy(),
            Action::Copy => {
                if let Some(widget) = self.notebook.current_widget_mut() {
                    widget.copy_clipboard();
                }
            }
            Action::Paste => {
                if let Some(widget) = self.notebook.current_widget_mut() {
                    widget.paste_clipboard();
                }
            }
            Action::Preferences => self.defer(Deferred::Preferences),
            Action::SetTitle => self.defer(Deferred::Title),
            Action::About => self.defer(Deferred::About),
            Action::Fullscreen => {
                let active = !self.actions.is_active(Action::Fullscreen);
                self.actions.set_active(Action::Fullscreen, active);
                self.fullscreen = active;
            }
            Action::CompactMode => {
                let active = !self.actions.is_active(Action::CompactMode);
                self.set_compact(active);
                self.set_size_force_grid(None);
            }
            Action::PrevTab => {
                if self.notebook.prev_page() {
                    self.notify_page();
                }
            }
            Action::NextTab => {
                if self.notebook.next_page() {
                    self.notify_page();
                }
            }
            Action::Reset | Action::ResetAndClear => {
                if let Some(widget) = self.notebook.current_widget_mut() {
                    widget.reset(action == Action::ResetAndClear);
                }
            }
        }
        Ok(())
    }

    fn set_compact(&mut self, compact: bool) {
        self.actions.set_active(Action::CompactMode, compact);
        self.decorated = !compact;
        self.menubar_visible = !compact;
    }

    fn idle_slot(&mut self, kind: Deferred) -> &mut Option<SourceId> {
        match kind {
            Deferred::Preferences => &mut self.prefs_idle_id,
            Deferred::Title => &mut self.title_idle_id,
            Deferred::About => &mut self.about_idle_id,
        }
    }

    /// Queue the dialog request unless one of the same kind is pending
    fn defer(&mut self, kind: Deferred) {
        if self.idle_slot(kind).is_some() {
            return;
        }

        let weak = self.self_ref.clone();
        let id = self.ctx.idle_add(Priority::Low, move || {
            let Some(window) = weak.upgrade() else {
                return;
            };
            let mut window = window.borrow_mut();
            *window.idle_slot(kind) = None;
            let event = match kind {
                Deferred::Preferences => WindowEvent::ShowPreferences(window.id),
                Deferred::Title => WindowEvent::SetTitle(window.id),
                Deferred::About => WindowEvent::ShowAbout(window.id),
            };
            window.emit(event);
        });
        *self.idle_slot(kind) = Some(id);
    }

    fn emit(&self, event: WindowEvent) {
        if self.events.send(event).is_err() {
            debug!("Window {}: no manager listening for {:?}", self.id, event);
        }
    }

    /// Drop pending idle tasks
    fn dispose(&mut self) {
        for kind in [Deferred::Preferences, Deferred::Title, Deferred::About] {
            if let Some(id) = self.idle_slot(kind).take() {
                self.ctx.remove(id);
            }
        }
    }

    /// Close every page and tell the manager the window is gone
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.dispose();
        self.notebook.clear();
        info!("Window {} destroyed", self.id);
        self.emit(WindowEvent::Destroyed(self.id));
    }
}

impl Drop for TerminalWindow {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::GeometryHints;
    use crate::preferences::{Preferences, Value};
    use std::sync::mpsc::{self, Receiver};

    /// Observable state of a [`MockWidget`]
    #[derive(Debug, Default)]
    pub struct MockState {
        pub grid: (u16, u16),
        pub title: String,
        pub custom_title: Option<String>,
        pub selection: bool,
        pub copies: usize,
        pub pastes: usize,
        pub resets: Vec<bool>,
        pub input: Vec<u8>,
        pub alive: bool,
        pub fail_launch: bool,
        pub launched: bool,
    }

    pub struct MockWidget(pub Rc<RefCell<MockState>>);

    impl MockWidget {
        pub fn new(cols: u16, rows: u16, title: &str) -> (Self, Rc<RefCell<MockState>>) {
            let state = Rc::new(RefCell::new(MockState {
                grid: (cols, rows),
                title: title.to_string(),
                alive: true,
                ..Default::default()
            }));
            (Self(state.clone()), state)
        }
    }

    pub const HINTS: GeometryHints = GeometryHints {
        base_width: 2,
        base_height: 2,
        width_inc: 8,
        height_inc: 16,
    };

    impl TerminalWidget for MockWidget {
        fn grid_size(&self) -> (u16, u16) {
            self.0.borrow().grid
        }
        fn set_grid_size(&mut self, cols: u16, rows: u16) {
            self.0.borrow_mut().grid = (cols, rows);
        }
        fn geometry_hints(&self) -> GeometryHints {
            HINTS
        }
        fn title(&self) -> String {
            let state = self.0.borrow();
            state.custom_title.clone().unwrap_or_else(|| state.title.clone())
        }
        fn set_custom_title(&mut self, title: Option<String>) {
            self.0.borrow_mut().custom_title = title;
        }
        fn has_selection(&self) -> bool {
            self.0.borrow().selection
        }
        fn copy_clipboard(&mut self) {
            self.0.borrow_mut().copies += 1;
        }
        fn paste_clipboard(&mut self) {
            self.0.borrow_mut().pastes += 1;
        }
        fn reset(&mut self, clear: bool) {
            self.0.borrow_mut().resets.push(clear);
        }
        fn launch_child(&mut self) -> Result<(), LaunchError> {
            let mut state = self.0.borrow_mut();
            if state.fail_launch {
                return Err(LaunchError::NoCommand);
            }
            state.launched = true;
            Ok(())
        }
        fn is_alive(&self) -> bool {
            self.0.borrow().alive
        }
        fn feed_input(&mut self, bytes: &[u8]) {
            self.0.borrow_mut().input.extend_from_slice(bytes);
        }
        fn select_rows(&mut self, _first: usize, _last: usize) {
            self.0.borrow_mut().selection = true;
        }
    }

    /// Factory producing 80x24 mock widgets and recording their state
    pub fn mock_factory() -> (WidgetFactory, Rc<RefCell<Vec<Rc<RefCell<MockState>>>>>) {
        let created = Rc::new(RefCell::new(Vec::new()));
        let record = created.clone();
        let factory: WidgetFactory = Rc::new(move || {
            let (widget, state) = MockWidget::new(80, 24, "new");
            record.borrow_mut().push(state);
            Box::new(widget) as Box<dyn TerminalWidget>
        });
        (factory, created)
    }

    struct Fixture {
        ctx: Rc<MainContext>,
        window: Rc<RefCell<TerminalWindow>>,
        events: Receiver<WindowEvent>,
        created: Rc<RefCell<Vec<Rc<RefCell<MockState>>>>>,
    }

    fn fixture_with(compact: bool) -> Fixture {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        prefs
            .borrow_mut()
            .set(Setting::MiscCompactDefault, Value::Boolean(compact))
            .unwrap();
        let (factory, created) = mock_factory();
        let (tx, rx) = mpsc::channel();
        let window = TerminalWindow::new(1, &ctx, &prefs, factory, tx);
        Fixture {
            ctx,
            window,
            events: rx,
            created,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(false)
    }

    fn add_mock(window: &Rc<RefCell<TerminalWindow>>, cols: u16, rows: u16, title: &str) -> (TabId, Rc<RefCell<MockState>>) {
        let (widget, state) = MockWidget::new(cols, rows, title);
        let id = window.borrow_mut().add(Box::new(widget));
        (id, state)
    }

    fn drain(rx: &Receiver<WindowEvent>) -> Vec<WindowEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_removing_only_session_destroys_window() {
        let f = fixture();
        let (tab, _) = add_mock(&f.window, 80, 24, "bash");

        f.window.borrow_mut().remove(tab);

        assert!(f.window.borrow().is_destroyed());
        assert_eq!(drain(&f.events), vec![WindowEvent::Destroyed(1)]);
    }

    #[test]
    fn test_removing_one_of_two_hides_tabs_and_resizes() {
        let f = fixture();
        let (first, _) = add_mock(&f.window, 100, 30, "one");
        add_mock(&f.window, 40, 10, "two");

        {
            let window = f.window.borrow();
            assert!(window.notebook().show_tabs());
            // new page took the grid of the previously active one
            assert_eq!(window.active_widget().map(|w| w.grid_size()), Some((100, 30)));
            assert_eq!(window.chrome_rows(), 2);
        }

        f.window.borrow_mut().remove(first);

        let window = f.window.borrow();
        assert!(!window.is_destroyed());
        assert!(!window.notebook().show_tabs());
        let (w, h) = HINTS.size_for_grid(100, 30);
        // menubar row remains
        assert_eq!(window.geometry(), (w, h + HINTS.height_inc));
    }

    #[test]
    fn test_add_shows_new_page_and_follows_title() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "first");
        assert_eq!(f.window.borrow().title(), "first");

        add_mock(&f.window, 80, 24, "second");
        assert_eq!(f.window.borrow().notebook().current_page(), Some(1));
        assert_eq!(f.window.borrow().title(), "second");

        f.window.borrow_mut().activate(Action::PrevTab).unwrap();
        assert_eq!(f.window.borrow().title(), "first");
    }

    #[test]
    fn test_action_sensitivity() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "a");
        let (_, second) = add_mock(&f.window, 80, 24, "b");

        {
            let window = f.window.borrow();
            assert!(window.actions().is_sensitive(Action::PrevTab));
            assert!(!window.actions().is_sensitive(Action::NextTab));
            assert!(!window.actions().is_sensitive(Action::Copy));
        }

        // copy is ignored while nothing is selected
        f.window.borrow_mut().activate(Action::Copy).unwrap();
        assert_eq!(second.borrow().copies, 0);

        f.window.borrow_mut().select_rows(0, 0);
        assert!(f.window.borrow().actions().is_sensitive(Action::Copy));
        f.window.borrow_mut().activate(Action::Copy).unwrap();
        assert_eq!(second.borrow().copies, 1);

        // next-tab is insensitive on the last page
        f.window.borrow_mut().activate(Action::NextTab).unwrap();
        assert_eq!(f.window.borrow().notebook().current_page(), Some(1));
    }

    #[test]
    fn test_dialogs_are_deferred_once() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "a");

        f.window.borrow_mut().activate(Action::Preferences).unwrap();
        f.window.borrow_mut().activate(Action::Preferences).unwrap();
        f.window.borrow_mut().activate(Action::About).unwrap();
        assert!(drain(&f.events).is_empty());
        assert_eq!(f.ctx.pending(), 2);

        f.ctx.run_pending();
        assert_eq!(
            drain(&f.events),
            vec![WindowEvent::ShowPreferences(1), WindowEvent::ShowAbout(1)]
        );

        // guard cleared once the task ran
        f.window.borrow_mut().activate(Action::SetTitle).unwrap();
        f.window.borrow_mut().activate(Action::Preferences).unwrap();
        f.ctx.run_pending();
        assert_eq!(
            drain(&f.events),
            vec![WindowEvent::SetTitle(1), WindowEvent::ShowPreferences(1)]
        );
    }

    #[test]
    fn test_destroy_cancels_pending_dialogs() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "a");

        f.window.borrow_mut().activate(Action::About).unwrap();
        f.window.borrow_mut().activate(Action::CloseWindow).unwrap();

        assert_eq!(f.ctx.pending(), 0);
        assert_eq!(f.ctx.run_pending(), 0);
        assert_eq!(drain(&f.events), vec![WindowEvent::Destroyed(1)]);
    }

    #[test]
    fn test_dropping_window_cancels_pending_dialogs() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "a");
        f.window.borrow_mut().activate(Action::SetTitle).unwrap();

        drop(f.window);
        assert_eq!(f.ctx.run_pending(), 0);
        assert!(drain(&f.events).is_empty());
    }

    #[test]
    fn test_compact_mode_from_preferences_and_toggle() {
        let f = fixture_with(true);
        add_mock(&f.window, 80, 24, "a");
        {
            let window = f.window.borrow();
            assert!(window.actions().is_active(Action::CompactMode));
            assert!(!window.menubar_visible());
            assert!(!window.is_decorated());
            assert_eq!(window.geometry(), HINTS.size_for_grid(80, 24));
        }

        f.window.borrow_mut().activate(Action::CompactMode).unwrap();
        let window = f.window.borrow();
        assert!(window.menubar_visible());
        let (w, h) = HINTS.size_for_grid(80, 24);
        assert_eq!(window.geometry(), (w, h + HINTS.height_inc));
    }

    #[test]
    fn test_new_tab_and_new_window() {
        let f = fixture();
        add_mock(&f.window, 120, 40, "a");

        f.window.borrow_mut().activate(Action::NewTab).unwrap();
        {
            let created = f.created.borrow();
            assert_eq!(created.len(), 1);
            assert!(created[0].borrow().launched);
            assert_eq!(created[0].borrow().grid, (120, 40));
        }
        assert_eq!(f.window.borrow().notebook().len(), 2);

        f.window.borrow_mut().activate(Action::NewWindow).unwrap();
        assert_eq!(drain(&f.events), vec![WindowEvent::NewWindow(1)]);
    }

    #[test]
    fn test_failed_new_tab_is_removed() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let factory: WidgetFactory = Rc::new(|| {
            let (widget, state) = MockWidget::new(80, 24, "broken");
            state.borrow_mut().fail_launch = true;
            Box::new(widget) as Box<dyn TerminalWidget>
        });
        let (tx, _rx) = mpsc::channel();
        let window = TerminalWindow::new(7, &ctx, &prefs, factory, tx);
        add_mock(&window, 80, 24, "ok");

        let result = window.borrow_mut().activate(Action::NewTab);
        assert!(matches!(result, Err(LaunchError::NoCommand)));
        assert_eq!(window.borrow().notebook().len(), 1);
        assert_eq!(window.borrow().title(), "ok");
    }

    #[test]
    fn test_reset_paste_and_fullscreen() {
        let f = fixture();
        let (_, state) = add_mock(&f.window, 80, 24, "a");

        f.window.borrow_mut().activate(Action::Reset).unwrap();
        f.window.borrow_mut().activate(Action::ResetAndClear).unwrap();
        f.window.borrow_mut().activate(Action::Paste).unwrap();
        assert_eq!(state.borrow().resets, vec![false, true]);
        assert_eq!(state.borrow().pastes, 1);

        f.window.borrow_mut().activate(Action::Fullscreen).unwrap();
        assert!(f.window.borrow().is_fullscreen());
        f.window.borrow_mut().activate(Action::Fullscreen).unwrap();
        assert!(!f.window.borrow().is_fullscreen());
    }

    #[test]
    fn test_exited_child_is_reaped() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "a");
        let (_, second) = add_mock(&f.window, 80, 24, "b");

        second.borrow_mut().alive = false;
        assert!(f.window.borrow_mut().process_output());
        assert_eq!(f.window.borrow().notebook().len(), 1);
        assert_eq!(f.window.borrow().title(), "a");
    }

    #[test]
    fn test_allocate_sets_grid_on_every_page() {
        let f = fixture();
        let (_, a) = add_mock(&f.window, 80, 24, "a");
        let (_, b) = add_mock(&f.window, 80, 24, "b");

        // menubar + tab bar
        let (w, h) = HINTS.size_for_grid(50, 20);
        f.window.borrow_mut().allocate(w, h + 2 * HINTS.height_inc);
        assert_eq!(a.borrow().grid, (50, 20));
        assert_eq!(b.borrow().grid, (50, 20));
    }

    #[test]
    fn test_custom_title() {
        let f = fixture();
        add_mock(&f.window, 80, 24, "bash");
        f.window.borrow_mut().set_active_title(Some("build".into()));
        assert_eq!(f.window.borrow().title(), "build");
        f.window.borrow_mut().set_active_title(None);
        assert_eq!(f.window.borrow().title(), "bash");
    }
}
