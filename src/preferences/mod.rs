//! Preferences registry persisted to `~/.config/Terminal/terminalrc`.
//!
//! - **settings**: the compile-time table (name, kind, default)
//! - **value**: values and their rc-file text encoding
//! - **rc**: the INI-style resource file
//!
//! # Lifecycle
//!
//! ```text
//! get_default() ── first call ──> defaults ──> load() ──> shared handle
//!                                                  │
//! set() ── changed? ──> notify subscribers ──> schedule store (Low idle)
//!                                                  │
//!                                next loop turn ──> persist()
//! ```
//!
//! Bursts of `set` calls before the loop runs again coalesce into one write.

pub mod rc;
pub mod settings;
pub mod value;

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::mainloop::{MainContext, Priority, SourceId};
use self::rc::RcFile;
pub use self::settings::{
    Background, EraseBinding, Kind, Scrollbar, Setting, SettingEnum, TitleMode, DISABLED_ACCEL,
    MAX_SCROLLING_LINES,
};
pub use self::value::{option_name, Color, Value};

/// Group holding all settings in the rc file
pub const CONFIG_GROUP: &str = "Configuration";

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Unable to open terminal preferences at {path}: {source}")]
    ConfigUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to load property \"{name}\" from {text:?}")]
    ValueConversion { name: &'static str, text: String },

    #[error("Unknown setting \"{0}\"")]
    UnknownSetting(String),

    #[error("Setting \"{name}\" expects a {expected} value, got {found}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Value {value} is not a member of {class} for \"{name}\"")]
    InvalidEnumValue {
        name: &'static str,
        class: &'static str,
        value: i32,
    },
}

pub type Result<T> = std::result::Result<T, PreferencesError>;

/// Change notification sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceChange {
    pub setting: Setting,
    pub value: Value,
}

/// Shared handle to the registry
pub type SharedPreferences = Rc<RefCell<Preferences>>;

thread_local! {
    static DEFAULT_PREFERENCES: RefCell<Weak<RefCell<Preferences>>> = RefCell::new(Weak::new());
}

/// Typed settings registry
pub struct Preferences {
    /// Current values, indexed by `Setting as usize`
    values: Vec<Value>,
    /// rc file location; `None` keeps everything in memory
    path: Option<PathBuf>,
    ctx: Rc<MainContext>,
    /// Weak self reference captured by the store task
    self_ref: Weak<RefCell<Preferences>>,
    observers: Vec<Sender<PreferenceChange>>,
    /// Pending store task, `None` when nothing is queued
    store_idle_id: Option<SourceId>,
    loading_in_progress: bool,
}

impl Preferences {
    /// Process-wide shared instance, created and loaded on first call.
    ///
    /// The instance lives as long as some handle does; a call after the
    /// last handle dropped creates and loads a fresh one.
    pub fn get_default(ctx: &Rc<MainContext>) -> SharedPreferences {
        Self::shared_at(default_config_path(), ctx)
    }

    /// [`Preferences::get_default`] backed by `path` when no instance is alive
    fn shared_at(path: Option<PathBuf>, ctx: &Rc<MainContext>) -> SharedPreferences {
        DEFAULT_PREFERENCES.with(|slot| {
            if let Some(existing) = slot.borrow().upgrade() {
                return existing;
            }
            let preferences = Self::open(path, ctx);
            *slot.borrow_mut() = Rc::downgrade(&preferences);
            preferences
        })
    }

    /// Create a registry with built-in defaults, then overlay `path` if given
    pub fn open(path: Option<PathBuf>, ctx: &Rc<MainContext>) -> SharedPreferences {
        let preferences = Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                values: Setting::all().map(|s| s.spec().kind.default_value()).collect(),
                path,
                ctx: ctx.clone(),
                self_ref: weak.clone(),
                observers: Vec::new(),
                store_idle_id: None,
                loading_in_progress: false,
            })
        });
        preferences.borrow_mut().load();
        preferences
    }

    /// Current value of `setting`
    pub fn get(&self, setting: Setting) -> &Value {
        &self.values[setting as usize]
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Value> {
        let setting =
            Setting::from_name(name).ok_or_else(|| PreferencesError::UnknownSetting(name.to_string()))?;
        Ok(self.get(setting))
    }

    pub fn string(&self, setting: Setting) -> &str {
        self.get(setting).as_str().unwrap_or_default()
    }

    pub fn boolean(&self, setting: Setting) -> bool {
        self.get(setting).as_bool().unwrap_or_default()
    }

    pub fn uint(&self, setting: Setting) -> u32 {
        match self.get(setting) {
            Value::Uint(u) => *u,
            _ => 0,
        }
    }

    pub fn double(&self, setting: Setting) -> f64 {
        match self.get(setting) {
            Value::Double(d) => *d,
            _ => 0.0,
        }
    }

    pub fn color(&self, setting: Setting) -> Color {
        match self.get(setting) {
            Value::Color(c) => *c,
            _ => Color::default(),
        }
    }

    /// Typed enum value; falls back to the class default member
    pub fn enum_value<T: SettingEnum>(&self, setting: Setting) -> T {
        match self.get(setting) {
            Value::Enum(v) => T::from_value(*v).unwrap_or_else(T::first),
            _ => T::first(),
        }
    }

    /// Validate and store `value`.
    ///
    /// Returns `Ok(true)` when the stored value changed, in which case
    /// subscribers are notified and a store is scheduled.
    pub fn set(&mut self, setting: Setting, value: Value) -> Result<bool> {
        let value = validate(setting, value)?;
        if self.values[setting as usize] == value {
            return Ok(false);
        }

        self.values[setting as usize] = value;
        if !self.loading_in_progress {
            debug!("{} = {}", setting.name(), self.values[setting as usize]);
            self.notify(setting);
            self.schedule_store();
        }
        Ok(true)
    }

    pub fn set_by_name(&mut self, name: &str, value: Value) -> Result<bool> {
        let setting =
            Setting::from_name(name).ok_or_else(|| PreferencesError::UnknownSetting(name.to_string()))?;
        self.set(setting, value)
    }

    /// Set an accelerator; `None` or an empty string stores `Disabled`
    pub fn set_accel(&mut self, setting: Setting, accel: Option<&str>) -> Result<bool> {
        let accel = match accel {
            Some(a) if !a.is_empty() => a,
            _ => DISABLED_ACCEL,
        };
        self.set(setting, Value::String(accel.to_string()))
    }

    /// Register an observer; dropped receivers are pruned on the next change
    pub fn subscribe(&mut self) -> Receiver<PreferenceChange> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, setting: Setting) {
        let change = PreferenceChange {
            setting,
            value: self.values[setting as usize].clone(),
        };
        self.observers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    /// Whether a debounced store is queued
    pub fn is_store_pending(&self) -> bool {
        self.store_idle_id.is_some()
    }

    fn schedule_store(&mut self) {
        if self.store_idle_id.is_some() || self.loading_in_progress {
            return;
        }

        let weak = self.self_ref.clone();
        let id = self.ctx.idle_add(Priority::Low, move || {
            let Some(preferences) = weak.upgrade() else {
                return;
            };
            let mut preferences = preferences.borrow_mut();
            preferences.store_idle_id = None;
            if let Err(e) = preferences.persist() {
                warn!("Unable to store terminal preferences: {}", e);
            }
        });
        self.store_idle_id = Some(id);
    }

    /// Overlay values from the rc file. Failures leave defaults in place.
    pub fn load(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };

        let rc = match RcFile::open_read(&path) {
            Ok(rc) => rc,
            Err(source) => {
                warn!("{}", PreferencesError::ConfigUnavailable { path, source });
                return;
            }
        };

        self.loading_in_progress = true;
        let mut loaded = 0;
        for setting in Setting::all() {
            let spec = setting.spec();
            let option = option_name(spec.name);

            // fall back to the raw property name used by older versions
            let text = rc
                .read_entry(CONFIG_GROUP, &option)
                .or_else(|| rc.read_entry(CONFIG_GROUP, spec.name));
            let Some(text) = text else {
                continue;
            };

            match Value::from_text(text, &spec.kind) {
                Some(value) => match self.set(setting, value) {
                    Ok(_) => loaded += 1,
                    Err(e) => warn!("{}", e),
                },
                None => warn!(
                    "{}",
                    PreferencesError::ValueConversion {
                        name: spec.name,
                        text: text.to_string(),
                    }
                ),
            }
        }
        self.loading_in_progress = false;

        info!("Loaded {} preferences from {}", loaded, path.display());
    }

    /// Rewrite the `[Configuration]` group with every setting
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let unavailable = |source| PreferencesError::ConfigUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut rc = RcFile::open_write(path).map_err(unavailable)?;
        rc.delete_group(CONFIG_GROUP);
        for setting in Setting::all() {
            let spec = setting.spec();
            let text = self.get(setting).to_text(&spec.kind);
            rc.write_entry(CONFIG_GROUP, &option_name(spec.name), &text);
        }
        rc.save().map_err(unavailable)?;

        debug!("Stored preferences to {}", path.display());
        Ok(())
    }
}

impl Drop for Preferences {
    fn drop(&mut self) {
        if let Some(id) = self.store_idle_id.take() {
            self.ctx.remove(id);
        }
    }
}

/// Check `value` against the declared kind, clamping numeric ranges
fn validate(setting: Setting, value: Value) -> Result<Value> {
    let spec = setting.spec();
    let mismatch = |found: &Value| PreferencesError::TypeMismatch {
        name: spec.name,
        expected: spec.kind.name(),
        found: found.kind_name(),
    };

    match (&spec.kind, value) {
        (Kind::String { .. }, v @ Value::String(_)) => Ok(v),
        (Kind::Boolean { .. }, v @ Value::Boolean(_)) => Ok(v),
        (Kind::Color { .. }, v @ Value::Color(_)) => Ok(v),
        (Kind::Enum { class, .. }, Value::Enum(v)) => {
            if class.contains(v) {
                Ok(Value::Enum(v))
            } else {
                Err(PreferencesError::InvalidEnumValue {
                    name: spec.name,
                    class: class.name,
                    value: v,
                })
            }
        }
        (Kind::Double { min, max, .. }, Value::Double(d)) => {
            let d = if d.is_nan() { *min } else { d.clamp(*min, *max) };
            Ok(Value::Double(d))
        }
        (Kind::Uint { min, max, .. }, Value::Uint(u)) => Ok(Value::Uint(u.clamp(*min, *max))),
        (_, other) => Err(mismatch(&other)),
    }
}

/// `$XDG_CONFIG_HOME/Terminal/terminalrc`, else `$HOME/.config/Terminal/terminalrc`
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("terminalrc"))
}

/// Directory holding the rc file and the log
pub fn config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))?;
    Some(base.join("Terminal"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn open_in(dir: &tempfile::TempDir) -> (Rc<MainContext>, SharedPreferences, PathBuf) {
        let ctx = Rc::new(MainContext::new());
        let path = dir.path().join("terminalrc");
        let prefs = Preferences::open(Some(path.clone()), &ctx);
        (ctx, prefs, path)
    }

    #[test]
    fn test_defaults() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let prefs = prefs.borrow();

        assert_eq!(prefs.string(Setting::AccelNewTab), "<control><shift>t");
        assert_eq!(prefs.uint(Setting::ScrollingLines), 1000);
        assert_eq!(prefs.double(Setting::BackgroundDarkness), 0.5);
        assert_eq!(prefs.color(Setting::ColorForeground), Color::WHITE);
        assert_eq!(prefs.enum_value::<TitleMode>(Setting::TitleMode), TitleMode::Append);
        assert!(prefs.boolean(Setting::CommandUpdateRecords));
    }

    #[test]
    fn test_set_notifies_once_and_schedules_one_store() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let rx = prefs.borrow_mut().subscribe();

        let value = Value::String("<control>t".to_string());
        assert!(prefs.borrow_mut().set(Setting::AccelNewTab, value.clone()).unwrap());
        assert!(!prefs.borrow_mut().set(Setting::AccelNewTab, value.clone()).unwrap());

        let changes: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![PreferenceChange { setting: Setting::AccelNewTab, value }]
        );
        assert_eq!(ctx.pending(), 1);
        assert!(prefs.borrow().is_store_pending());
    }

    #[test]
    fn test_burst_of_sets_coalesces_into_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, prefs, path) = open_in(&dir);

        for lines in [10, 20, 30] {
            prefs.borrow_mut().set(Setting::ScrollingLines, Value::Uint(lines)).unwrap();
        }
        prefs.borrow_mut().set(Setting::FontName, Value::String("Mono 9".into())).unwrap();
        assert_eq!(ctx.pending(), 1);
        assert!(!path.exists());

        assert_eq!(ctx.run_pending(), 1);
        assert!(!prefs.borrow().is_store_pending());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ScrollingLines=30\n"));
        assert!(text.contains("FontName=Mono 9\n"));
    }

    #[test]
    fn test_scrolling_lines_clamped() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let mut prefs = prefs.borrow_mut();

        prefs.set(Setting::ScrollingLines, Value::Uint(2_000_000)).unwrap();
        assert_eq!(prefs.uint(Setting::ScrollingLines), MAX_SCROLLING_LINES);
        prefs.set(Setting::ScrollingLines, Value::Uint(0)).unwrap();
        assert_eq!(prefs.uint(Setting::ScrollingLines), 0);

        prefs.set(Setting::BackgroundDarkness, Value::Double(4.0)).unwrap();
        assert_eq!(prefs.double(Setting::BackgroundDarkness), 1.0);
    }

    #[test]
    fn test_set_rejects_wrong_kind_and_unknown_names() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let mut prefs = prefs.borrow_mut();

        assert!(matches!(
            prefs.set(Setting::ScrollingLines, Value::Boolean(true)),
            Err(PreferencesError::TypeMismatch { .. })
        ));
        assert!(matches!(
            prefs.set(Setting::TitleMode, Value::Enum(42)),
            Err(PreferencesError::InvalidEnumValue { .. })
        ));
        assert!(matches!(
            prefs.get_by_name("no-such-thing"),
            Err(PreferencesError::UnknownSetting(_))
        ));
        assert!(!prefs.is_store_pending());
    }

    #[test]
    fn test_set_accel_none_is_disabled() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let mut prefs = prefs.borrow_mut();

        prefs.set_accel(Setting::AccelCopy, None).unwrap();
        assert_eq!(prefs.string(Setting::AccelCopy), DISABLED_ACCEL);
    }

    #[test]
    fn test_new_tab_accel_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, prefs, path) = open_in(&dir);
        let rx = prefs.borrow_mut().subscribe();

        prefs
            .borrow_mut()
            .set_by_name("accel-new-tab", Value::String("<control>t".into()))
            .unwrap();
        assert_eq!(rx.try_iter().count(), 1);

        prefs.borrow().persist().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[Configuration]\n"));
        assert!(text.contains("AccelNewTab=<control>t\n"));

        let fresh = Preferences::open(Some(path), &ctx);
        assert_eq!(
            fresh.borrow().get_by_name("accel-new-tab").unwrap(),
            &Value::String("<control>t".into())
        );
    }

    #[test]
    fn test_round_trip_every_kind() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, prefs, path) = open_in(&dir);
        {
            let mut p = prefs.borrow_mut();
            p.set(Setting::WordChars, Value::String("a-z=#\\\t".into())).unwrap();
            p.set(Setting::TitleInitial, Value::String("  Term  ".into())).unwrap();
            p.set(Setting::CommandCustom, Value::String("vim\nAccelNewTab=Disabled".into())).unwrap();
            p.set(Setting::CommandLoginShell, Value::Boolean(true)).unwrap();
            p.set(Setting::MiscBellAudible, Value::Boolean(false)).unwrap();
            p.set(Setting::ScrollingBar, Value::Enum(Scrollbar::Left.value())).unwrap();
            p.set(Setting::BackgroundDarkness, Value::Double(0.123456789)).unwrap();
            p.set(Setting::ScrollingLines, Value::Uint(4242)).unwrap();
            p.set(Setting::ColorBackground, Value::Color(Color::new(0x1234, 0xabcd, 0xff00))).unwrap();
            p.persist().unwrap();
        }

        let fresh = Preferences::open(Some(path), &ctx);
        let fresh = fresh.borrow();
        let orig = prefs.borrow();
        for setting in Setting::all() {
            if setting == Setting::ColorBackground {
                continue;
            }
            assert_eq!(fresh.get(setting), orig.get(setting), "{}", setting.name());
        }
        // an embedded newline must not shadow a real key
        assert_eq!(fresh.string(Setting::AccelNewTab), orig.string(Setting::AccelNewTab));
        // colors keep 8 bits per channel
        assert_eq!(
            fresh.color(Setting::ColorBackground),
            Color::from_rgb8(0x12, 0xab, 0xff)
        );
    }

    #[test]
    fn test_load_fallbacks_and_legacy_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terminalrc");
        fs::write(
            &path,
            "[Configuration]\n\
             TitleMode=bogus\n\
             MiscBellAudible=FALSE\n\
             MiscCursorBlinks=\n\
             ScrollingLines=2000000\n\
             ColorForeground=not-a-color\n\
             font-name=Legacy 8\n",
        )
        .unwrap();

        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(Some(path), &ctx);
        let prefs = prefs.borrow();

        assert_eq!(prefs.enum_value::<TitleMode>(Setting::TitleMode), TitleMode::Replace);
        assert!(!prefs.boolean(Setting::MiscBellAudible));
        assert!(prefs.boolean(Setting::MiscCursorBlinks));
        assert_eq!(prefs.uint(Setting::ScrollingLines), MAX_SCROLLING_LINES);
        assert_eq!(prefs.color(Setting::ColorForeground), Color::WHITE);
        assert_eq!(prefs.string(Setting::FontName), "Legacy 8");
        // loading neither notifies nor schedules a store
        assert_eq!(ctx.pending(), 0);
    }

    #[test]
    fn test_persist_keeps_foreign_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terminalrc");
        fs::write(&path, "[Session]\nGeometry=80x24\n[Configuration]\nStale=1\n").unwrap();

        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(Some(path.clone()), &ctx);
        prefs.borrow().persist().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[Session]\nGeometry=80x24\n"));
        assert!(!text.contains("Stale=1"));
        assert!(text.contains("WordChars=-A-Za-z0-9,./?%&#:_\n"));
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let path = dir.path().join("terminalrc");
        fs::create_dir(&path).unwrap();

        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(Some(path), &ctx);
        assert!(matches!(
            prefs.borrow().persist(),
            Err(PreferencesError::ConfigUnavailable { .. })
        ));
    }

    #[test]
    fn test_dropping_registry_cancels_store() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        prefs.borrow_mut().set(Setting::FontName, Value::String("x".into())).unwrap();
        assert_eq!(ctx.pending(), 1);

        drop(prefs);
        assert_eq!(ctx.pending(), 0);
    }

    #[test]
    fn test_get_default_is_shared_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Terminal").join("terminalrc");
        let ctx = Rc::new(MainContext::new());

        let a = Preferences::shared_at(Some(path.clone()), &ctx);
        let b = Preferences::shared_at(Some(path.clone()), &ctx);
        assert!(Rc::ptr_eq(&a, &b));
        a.borrow_mut().set(Setting::FontName, Value::String("Shared 11".into())).unwrap();
        assert_eq!(b.borrow().string(Setting::FontName), "Shared 11");

        // the pending store goes away with the last handle
        drop(a);
        drop(b);
        assert_eq!(ctx.run_pending(), 0);
        assert!(!path.exists());
        let c = Preferences::shared_at(Some(path), &ctx);
        assert_eq!(c.borrow().string(Setting::FontName), "Monospace 12");
    }
}
