//! Compile-time table of every preference: name, kind and default.
//!
//! Load and persist iterate [`Setting::all`] in table order; the registry
//! stores current values in a `Vec` indexed by `Setting as usize`.

use super::value::{Color, Value};

/// One member of an enum class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMember {
    pub value: i32,
    /// Symbolic name, used in the rc file
    pub name: &'static str,
    /// Short label for display
    pub nick: &'static str,
}

/// Named set of enum members; the first member is the load fallback
#[derive(Debug, PartialEq, Eq)]
pub struct EnumClass {
    pub name: &'static str,
    pub members: &'static [EnumMember],
}

impl EnumClass {
    pub fn name_of(&self, value: i32) -> Option<&'static str> {
        self.members.iter().find(|m| m.value == value).map(|m| m.name)
    }

    pub fn nick_of(&self, value: i32) -> Option<&'static str> {
        self.members.iter().find(|m| m.value == value).map(|m| m.nick)
    }

    pub fn contains(&self, value: i32) -> bool {
        self.members.iter().any(|m| m.value == value)
    }

    /// Member following `value`, wrapping around
    pub fn next_value(&self, value: i32) -> i32 {
        let pos = self.members.iter().position(|m| m.value == value).unwrap_or(0);
        self.members[(pos + 1) % self.members.len()].value
    }
}

const fn member(value: i32, name: &'static str, nick: &'static str) -> EnumMember {
    EnumMember { value, name, nick }
}

pub static BACKGROUND_CLASS: EnumClass = EnumClass {
    name: "TerminalBackground",
    members: &[
        member(0, "TERMINAL_BACKGROUND_SOLID", "solid"),
        member(1, "TERMINAL_BACKGROUND_IMAGE", "image"),
        member(2, "TERMINAL_BACKGROUND_TRANSPARENT", "transparent"),
    ],
};

pub static ERASE_BINDING_CLASS: EnumClass = EnumClass {
    name: "TerminalEraseBinding",
    members: &[
        member(0, "TERMINAL_ERASE_BINDING_AUTO", "auto"),
        member(1, "TERMINAL_ERASE_BINDING_ASCII_BACKSPACE", "ascii-backspace"),
        member(2, "TERMINAL_ERASE_BINDING_ASCII_DELETE", "ascii-delete"),
        member(3, "TERMINAL_ERASE_BINDING_DELETE_SEQUENCE", "delete-sequence"),
    ],
};

pub static SCROLLBAR_CLASS: EnumClass = EnumClass {
    name: "TerminalScrollbar",
    members: &[
        member(0, "TERMINAL_SCROLLBAR_NONE", "none"),
        member(1, "TERMINAL_SCROLLBAR_LEFT", "left"),
        member(2, "TERMINAL_SCROLLBAR_RIGHT", "right"),
    ],
};

pub static TITLE_CLASS: EnumClass = EnumClass {
    name: "TerminalTitle",
    members: &[
        member(0, "TERMINAL_TITLE_REPLACE", "replace"),
        member(1, "TERMINAL_TITLE_PREPEND", "prepend"),
        member(2, "TERMINAL_TITLE_APPEND", "append"),
        member(3, "TERMINAL_TITLE_HIDE", "hide"),
    ],
};

/// Typed view of an enum class
pub trait SettingEnum: Sized + Copy {
    fn class() -> &'static EnumClass;
    fn from_value(value: i32) -> Option<Self>;
    fn value(self) -> i32;
    /// First declared member, used when a stored value is unknown
    fn first() -> Self;
}

macro_rules! setting_enum {
    ($name:ident, $class:ident, { $first:ident = $fv:literal $(, $variant:ident = $v:literal)* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $first = $fv,
            $($variant = $v),*
        }

        impl SettingEnum for $name {
            fn class() -> &'static EnumClass {
                &$class
            }

            fn from_value(value: i32) -> Option<Self> {
                match value {
                    $fv => Some($name::$first),
                    $($v => Some($name::$variant),)*
                    _ => None,
                }
            }

            fn value(self) -> i32 {
                self as i32
            }

            fn first() -> Self {
                $name::$first
            }
        }
    };
}

setting_enum!(Background, BACKGROUND_CLASS, { Solid = 0, Image = 1, Transparent = 2 });
setting_enum!(EraseBinding, ERASE_BINDING_CLASS, {
    Auto = 0,
    AsciiBackspace = 1,
    AsciiDelete = 2,
    DeleteSequence = 3,
});
setting_enum!(Scrollbar, SCROLLBAR_CLASS, { Disabled = 0, Left = 1, Right = 2 });
setting_enum!(TitleMode, TITLE_CLASS, { Replace = 0, Prepend = 1, Append = 2, Hide = 3 });

/// Declared kind of a setting, with its default and range
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String { default: &'static str },
    Boolean { default: bool },
    Enum { class: &'static EnumClass, default: i32 },
    Double { min: f64, max: f64, default: f64 },
    Uint { min: u32, max: u32, default: u32 },
    Color { default: Color },
}

impl Kind {
    pub fn default_value(&self) -> Value {
        match *self {
            Kind::String { default } => Value::String(default.to_string()),
            Kind::Boolean { default } => Value::Boolean(default),
            Kind::Enum { default, .. } => Value::Enum(default),
            Kind::Double { default, .. } => Value::Double(default),
            Kind::Uint { default, .. } => Value::Uint(default),
            Kind::Color { default } => Value::Color(default),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::String { .. } => "string",
            Kind::Boolean { .. } => "boolean",
            Kind::Enum { .. } => "enum",
            Kind::Double { .. } => "double",
            Kind::Uint { .. } => "uint",
            Kind::Color { .. } => "color",
        }
    }
}

/// Table row
#[derive(Debug)]
pub struct SettingSpec {
    pub setting: Setting,
    pub name: &'static str,
    /// Human readable label
    pub blurb: &'static str,
    pub kind: Kind,
}

/// Every registered preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Setting {
    AccelNewTab,
    AccelNewWindow,
    AccelCloseTab,
    AccelCloseWindow,
    AccelCopy,
    AccelPaste,
    AccelPreferences,
    AccelFullscreen,
    AccelCompactMode,
    AccelPrevTab,
    AccelNextTab,
    AccelReset,
    AccelResetAndClear,
    BackgroundMode,
    BackgroundImageFile,
    BackgroundDarkness,
    BindingBackspace,
    BindingDelete,
    ColorForeground,
    ColorBackground,
    CommandUpdateRecords,
    CommandLoginShell,
    CommandRunCustom,
    CommandCustom,
    FontName,
    MiscBellAudible,
    MiscBellVisible,
    MiscCompactDefault,
    MiscCursorBlinks,
    ScrollingBar,
    ScrollingLines,
    ScrollingOnOutput,
    ScrollingOnKeystroke,
    ShortcutsNoMenukey,
    TitleInitial,
    TitleMode,
    WordChars,
}

/// Value stored for accelerators that have no binding
pub const DISABLED_ACCEL: &str = "Disabled";

/// Upper bound of `scrolling-lines`
pub const MAX_SCROLLING_LINES: u32 = 1024 * 1024;

const fn row(setting: Setting, name: &'static str, blurb: &'static str, kind: Kind) -> SettingSpec {
    SettingSpec { setting, name, blurb, kind }
}

const fn string(default: &'static str) -> Kind {
    Kind::String { default }
}

const fn boolean(default: bool) -> Kind {
    Kind::Boolean { default }
}

static SETTINGS: [SettingSpec; 37] = [
    row(Setting::AccelNewTab, "accel-new-tab", "New Tab Accelerator", string("<control><shift>t")),
    row(Setting::AccelNewWindow, "accel-new-window", "New Window Accelerator", string("<control><shift>n")),
    row(Setting::AccelCloseTab, "accel-close-tab", "Close Tab Accelerator", string("<control><shift>w")),
    row(Setting::AccelCloseWindow, "accel-close-window", "Close Window Accelerator", string("<control><shift>q")),
    row(Setting::AccelCopy, "accel-copy", "Copy Accelerator", string("<control><shift>c")),
    row(Setting::AccelPaste, "accel-paste", "Paste Accelerator", string("<control><shift>p")),
    row(Setting::AccelPreferences, "accel-preferences", "Preferences Accelerator", string(DISABLED_ACCEL)),
    row(Setting::AccelFullscreen, "accel-fullscreen", "Fullscreen Accelerator", string("F11")),
    row(Setting::AccelCompactMode, "accel-compact-mode", "Compact mode Accelerator", string("<control>F11")),
    row(Setting::AccelPrevTab, "accel-prev-tab", "Prev Tab Accelerator", string("<control>Page_Up")),
    row(Setting::AccelNextTab, "accel-next-tab", "Next Tab Accelerator", string("<control>Page_Down")),
    row(Setting::AccelReset, "accel-reset", "Reset Accelerator", string(DISABLED_ACCEL)),
    row(Setting::AccelResetAndClear, "accel-reset-and-clear", "Reset and Clear Accelerator", string(DISABLED_ACCEL)),
    row(
        Setting::BackgroundMode,
        "background-mode",
        "Background mode",
        Kind::Enum { class: &BACKGROUND_CLASS, default: Background::Solid as i32 },
    ),
    row(Setting::BackgroundImageFile, "background-image-file", "Background image file", string("")),
    row(
        Setting::BackgroundDarkness,
        "background-darkness",
        "Background darkness",
        Kind::Double { min: 0.0, max: 1.0, default: 0.5 },
    ),
    row(
        Setting::BindingBackspace,
        "binding-backspace",
        "Backspace binding",
        Kind::Enum { class: &ERASE_BINDING_CLASS, default: EraseBinding::AsciiBackspace as i32 },
    ),
    row(
        Setting::BindingDelete,
        "binding-delete",
        "Delete binding",
        Kind::Enum { class: &ERASE_BINDING_CLASS, default: EraseBinding::DeleteSequence as i32 },
    ),
    row(Setting::ColorForeground, "color-foreground", "Terminal foreground color", Kind::Color { default: Color::WHITE }),
    row(Setting::ColorBackground, "color-background", "Terminal background color", Kind::Color { default: Color::BLACK }),
    row(Setting::CommandUpdateRecords, "command-update-records", "Update wtmp/utmp/lastlog records", boolean(true)),
    row(Setting::CommandLoginShell, "command-login-shell", "Run shell as login shell", boolean(false)),
    row(Setting::CommandRunCustom, "command-run-custom", "Run custom command", boolean(false)),
    row(Setting::CommandCustom, "command-custom", "Custom command to be run", string("")),
    row(Setting::FontName, "font-name", "Terminal font name", string("Monospace 12")),
    row(Setting::MiscBellAudible, "misc-bell-audible", "Audible bell", boolean(true)),
    row(Setting::MiscBellVisible, "misc-bell-visible", "Visible bell", boolean(false)),
    row(Setting::MiscCompactDefault, "misc-compact-default", "Use compact mode by default", boolean(false)),
    row(Setting::MiscCursorBlinks, "misc-cursor-blinks", "Cursor blinks", boolean(false)),
    row(
        Setting::ScrollingBar,
        "scrolling-bar",
        "Whether and where to display a scrollbar",
        Kind::Enum { class: &SCROLLBAR_CLASS, default: Scrollbar::Right as i32 },
    ),
    row(
        Setting::ScrollingLines,
        "scrolling-lines",
        "Number of lines to keep in history",
        Kind::Uint { min: 0, max: MAX_SCROLLING_LINES, default: 1000 },
    ),
    row(Setting::ScrollingOnOutput, "scrolling-on-output", "Scroll on output", boolean(true)),
    row(Setting::ScrollingOnKeystroke, "scrolling-on-keystroke", "Scroll on keystroke", boolean(true)),
    row(Setting::ShortcutsNoMenukey, "shortcuts-no-menukey", "Disable menu shortcut key", boolean(false)),
    row(Setting::TitleInitial, "title-initial", "Initial Terminal title", string("Terminal")),
    row(
        Setting::TitleMode,
        "title-mode",
        "Dynamic-title mode",
        Kind::Enum { class: &TITLE_CLASS, default: TitleMode::Append as i32 },
    ),
    row(Setting::WordChars, "word-chars", "Word characters", string("-A-Za-z0-9,./?%&#:_")),
];

impl Setting {
    /// All settings in table order
    pub fn all() -> impl Iterator<Item = Setting> {
        SETTINGS.iter().map(|spec| spec.setting)
    }

    pub fn count() -> usize {
        SETTINGS.len()
    }

    pub fn spec(self) -> &'static SettingSpec {
        &SETTINGS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Setting> {
        SETTINGS.iter().find(|spec| spec.name == name).map(|spec| spec.setting)
    }

    /// Whether this setting holds an accelerator string
    pub fn is_accel(self) -> bool {
        self.name().starts_with("accel-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_indexed_by_discriminant() {
        for (i, spec) in SETTINGS.iter().enumerate() {
            assert_eq!(spec.setting as usize, i, "{} out of order", spec.name);
        }
        assert_eq!(Setting::all().count(), Setting::count());
    }

    #[test]
    fn test_names_are_unique_and_resolvable() {
        for setting in Setting::all() {
            assert_eq!(Setting::from_name(setting.name()), Some(setting));
        }
        assert_eq!(Setting::from_name("no-such-setting"), None);
    }

    #[test]
    fn test_enum_defaults_belong_to_class() {
        for setting in Setting::all() {
            if let Kind::Enum { class, default } = setting.spec().kind {
                assert!(class.contains(default), "{}", setting.name());
            }
        }
    }

    #[test]
    fn test_typed_enums_match_classes() {
        assert_eq!(TitleMode::from_value(2), Some(TitleMode::Append));
        assert_eq!(TitleMode::class().nick_of(TitleMode::Hide.value()), Some("hide"));
        assert_eq!(EraseBinding::from_value(7), None);
        assert_eq!(SCROLLBAR_CLASS.next_value(Scrollbar::Right.value()), Scrollbar::Disabled.value());
    }
}
