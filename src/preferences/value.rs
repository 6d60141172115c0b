//! Setting values and their textual encoding in the rc file.

use std::fmt;

use super::settings::{EnumClass, Kind};

/// RGB color with 16-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// X11 color names accepted besides hex notation
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("gray", (190, 190, 190)),
    ("grey", (190, 190, 190)),
    ("darkgray", (169, 169, 169)),
    ("darkgrey", (169, 169, 169)),
    ("lightgray", (211, 211, 211)),
    ("lightgrey", (211, 211, 211)),
    ("orange", (255, 165, 0)),
    ("navy", (0, 0, 128)),
];

impl Color {
    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    /// Build from 8-bit channels, replicating the byte (0xab -> 0xabab)
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            red: r as u16 * 257,
            green: g as u16 * 257,
            blue: b as u16 * 257,
        }
    }

    pub const WHITE: Color = Color::from_rgb8(255, 255, 255);
    pub const BLACK: Color = Color::from_rgb8(0, 0, 0);

    /// 8-bit channels (16-bit value / 256)
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        ((self.red / 256) as u8, (self.green / 256) as u8, (self.blue / 256) as u8)
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrrgggbbb`, `#rrrrggggbbbb` or a color name
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if let Some(hex) = spec.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let wanted: String = spec
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, (r, g, b))| Self::from_rgb8(*r, *g, *b))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || hex.len() % 3 != 0 || hex.len() > 12 {
            return None;
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let width = hex.len() / 3;
        let channel = |i: usize| -> Option<u16> {
            let raw = u16::from_str_radix(&hex[i * width..(i + 1) * width], 16).ok()?;
            Some(scale_channel(raw, width as u32 * 4))
        };

        Some(Self::new(channel(0)?, channel(1)?, channel(2)?))
    }
}

/// Widen a `bits`-wide channel to 16 bits by bit replication
fn scale_channel(value: u16, bits: u32) -> u16 {
    let mut bits = bits;
    let mut v = (value as u32) << (16 - bits);
    while bits < 16 {
        v |= v >> bits;
        bits *= 2;
    }
    v as u16
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.to_rgb8();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Current value of a setting
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Boolean(bool),
    /// Integer value of an enum class member
    Enum(i32),
    Double(f64),
    Uint(u32),
    Color(Color),
}

impl Value {
    /// Short name of the value's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Enum(_) => "enum",
            Value::Double(_) => "double",
            Value::Uint(_) => "uint",
            Value::Color(_) => "color",
        }
    }

    /// Encode for the rc file
    pub fn to_text(&self, kind: &Kind) -> String {
        match (self, kind) {
            (Value::String(s), _) => s.clone(),
            (Value::Boolean(b), _) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            (Value::Enum(v), Kind::Enum { class, .. }) => class
                .name_of(*v)
                .unwrap_or(class.members[0].name)
                .to_string(),
            (Value::Enum(v), _) => v.to_string(),
            (Value::Double(d), _) => format!("{}", d),
            (Value::Uint(u), _) => u.to_string(),
            (Value::Color(c), _) => c.to_string(),
        }
    }

    /// Decode rc file text into a value of `kind`.
    ///
    /// Only colors can fail; the other kinds always yield a value.
    pub fn from_text(text: &str, kind: &Kind) -> Option<Value> {
        match kind {
            Kind::String { .. } => Some(Value::String(text.to_string())),
            Kind::Boolean { .. } => Some(Value::Boolean(text != "FALSE")),
            Kind::Enum { class, .. } => Some(Value::Enum(enum_from_text(text, class))),
            Kind::Double { .. } => Some(Value::Double(parse_double(text))),
            Kind::Uint { .. } => Some(Value::Uint(parse_uint(text))),
            Kind::Color { .. } => Color::parse(text).map(Value::Color),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Enum(v) => write!(f, "{}", v),
            Value::Double(d) => write!(f, "{}", d),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Color(c) => write!(f, "{}", c),
        }
    }
}

/// Unknown names resolve to the first declared member
fn enum_from_text(text: &str, class: &EnumClass) -> i32 {
    class
        .members
        .iter()
        .find(|m| m.name == text)
        .unwrap_or(&class.members[0])
        .value
}

/// Locale-independent parse of the leading numeric prefix; 0.0 if none
fn parse_double(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return 0.0;
    }

    // optional exponent, only taken if it has digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

/// Base-10 parse of the leading digits; 0 if none or negative, saturating on overflow
fn parse_uint(text: &str) -> u32 {
    let s = text.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: &str = &s[..s.bytes().take_while(|b| b.is_ascii_digit()).count()];
    if digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map(|v| v.min(u32::MAX as u64) as u32).unwrap_or(u32::MAX)
}

/// Derive the rc key from a setting name: `accel-new-tab` -> `AccelNewTab`
pub fn option_name(setting_name: &str) -> String {
    let mut option = String::with_capacity(setting_name.len());
    let mut upper = true;
    for ch in setting_name.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            option.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            option.push(ch);
        }
    }
    option
}
