//! Command line options
//!
//! ```text
//! terminal [--display=DISPLAY] [--geometry=GEOMETRY] [--help] [--version]
//! ```
//!
//! `GEOMETRY` follows the X11 syntax `[=][COLSxROWS][{+-}X{+-}Y]`.

/// Parsed X geometry string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub cols: Option<u16>,
    pub rows: Option<u16>,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl Geometry {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let invalid = || format!("Invalid geometry string \"{}\"", spec);
        let mut rest = spec.strip_prefix('=').unwrap_or(spec);
        let mut geometry = Geometry::default();

        let size_end = rest.find(['+', '-']).unwrap_or(rest.len());
        let size = &rest[..size_end];
        if !size.is_empty() {
            let (cols, rows) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
            let cols: u16 = cols.parse().map_err(|_| invalid())?;
            let rows: u16 = rows.parse().map_err(|_| invalid())?;
            if cols == 0 || rows == 0 {
                return Err(invalid());
            }
            geometry.cols = Some(cols);
            geometry.rows = Some(rows);
        }
        rest = &rest[size_end..];

        if !rest.is_empty() {
            let (x, tail) = parse_offset(rest).ok_or_else(invalid)?;
            let (y, tail) = parse_offset(tail).ok_or_else(invalid)?;
            if !tail.is_empty() {
                return Err(invalid());
            }
            geometry.x = Some(x);
            geometry.y = Some(y);
        }

        Ok(geometry)
    }

    /// Grid size, if both dimensions were given
    pub fn grid(&self) -> Option<(u16, u16)> {
        Some((self.cols?, self.rows?))
    }
}

/// `{+-}N` at the start of `s`
fn parse_offset(s: &str) -> Option<(i32, &str)> {
    let sign = match s.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits = &s[1..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i32 = digits[..end].parse().ok()?;
    Some((sign * value, &digits[end..]))
}

/// Options for the initial window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalOptions {
    /// X display exported to child sessions
    pub display: Option<String>,
    pub geometry: Option<Geometry>,
}

/// Result of command line parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(TerminalOptions),
    Help,
    Version,
}

/// Parse the arguments following the program name
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = TerminalOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "--display" => {
                let value = args.next().ok_or("Missing argument for --display")?;
                options.display = Some(value);
            }
            "--geometry" => {
                let value = args.next().ok_or("Missing argument for --geometry")?;
                options.geometry = Some(Geometry::parse(&value)?);
            }
            other => {
                if let Some(value) = other.strip_prefix("--display=") {
                    if value.is_empty() {
                        return Err("Missing argument for --display".to_string());
                    }
                    options.display = Some(value.to_string());
                } else if let Some(value) = other.strip_prefix("--geometry=") {
                    options.geometry = Some(Geometry::parse(value)?);
                } else {
                    return Err(format!("Unknown option \"{}\"", other));
                }
            }
        }
    }

    Ok(Command::Run(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_geometry_forms() {
        assert_eq!(
            Geometry::parse("80x24").unwrap(),
            Geometry { cols: Some(80), rows: Some(24), x: None, y: None }
        );
        assert_eq!(
            Geometry::parse("=100X40+10-5").unwrap(),
            Geometry { cols: Some(100), rows: Some(40), x: Some(10), y: Some(-5) }
        );
        assert_eq!(
            Geometry::parse("-0+0").unwrap(),
            Geometry { cols: None, rows: None, x: Some(0), y: Some(0) }
        );
        assert_eq!(Geometry::parse("80x24").unwrap().grid(), Some((80, 24)));
    }

    #[test]
    fn test_geometry_rejects_garbage() {
        for bad in ["80", "x24", "0x10", "80x24+1", "80x24+1+2+3", "axb", "80x24+"] {
            assert!(Geometry::parse(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])), Ok(Command::Run(TerminalOptions::default())));
        assert_eq!(parse_args(args(&["--help", "--bogus"])), Ok(Command::Help));
        assert_eq!(parse_args(args(&["--version"])), Ok(Command::Version));

        let Ok(Command::Run(opts)) = parse_args(args(&["--display=:1", "--geometry", "90x30"])) else {
            panic!("expected run");
        };
        assert_eq!(opts.display.as_deref(), Some(":1"));
        assert_eq!(opts.geometry.and_then(|g| g.grid()), Some((90, 30)));

        let Ok(Command::Run(opts)) = parse_args(args(&["--display", ":2"])) else {
            panic!("expected run");
        };
        assert_eq!(opts.display.as_deref(), Some(":2"));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--display"])).is_err());
        assert!(parse_args(args(&["--display="])).is_err());
        assert!(parse_args(args(&["--geometry=nope"])).is_err());
    }
}
