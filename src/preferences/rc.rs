//! INI-style resource file.
//!
//! ```text
//! [Configuration]
//! AccelNewTab=<control><shift>t
//! ScrollingLines=1000
//! ```
//!
//! Groups other than the one being rewritten, and comment lines, are kept
//! as-is when the file is saved. Values are escaped on disk: `\\`, `\n`,
//! `\t`, `\r`, and `\s` for a leading space.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Entry { key: String, value: String },
    /// Comment or blank line, written back verbatim
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Group {
    /// `None` for lines before the first `[group]` header
    name: Option<String>,
    lines: Vec<Line>,
}

/// Parsed resource file
#[derive(Debug, Clone)]
pub struct RcFile {
    path: PathBuf,
    groups: Vec<Group>,
}

impl RcFile {
    /// Open for reading. A missing file yields an empty resource.
    pub fn open_read(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(path, &content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::empty(path)),
            Err(e) => Err(e),
        }
    }

    /// Open for writing, creating the parent directory if needed
    pub fn open_write(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::open_read(path)
    }

    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            groups: Vec::new(),
        }
    }

    fn parse(path: &Path, content: &str) -> Self {
        let mut rc = Self::empty(path);
        let mut current = Group { name: None, lines: Vec::new() };

        for raw in content.lines() {
            let line = raw.trim();
            let entry = raw.trim_start();

            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                rc.push_group(current);
                current = Group {
                    name: Some(line[1..line.len() - 1].trim().to_string()),
                    lines: Vec::new(),
                };
                continue;
            }

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                current.lines.push(Line::Other(raw.to_string()));
                continue;
            }

            match entry.split_once('=') {
                Some((key, value)) => current.lines.push(Line::Entry {
                    key: key.trim().to_string(),
                    value: unescape_value(value.trim_start()),
                }),
                None => current.lines.push(Line::Other(raw.to_string())),
            }
        }
        rc.push_group(current);
        rc
    }

    fn push_group(&mut self, group: Group) {
        if group.name.is_none() && group.lines.is_empty() {
            return;
        }
        self.groups.push(group);
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.group(group).is_some()
    }

    fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name.as_deref() == Some(name))
    }

    fn group_mut(&mut self, name: &str) -> &mut Group {
        let pos = match self.groups.iter().position(|g| g.name.as_deref() == Some(name)) {
            Some(pos) => pos,
            None => {
                self.groups.push(Group {
                    name: Some(name.to_string()),
                    lines: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos]
    }

    /// Look up `key` in `group`; the last occurrence wins
    pub fn read_entry(&self, group: &str, key: &str) -> Option<&str> {
        self.group(group)?
            .lines
            .iter()
            .rev()
            .find_map(|line| match line {
                Line::Entry { key: k, value } if k == key => Some(value.as_str()),
                _ => None,
            })
    }

    /// Set `key` in `group`, replacing an existing entry
    pub fn write_entry(&mut self, group: &str, key: &str, value: &str) {
        let group = self.group_mut(group);
        for line in group.lines.iter_mut() {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value.to_string();
                    return;
                }
            }
        }
        group.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Remove a group and all of its entries
    pub fn delete_group(&mut self, group: &str) {
        self.groups.retain(|g| g.name.as_deref() != Some(group));
    }

    /// Serialized form of the resource
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            if let Some(name) = &group.name {
                if i > 0 && !out.ends_with("\n\n") {
                    out.push('\n');
                }
                out.push('[');
                out.push_str(name);
                out.push_str("]\n");
            }
            for line in &group.lines {
                match line {
                    Line::Entry { key, value } => {
                        out.push_str(key);
                        out.push('=');
                        out.push_str(&escape_value(value));
                    }
                    Line::Other(text) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        out.push_str(text);
                    }
                }
                out.push('\n');
            }
        }
        out
    }

    /// Write to disk through a temporary file and rename
    pub fn save(&self) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(self.to_text().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

/// Escape a value so it stays on one line and keeps its leading spaces
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ' ' if i == 0 => out.push_str("\\s"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_value`]; unknown escapes are kept verbatim
fn unescape_value(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('s') => out.push(' '),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_read() {
        let rc = RcFile::parse(
            Path::new("terminalrc"),
            "# leading comment\n[Configuration]\nAccelNewTab=<control>t\n ScrollingLines = 50\n\n[Other]\nKey=v\n",
        );
        assert!(rc.has_group("Configuration"));
        assert_eq!(rc.read_entry("Configuration", "AccelNewTab"), Some("<control>t"));
        assert_eq!(rc.read_entry("Configuration", "ScrollingLines"), Some("50"));
        assert_eq!(rc.read_entry("Configuration", "Key"), None);
        assert_eq!(rc.read_entry("Other", "Key"), Some("v"));
    }

    #[test]
    fn test_value_may_contain_equals_and_be_empty() {
        let rc = RcFile::parse(Path::new("rc"), "[G]\nA=x=y\nB=\n");
        assert_eq!(rc.read_entry("G", "A"), Some("x=y"));
        assert_eq!(rc.read_entry("G", "B"), Some(""));
    }

    #[test]
    fn test_delete_group_keeps_others() {
        let mut rc = RcFile::parse(Path::new("rc"), "[Keep]\nA=1\n[Configuration]\nB=2\n");
        rc.delete_group("Configuration");
        rc.write_entry("Configuration", "C", "3");

        let text = rc.to_text();
        assert!(text.contains("[Keep]\nA=1\n"));
        assert!(text.contains("[Configuration]\nC=3\n"));
        assert!(!text.contains("B=2"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Terminal").join("terminalrc");

        let mut rc = RcFile::open_write(&path).unwrap();
        rc.write_entry("Configuration", "FontName", "Monospace 10");
        rc.save().unwrap();

        let reread = RcFile::open_read(&path).unwrap();
        assert_eq!(reread.read_entry("Configuration", "FontName"), Some("Monospace 10"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_values_are_escaped_on_disk() {
        let mut rc = RcFile::parse(Path::new("rc"), "");
        rc.write_entry("G", "Title", "  Term  ");
        rc.write_entry("G", "Command", "vim\nAccel=Disabled");
        rc.write_entry("G", "Path", "C:\\tmp\\new\tx\r");
        rc.write_entry("G", "Accel", "<control>t");

        let text = rc.to_text();
        assert!(text.contains("Title=\\s Term  \n"));
        assert!(text.contains("Command=vim\\nAccel=Disabled\n"));
        assert!(text.contains("Path=C:\\\\tmp\\\\new\\tx\\r\n"));

        let reread = RcFile::parse(Path::new("rc"), &text);
        assert_eq!(reread.read_entry("G", "Title"), Some("  Term  "));
        assert_eq!(reread.read_entry("G", "Command"), Some("vim\nAccel=Disabled"));
        assert_eq!(reread.read_entry("G", "Path"), Some("C:\\tmp\\new\tx\r"));
        // the embedded newline does not become an entry of its own
        assert_eq!(reread.read_entry("G", "Accel"), Some("<control>t"));
    }

    #[test]
    fn test_unknown_escape_and_trailing_backslash_kept() {
        let rc = RcFile::parse(Path::new("rc"), "[G]\nA=a\\qb\\\nB=keep trailing  \n");
        assert_eq!(rc.read_entry("G", "A"), Some("a\\qb\\"));
        assert_eq!(rc.read_entry("G", "B"), Some("keep trailing  "));
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rc = RcFile::open_read(&dir.path().join("absent")).unwrap();
        assert!(!rc.has_group("Configuration"));
    }
}
