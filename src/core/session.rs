//! Session management
//!
//! A [`ShellSession`] runs the configured shell with piped stdio and keeps a
//! line-based screen model: scrollback, the line being typed, a selection and
//! the dynamic title set through `OSC 0`/`OSC 2`.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::widget::{GeometryHints, LaunchError, TerminalWidget};
use crate::preferences::{Preferences, Setting, TitleMode};

/// Tab stop width used when expanding `\t`
const TAB_WIDTH: usize = 8;

/// Snapshot of the preferences a session is started with
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// argv of the child
    pub command: Vec<String>,
    pub title_initial: String,
    pub title_mode: TitleMode,
    /// Lines kept above the visible screen
    pub scrollback: usize,
    /// X display exported to the child
    pub display: Option<String>,
    pub cols: u16,
    pub rows: u16,
}

impl SessionConfig {
    pub fn from_preferences(prefs: &Preferences, display: Option<&str>) -> Self {
        Self {
            command: resolve_command(prefs),
            title_initial: prefs.string(Setting::TitleInitial).to_string(),
            title_mode: prefs.enum_value(Setting::TitleMode),
            scrollback: prefs.uint(Setting::ScrollingLines) as usize,
            display: display.map(str::to_string),
            cols: 80,
            rows: 24,
        }
    }
}

/// Custom command if enabled, else `$SHELL` (or `/bin/sh`), `-l` for login shells
fn resolve_command(prefs: &Preferences) -> Vec<String> {
    if prefs.boolean(Setting::CommandRunCustom) {
        let custom: Vec<String> = prefs
            .string(Setting::CommandCustom)
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if !custom.is_empty() {
            return custom;
        }
    }

    let shell = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string());
    let mut argv = vec![shell];
    if prefs.boolean(Setting::CommandLoginShell) {
        argv.push("-l".to_string());
    }
    argv
}

/// Output parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    Csi,
    Osc,
    /// ESC seen inside an OSC string (possible ST)
    OscEscape,
}

/// A shell session
pub struct ShellSession {
    config: SessionConfig,
    cols: u16,
    rows: u16,
    /// Completed lines, oldest first
    lines: VecDeque<String>,
    /// Line currently being written by the child
    current: String,
    /// Line being typed by the user
    input_line: String,
    selection: Option<String>,
    dynamic_title: Option<String>,
    custom_title: Option<String>,
    state: ParseState,
    osc_buffer: String,
    /// Trailing bytes of a multi-byte character split across reads
    pending_utf8: Vec<u8>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output_rx: Option<Receiver<Vec<u8>>>,
    reader_threads: Vec<JoinHandle<()>>,
    /// Set once both output pipes closed
    exited: bool,
}

impl ShellSession {
    pub fn new(config: SessionConfig) -> Self {
        let (cols, rows) = (config.cols, config.rows);
        Self {
            config,
            cols,
            rows,
            lines: VecDeque::new(),
            current: String::new(),
            input_line: String::new(),
            selection: None,
            dynamic_title: None,
            custom_title: None,
            state: ParseState::Ground,
            osc_buffer: String::new(),
            pending_utf8: Vec::new(),
            child: None,
            stdin: None,
            output_rx: None,
            reader_threads: Vec::new(),
            exited: false,
        }
    }

    /// Maximum number of completed lines kept
    fn capacity(&self) -> usize {
        self.config.scrollback + self.rows as usize
    }

    fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.capacity() {
            self.lines.pop_front();
        }
    }

    fn newline(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.push_line(line);
    }

    /// Feed raw child output through the parser
    pub fn feed_output(&mut self, bytes: &[u8]) {
        let mut data = std::mem::take(&mut self.pending_utf8);
        data.extend_from_slice(bytes);
        let complete = data.len() - incomplete_utf8_tail(&data);
        self.pending_utf8 = data.split_off(complete);

        let text = String::from_utf8_lossy(&data);
        for ch in text.chars() {
            self.feed_char(ch);
        }
    }

    fn feed_char(&mut self, ch: char) {
        match self.state {
            ParseState::Ground => match ch {
                '\x1b' => self.state = ParseState::Escape,
                '\n' => self.newline(),
                '\r' | '\x07' => {}
                '\x08' => {
                    self.current.pop();
                }
                '\t' => {
                    let pad = TAB_WIDTH - self.current.chars().count() % TAB_WIDTH;
                    self.current.extend(std::iter::repeat(' ').take(pad));
                }
                c if c.is_control() => {}
                c => self.current.push(c),
            },
            ParseState::Escape => {
                self.state = match ch {
                    '[' => ParseState::Csi,
                    ']' => {
                        self.osc_buffer.clear();
                        ParseState::Osc
                    }
                    _ => ParseState::Ground,
                };
            }
            ParseState::Csi => {
                if ('\x40'..='\x7e').contains(&ch) {
                    self.state = ParseState::Ground;
                }
            }
            ParseState::Osc => match ch {
                '\x07' => self.finish_osc(),
                '\x1b' => self.state = ParseState::OscEscape,
                c => self.osc_buffer.push(c),
            },
            ParseState::OscEscape => {
                if ch == '\\' {
                    self.finish_osc();
                } else {
                    self.state = ParseState::Ground;
                }
            }
        }
    }

    fn finish_osc(&mut self) {
        self.state = ParseState::Ground;
        let osc = std::mem::take(&mut self.osc_buffer);
        if let Some((code, text)) = osc.split_once(';') {
            if code == "0" || code == "2" {
                debug!("Dynamic title: {}", text);
                self.dynamic_title = Some(text.to_string());
            }
        }
    }

    fn write_child(&mut self, data: &[u8]) {
        if let Some(stdin) = self.stdin.as_mut() {
            if let Err(e) = stdin.write_all(data).and_then(|_| stdin.flush()) {
                warn!("Failed to write to child: {}", e);
                self.stdin = None;
            }
        }
    }

    fn spawn_reader<R>(mut pipe: R, tx: Sender<Vec<u8>>) -> JoinHandle<()>
    where
        R: Read + Send + 'static,
    {
        thread::spawn(move || {
            let mut buffer = vec![0u8; 4096];
            loop {
                match pipe.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl TerminalWidget for ShellSession {
    fn grid_size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn set_grid_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols.max(1);
        self.rows = rows.max(1);
    }

    fn geometry_hints(&self) -> GeometryHints {
        GeometryHints::default()
    }

    fn title(&self) -> String {
        if let Some(custom) = &self.custom_title {
            return custom.clone();
        }

        let initial = &self.config.title_initial;
        match (&self.dynamic_title, self.config.title_mode) {
            (_, TitleMode::Hide) | (None, _) => initial.clone(),
            (Some(dynamic), TitleMode::Replace) => dynamic.clone(),
            (Some(dynamic), TitleMode::Prepend) => format!("{} - {}", dynamic, initial),
            (Some(dynamic), TitleMode::Append) => format!("{} - {}", initial, dynamic),
        }
    }

    fn set_custom_title(&mut self, title: Option<String>) {
        self.custom_title = title.filter(|t| !t.is_empty());
    }

    fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    fn copy_clipboard(&mut self) {
        let Some(text) = self.selection.clone() else {
            return;
        };
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => debug!("Copied selection to clipboard"),
            Err(e) => warn!("Failed to copy to clipboard: {}", e),
        }
    }

    fn paste_clipboard(&mut self) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.get_text()) {
            Ok(text) => self.feed_input(text.as_bytes()),
            Err(e) => warn!("Failed to paste from clipboard: {}", e),
        }
    }

    fn reset(&mut self, clear: bool) {
        self.state = ParseState::Ground;
        self.osc_buffer.clear();
        self.pending_utf8.clear();
        self.input_line.clear();
        self.selection = None;
        if clear {
            self.lines.clear();
            self.current.clear();
        }
    }

    fn launch_child(&mut self) -> Result<(), LaunchError> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or(LaunchError::NoCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("TERM", "dumb")
            .env("COLUMNS", self.cols.to_string())
            .env("LINES", self.rows.to_string());
        if let Some(display) = &self.config.display {
            command.env("DISPLAY", display);
        }

        let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
            command: self.config.command.join(" "),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            LaunchError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "no stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            LaunchError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "no stderr"))
        })?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        self.reader_threads.push(Self::spawn_reader(stdout, tx.clone()));
        self.reader_threads.push(Self::spawn_reader(stderr, tx));

        self.stdin = child.stdin.take();
        self.output_rx = Some(rx);
        self.dynamic_title = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        info!("Started child {} (pid {})", program, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn process_output(&mut self) -> bool {
        let mut chunks = Vec::new();
        if let Some(rx) = &self.output_rx {
            loop {
                match rx.try_recv() {
                    Ok(data) => chunks.push(data),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.exited = true;
                        break;
                    }
                }
            }
        }

        // a grandchild may keep the pipes open after the shell is gone
        if chunks.is_empty() && !self.exited {
            if let Some(Ok(Some(status))) = self.child.as_mut().map(Child::try_wait) {
                info!("Child exited with {}", status);
                self.exited = true;
            }
        }

        let changed = !chunks.is_empty();
        for data in chunks {
            self.feed_output(&data);
        }
        changed
    }

    fn is_alive(&self) -> bool {
        !self.exited
    }

    fn feed_input(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\r' | '\n' => {
                    let mut line = std::mem::take(&mut self.input_line);
                    self.current.push_str(&line);
                    self.newline();
                    line.push('\n');
                    self.write_child(line.as_bytes());
                }
                '\x7f' | '\x08' => {
                    self.input_line.pop();
                }
                '\x03' => self.input_line.clear(),
                '\x04' => {
                    // EOF for the child
                    self.stdin = None;
                }
                '\x1b' => {
                    // drop the rest of an escape sequence
                    if chars.peek() == Some(&'[') {
                        chars.next();
                        for c in chars.by_ref() {
                            if ('\x40'..='\x7e').contains(&c) {
                                break;
                            }
                        }
                    } else {
                        chars.next();
                    }
                }
                '\t' => self.input_line.push(' '),
                c if c.is_control() => {}
                c => self.input_line.push(c),
            }
        }
    }

    fn visible_lines(&self, rows: usize) -> Vec<String> {
        let mut pending = self.current.clone();
        pending.push_str(&self.input_line);

        let mut out: Vec<String> = self.lines.iter().cloned().collect();
        out.push(pending);
        let skip = out.len().saturating_sub(rows);
        out.split_off(skip)
    }

    fn select_rows(&mut self, first: usize, last: usize) {
        let visible = self.visible_lines(self.rows as usize);
        let (first, last) = (first.min(last), first.max(last));
        let text: Vec<&str> = visible
            .iter()
            .skip(first)
            .take(last + 1 - first)
            .map(|s| s.trim_end())
            .collect();
        let text = text.join("\n");
        self.selection = if text.trim().is_empty() { None } else { Some(text) };
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        // readers still blocked on a pipe held open by a grandchild are detached
        for handle in self.reader_threads.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

/// Length of an unfinished UTF-8 sequence at the end of `data`
fn incomplete_utf8_tail(data: &[u8]) -> usize {
    for back in 1..=data.len().min(3) {
        let byte = data[data.len() - back];
        if byte & 0xc0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => 1,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            command: vec!["/bin/sh".to_string()],
            title_initial: "Terminal".to_string(),
            title_mode: TitleMode::Append,
            scrollback: 2,
            display: None,
            cols: 80,
            rows: 2,
        }
    }

    #[test]
    fn test_output_lines_and_scrollback_limit() {
        let mut session = ShellSession::new(config());
        session.feed_output(b"one\ntwo\r\nthree\nfour\nfive\npartial");

        // capacity = scrollback 2 + rows 2
        assert_eq!(session.lines.len(), 4);
        assert_eq!(session.visible_lines(2), vec!["five".to_string(), "partial".to_string()]);
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let mut session = ShellSession::new(config());
        session.feed_output(b"caf\xc3");
        session.feed_output(b"\xa9 \xe2\x82");
        session.feed_output(b"\xac\n");
        assert_eq!(session.lines.back().map(String::as_str), Some("caf\u{e9} \u{20ac}"));

        // invalid bytes still decode to the replacement character
        session.feed_output(b"a\xffb\n");
        assert_eq!(session.lines.back().map(String::as_str), Some("a\u{fffd}b"));
    }

    #[test]
    fn test_escape_sequences_are_stripped() {
        let mut session = ShellSession::new(config());
        session.feed_output(b"\x1b[1;31mred\x1b[0m\ttab\n");
        assert_eq!(session.lines.back().map(String::as_str), Some("red     tab"));
    }

    #[test]
    fn test_osc_title_and_title_modes() {
        let mut session = ShellSession::new(config());
        assert_eq!(session.title(), "Terminal");

        session.feed_output(b"\x1b]0;vim\x07");
        assert_eq!(session.title(), "Terminal - vim");

        session.config.title_mode = TitleMode::Prepend;
        assert_eq!(session.title(), "vim - Terminal");
        session.config.title_mode = TitleMode::Replace;
        assert_eq!(session.title(), "vim");
        session.config.title_mode = TitleMode::Hide;
        assert_eq!(session.title(), "Terminal");

        session.feed_output(b"\x1b]2;htop\x1b\\");
        session.config.title_mode = TitleMode::Replace;
        assert_eq!(session.title(), "htop");

        session.set_custom_title(Some("mine".into()));
        assert_eq!(session.title(), "mine");
        session.set_custom_title(None);
        assert_eq!(session.title(), "htop");
    }

    #[test]
    fn test_input_line_editing() {
        let mut session = ShellSession::new(config());
        session.feed_input(b"lsx\x7f -l\x1b[D");
        assert_eq!(session.input_line, "ls -l");

        session.feed_input(b"\r");
        assert!(session.input_line.is_empty());
        assert_eq!(session.lines.back().map(String::as_str), Some("ls -l"));
    }

    #[test]
    fn test_selection_and_reset() {
        let mut session = ShellSession::new(config());
        session.feed_output(b"alpha\nbeta\n");
        assert!(!session.has_selection());

        session.select_rows(0, 0);
        assert_eq!(session.selection.as_deref(), Some("beta"));

        session.reset(false);
        assert!(!session.has_selection());
        assert_eq!(session.lines.len(), 2);

        session.reset(true);
        assert!(session.lines.is_empty());
    }

    #[test]
    fn test_launch_missing_program_fails() {
        let mut cfg = config();
        cfg.command = vec!["/nonexistent/definitely-not-a-shell".to_string()];
        let mut session = ShellSession::new(cfg);
        assert!(matches!(session.launch_child(), Err(LaunchError::Spawn { .. })));

        cfg = config();
        cfg.command.clear();
        let mut session = ShellSession::new(cfg);
        assert!(matches!(session.launch_child(), Err(LaunchError::NoCommand)));
    }
}
