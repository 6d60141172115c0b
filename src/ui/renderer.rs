//! Terminal renderer using crossterm
//!
//! ```text
//! row 0        menubar            (hidden in compact mode)
//! row 0/1      tab bar            (only with more than one page)
//! ...          active session
//! last row     status line
//! ```
//!
//! Popup menus and dialogs are drawn on top of the frame.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    execute,
    style::{Attribute, Color as CtColor, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::context_menu::{ContextMenu, MenuItem};
use super::dialog::{about_lines, Dialog, PreferencesDialog, TitleDialog};
use crate::preferences::{Color, Setting, SharedPreferences};
use crate::wm::menu::menubar_columns;
use crate::wm::TerminalWindow;

/// Rows used by each part of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub menubar_row: Option<u16>,
    pub tab_row: Option<u16>,
    pub body_top: u16,
    pub body_rows: u16,
    pub status_row: u16,
}

impl ScreenLayout {
    pub fn compute(window: &TerminalWindow, height: u16) -> Self {
        let mut row = 0;
        let menubar_row = window.menubar_visible().then(|| {
            row += 1;
            row - 1
        });
        let tab_row = window.notebook().show_tabs().then(|| {
            row += 1;
            row - 1
        });
        let status_row = height.saturating_sub(1);
        Self {
            menubar_row,
            tab_row,
            body_top: row,
            body_rows: status_row.saturating_sub(row),
            status_row,
        }
    }
}

/// Truncate or pad `text` to exactly `width` display columns
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Labels of the tab bar, left to right
pub fn tab_labels(window: &TerminalWindow) -> Vec<String> {
    window
        .notebook()
        .pages()
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let label = format!(" {}: {} ", i + 1, page.widget.title());
            fit(&label, label.width().min(24))
        })
        .collect()
}

/// Page whose tab label covers column `col`
pub fn tab_at(window: &TerminalWindow, col: u16) -> Option<usize> {
    let mut start = 0usize;
    for (i, label) in tab_labels(window).iter().enumerate() {
        let end = start + label.width();
        if (start..end).contains(&(col as usize)) {
            return Some(i);
        }
        start = end;
    }
    None
}

fn to_crossterm(color: Color) -> CtColor {
    let (r, g, b) = color.to_rgb8();
    CtColor::Rgb { r, g, b }
}

/// Everything a frame shows
pub struct View<'a> {
    pub window: &'a TerminalWindow,
    /// Index of the window and window count
    pub window_position: (usize, usize),
    pub preferences: &'a SharedPreferences,
    pub menu: Option<&'a ContextMenu>,
    pub dialog: Option<&'a Dialog>,
    pub notice: Option<&'a str>,
}

/// Terminal renderer
pub struct Renderer {
    initialized: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self { initialized: false }
    }

    /// Initialize the terminal
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture,
            Clear(ClearType::All)
        )?;
        stdout.flush()?;

        self.initialized = true;
        Ok(())
    }

    /// Restore the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }

        let mut stdout = io::stdout();
        write!(stdout, "\x1b[?7h")?;
        write!(stdout, "\x1b[?2026l")?;
        stdout.flush()?;

        execute!(
            stdout,
            ResetColor,
            SetAttribute(Attribute::Reset),
            SetCursorStyle::DefaultUserShape,
            Show,
            crossterm::event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        self.initialized = false;
        Ok(())
    }

    /// Get terminal size
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Draw a full frame
    pub fn render(&mut self, view: &View<'_>) -> io::Result<()> {
        let (width, height) = Self::size()?;
        let stdout = io::stdout();
        let mut out = io::BufWriter::with_capacity(65536, stdout.lock());

        write!(out, "\x1b[?2026h")?;
        write!(out, "\x1b[?7l")?;
        execute!(out, Hide)?;

        let result = self.render_frame(&mut out, view, width, height);

        write!(out, "\x1b[?7h")?;
        write!(out, "\x1b[?2026l")?;
        out.flush()?;
        result
    }

    fn render_frame<W: Write>(&self, out: &mut W, view: &View<'_>, width: u16, height: u16) -> io::Result<()> {
        let layout = ScreenLayout::compute(view.window, height);

        if let Some(row) = layout.menubar_row {
            self.render_menubar(out, row, width)?;
        }
        if let Some(row) = layout.tab_row {
            self.render_tab_bar(out, view.window, row, width)?;
        }
        let cursor = self.render_body(out, view, &layout, width)?;
        self.render_status(out, view, layout.status_row, width)?;

        if let Some(menu) = view.menu.filter(|m| m.visible) {
            self.render_menu(out, menu)?;
        }
        if let Some(dialog) = view.dialog {
            self.render_dialog(out, dialog, view.preferences, width, height)?;
        }

        if view.menu.map_or(true, |m| !m.visible) && view.dialog.is_none() {
            if let Some((col, row)) = cursor {
                let blinks = view.preferences.borrow().boolean(Setting::MiscCursorBlinks);
                let style = if blinks {
                    SetCursorStyle::BlinkingBlock
                } else {
                    SetCursorStyle::SteadyBlock
                };
                execute!(out, MoveTo(col, row), style, Show)?;
            }
        }
        Ok(())
    }

    fn render_menubar<W: Write>(&self, out: &mut W, row: u16, width: u16) -> io::Result<()> {
        execute!(
            out,
            MoveTo(0, row),
            SetBackgroundColor(CtColor::DarkGrey),
            SetForegroundColor(CtColor::White)
        )?;
        let mut line = String::new();
        for (col, menu) in menubar_columns() {
            line.push_str(&" ".repeat((col as usize).saturating_sub(line.len())));
            line.push_str(menu.label);
        }
        write!(out, "{}", fit(&line, width as usize))?;
        execute!(out, ResetColor)?;
        Ok(())
    }

    fn render_tab_bar<W: Write>(&self, out: &mut W, window: &TerminalWindow, row: u16, width: u16) -> io::Result<()> {
        execute!(out, MoveTo(0, row))?;
        let current = window.notebook().current_page();
        let mut used = 0usize;

        for (i, label) in tab_labels(window).iter().enumerate() {
            if used + label.width() > width as usize {
                break;
            }
            if Some(i) == current {
                execute!(out, SetBackgroundColor(CtColor::Blue), SetForegroundColor(CtColor::White))?;
            } else {
                execute!(out, SetBackgroundColor(CtColor::DarkGrey), SetForegroundColor(CtColor::Grey))?;
            }
            write!(out, "{}", label)?;
            used += label.width();
        }

        execute!(out, SetBackgroundColor(CtColor::DarkGrey))?;
        write!(out, "{}", " ".repeat((width as usize).saturating_sub(used)))?;
        execute!(out, ResetColor)?;
        Ok(())
    }

    /// Draw the active session; returns where the cursor goes
    fn render_body<W: Write>(
        &self,
        out: &mut W,
        view: &View<'_>,
        layout: &ScreenLayout,
        width: u16,
    ) -> io::Result<Option<(u16, u16)>> {
        let (fg, bg) = {
            let prefs = view.preferences.borrow();
            (
                to_crossterm(prefs.color(Setting::ColorForeground)),
                to_crossterm(prefs.color(Setting::ColorBackground)),
            )
        };
        execute!(out, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        let lines = view
            .window
            .active_widget()
            .map(|w| w.visible_lines(layout.body_rows as usize))
            .unwrap_or_default();

        for row in 0..layout.body_rows {
            execute!(out, MoveTo(0, layout.body_top + row))?;
            let text = lines.get(row as usize).map(String::as_str).unwrap_or("");
            write!(out, "{}", fit(text, width as usize))?;
        }
        execute!(out, ResetColor)?;

        let cursor = lines.len().checked_sub(1).map(|last| {
            let col = lines[last].width().min(width.saturating_sub(1) as usize) as u16;
            (col, layout.body_top + last as u16)
        });
        Ok(cursor)
    }

    fn render_status<W: Write>(&self, out: &mut W, view: &View<'_>, row: u16, width: u16) -> io::Result<()> {
        execute!(
            out,
            MoveTo(0, row),
            SetBackgroundColor(CtColor::DarkBlue),
            SetForegroundColor(CtColor::White)
        )?;

        let (index, count) = view.window_position;
        let left = format!(" [{}/{}] {}", index + 1, count, view.window.title());
        let right = match view.notice {
            Some(notice) => format!("{} ", notice),
            None => "F10: menu ".to_string(),
        };
        let left_width = (width as usize).saturating_sub(right.width());
        write!(out, "{}{}", fit(&left, left_width), fit(&right, width as usize - left_width))?;
        execute!(out, ResetColor)?;
        Ok(())
    }

    fn render_menu<W: Write>(&self, out: &mut W, menu: &ContextMenu) -> io::Result<()> {
        let content_width = menu.content_width() as usize;
        let (x, y) = (menu.x, menu.y);
        let menu_bg = CtColor::DarkGrey;
        let menu_fg = CtColor::White;

        execute!(out, SetBackgroundColor(menu_bg), SetForegroundColor(menu_fg))?;
        execute!(out, MoveTo(x, y))?;
        write!(out, "┌{}┐", "─".repeat(content_width))?;

        for (i, item) in menu.items.iter().enumerate() {
            execute!(out, MoveTo(x, y + 1 + i as u16))?;
            execute!(out, SetBackgroundColor(menu_bg), SetForegroundColor(menu_fg))?;

            match item {
                MenuItem::Separator => {
                    write!(out, "├{}┤", "─".repeat(content_width))?;
                    continue;
                }
                MenuItem::Action { sensitive, .. } => {
                    write!(out, "│")?;
                    if i == menu.selected {
                        execute!(out, SetBackgroundColor(CtColor::Blue), SetForegroundColor(CtColor::White))?;
                    } else if !sensitive {
                        execute!(out, SetForegroundColor(CtColor::Grey))?;
                    }
                    write!(out, "{}", fit(&format!(" {}", item.text()), content_width))?;
                    execute!(out, SetBackgroundColor(menu_bg), SetForegroundColor(menu_fg))?;
                    write!(out, "│")?;
                }
            }
        }

        execute!(out, MoveTo(x, y + menu.items.len() as u16 + 1))?;
        write!(out, "└{}┘", "─".repeat(content_width))?;
        execute!(out, ResetColor)?;
        Ok(())
    }

    fn render_dialog<W: Write>(
        &self,
        out: &mut W,
        dialog: &Dialog,
        prefs: &SharedPreferences,
        width: u16,
        height: u16,
    ) -> io::Result<()> {
        match dialog {
            Dialog::Preferences(d) => self.render_preferences(out, d, prefs, width, height),
            Dialog::Title(d) => self.render_title(out, d, width, height),
            Dialog::About => {
                let lines = about_lines();
                let inner = lines.iter().map(|l| l.width()).max().unwrap_or(0) + 2;
                self.render_box(out, "About", &lines, inner, None, width, height)
            }
        }
    }

    fn render_title<W: Write>(&self, out: &mut W, dialog: &TitleDialog, width: u16, height: u16) -> io::Result<()> {
        let inner = 40.min(width.saturating_sub(4) as usize);
        let lines = vec![
            String::new(),
            format!("{}█", dialog.buffer),
            String::new(),
            "Enter:OK  Esc:Cancel".to_string(),
        ];
        self.render_box(out, "Set Title", &lines, inner, None, width, height)
    }

    fn render_preferences<W: Write>(
        &self,
        out: &mut W,
        dialog: &PreferencesDialog,
        prefs: &SharedPreferences,
        width: u16,
        height: u16,
    ) -> io::Result<()> {
        let inner = 70.min(width.saturating_sub(4) as usize);
        let visible = (height as usize).saturating_sub(6).max(1);
        let rows = dialog.rows(prefs);
        let label_width = inner / 2;

        let mut lines = Vec::new();
        for (i, row) in rows.iter().enumerate().skip(dialog.scroll).take(visible) {
            let value = match (&dialog.editing, i == dialog.selected) {
                (Some(buffer), true) => format!("{}█", buffer),
                _ => row.value.clone(),
            };
            lines.push(format!("{} {}", fit(row.label, label_width), value));
        }
        lines.push(String::new());
        lines.push(match &dialog.error {
            Some(error) => error.clone(),
            None => "Enter:toggle/edit  Esc:close".to_string(),
        });

        let highlight = dialog.selected.checked_sub(dialog.scroll).filter(|i| *i < visible);
        self.render_box(out, "Preferences", &lines, inner, highlight, width, height)
    }

    /// Centered box with a title, one line per row
    #[allow(clippy::too_many_arguments)]
    fn render_box<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        lines: &[String],
        inner: usize,
        highlight: Option<usize>,
        width: u16,
        height: u16,
    ) -> io::Result<()> {
        let box_width = inner + 2;
        let box_height = lines.len() + 2;
        let x = ((width as usize).saturating_sub(box_width) / 2) as u16;
        let y = ((height as usize).saturating_sub(box_height) / 2) as u16;

        execute!(out, SetBackgroundColor(CtColor::DarkBlue), SetForegroundColor(CtColor::White))?;
        execute!(out, MoveTo(x, y))?;
        let head = format!("─ {} ", title);
        let head = fit(&head, head.width().min(inner));
        write!(out, "┌{}{}┐", head, "─".repeat(inner - head.width()))?;

        for (i, line) in lines.iter().enumerate() {
            execute!(out, MoveTo(x, y + 1 + i as u16))?;
            write!(out, "│")?;
            if Some(i) == highlight {
                execute!(out, SetBackgroundColor(CtColor::Blue))?;
            }
            write!(out, "{}", fit(&format!(" {}", line), inner))?;
            execute!(out, SetBackgroundColor(CtColor::DarkBlue))?;
            write!(out, "│")?;
        }

        execute!(out, MoveTo(x, y + box_height as u16 - 1))?;
        write!(out, "└{}┘", "─".repeat(inner))?;
        execute!(out, ResetColor)?;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MainContext;
    use crate::preferences::Preferences;
    use crate::wm::window::tests::{mock_factory, MockWidget};
    use crate::wm::Action;
    use std::rc::Rc;

    #[test]
    fn test_fit_pads_and_truncates_by_width() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
        // wide characters take two columns
        assert_eq!(fit("日本語", 5), "日本 ");
        assert_eq!(fit("", 0), "");
    }

    #[test]
    fn test_layout_follows_chrome() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let (factory, _) = mock_factory();
        let (tx, _rx) = std::sync::mpsc::channel();
        let window = crate::wm::TerminalWindow::new(1, &ctx, &prefs, factory, tx);
        window.borrow_mut().add(Box::new(MockWidget::new(80, 24, "a").0));

        let layout = ScreenLayout::compute(&window.borrow(), 24);
        assert_eq!(layout.menubar_row, Some(0));
        assert_eq!(layout.tab_row, None);
        assert_eq!((layout.body_top, layout.body_rows, layout.status_row), (1, 22, 23));

        window.borrow_mut().add(Box::new(MockWidget::new(80, 24, "b").0));
        window.borrow_mut().activate(Action::CompactMode).unwrap();
        let layout = ScreenLayout::compute(&window.borrow(), 24);
        assert_eq!(layout.menubar_row, None);
        assert_eq!(layout.tab_row, Some(0));
        assert_eq!((layout.body_top, layout.body_rows), (1, 22));
    }

    #[test]
    fn test_tab_at_columns() {
        let ctx = Rc::new(MainContext::new());
        let prefs = Preferences::open(None, &ctx);
        let (factory, _) = mock_factory();
        let (tx, _rx) = std::sync::mpsc::channel();
        let window = crate::wm::TerminalWindow::new(1, &ctx, &prefs, factory, tx);
        window.borrow_mut().add(Box::new(MockWidget::new(80, 24, "ab").0));
        window.borrow_mut().add(Box::new(MockWidget::new(80, 24, "cd").0));

        let window = window.borrow();
        // " 1: ab " is seven columns wide
        assert_eq!(tab_labels(&window)[0], " 1: ab ");
        assert_eq!(tab_at(&window, 0), Some(0));
        assert_eq!(tab_at(&window, 6), Some(0));
        assert_eq!(tab_at(&window, 7), Some(1));
        assert_eq!(tab_at(&window, 14), None);
    }
}
