//! Notebook - ordered pages, each hosting one terminal widget

use crate::core::TerminalWidget;

/// Unique identifier for a page
pub type TabId = u64;

/// A notebook page
pub struct Page {
    pub id: TabId,
    pub widget: Box<dyn TerminalWidget>,
}

/// Ordered collection of pages with a current page
pub struct Notebook {
    pages: Vec<Page>,
    current: Option<usize>,
    show_tabs: bool,
    next_id: TabId,
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Notebook {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: None,
            show_tabs: false,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Append a page and return its id. The current page is unchanged.
    pub fn append(&mut self, widget: Box<dyn TerminalWidget>) -> TabId {
        let id = self.next_id;
        self.next_id += 1;
        self.pages.push(Page { id, widget });
        if self.current.is_none() {
            self.current = Some(self.pages.len() - 1);
        }
        id
    }

    /// Remove a page. The current page moves to its neighbour when it was removed.
    pub fn remove(&mut self, id: TabId) -> Option<Box<dyn TerminalWidget>> {
        let index = self.index_of(id)?;
        let page = self.pages.remove(index);

        self.current = match self.current {
            _ if self.pages.is_empty() => None,
            Some(current) if current > index => Some(current - 1),
            Some(current) => Some(current.min(self.pages.len() - 1)),
            None => Some(0),
        };
        Some(page.widget)
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current
    }

    pub fn current_id(&self) -> Option<TabId> {
        self.current.map(|i| self.pages[i].id)
    }

    /// Switch to page `index`. Returns false if out of range.
    pub fn set_current_page(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.current {
            Some(i) if i + 1 < self.pages.len() => self.set_current_page(i + 1),
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        match self.current {
            Some(i) if i > 0 => self.set_current_page(i - 1),
            _ => false,
        }
    }

    pub fn current_widget(&self) -> Option<&dyn TerminalWidget> {
        self.current.map(|i| self.pages[i].widget.as_ref())
    }

    pub fn current_widget_mut(&mut self) -> Option<&mut (dyn TerminalWidget + 'static)> {
        match self.current {
            Some(i) => Some(self.pages[i].widget.as_mut()),
            None => None,
        }
    }

    pub fn widget_mut(&mut self, id: TabId) -> Option<&mut (dyn TerminalWidget + 'static)> {
        self.pages
            .iter_mut()
            .find(|p| p.id == id)
            .map(|p| p.widget.as_mut())
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut()
    }

    pub fn show_tabs(&self) -> bool {
        self.show_tabs
    }

    pub fn set_show_tabs(&mut self, show: bool) {
        self.show_tabs = show;
    }

    /// Drop every page
    pub fn clear(&mut self) {
        self.pages.clear();
        self.current = None;
    }
}
