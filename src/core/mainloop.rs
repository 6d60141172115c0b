//! Single-threaded cooperative main loop.
//!
//! Work that must not run inside the current dispatch (preferences store,
//! dialog construction) is queued here and executed on a later turn of the
//! loop. Owners keep the returned [`SourceId`] in an `Option` field and check
//! it before queueing again, so at most one task of a kind is pending.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

/// Scheduling priority, lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Default,
    DefaultIdle,
    Low,
}

/// Handle for a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Task = Box<dyn FnOnce()>;

/// Main loop context holding the idle queue
pub struct MainContext {
    /// Queued tasks keyed by (priority, insertion id)
    queue: RefCell<BTreeMap<(Priority, SourceId), Task>>,
    /// Next source id
    next_id: Cell<u64>,
}

impl Default for MainContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MainContext {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Queue `task` to run on a later iteration
    pub fn idle_add<F>(&self, priority: Priority, task: F) -> SourceId
    where
        F: FnOnce() + 'static,
    {
        let id = SourceId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().insert((priority, id), Box::new(task));
        id
    }

    /// Withdraw a queued task. Returns false if it already ran or was removed.
    pub fn remove(&self, id: SourceId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let key = queue.keys().find(|(_, sid)| *sid == id).copied();
        match key {
            Some(key) => queue.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: SourceId) -> bool {
        self.queue.borrow().keys().any(|(_, sid)| *sid == id)
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the highest-priority task. Returns false if the queue was empty.
    pub fn iteration(&self) -> bool {
        // Release the queue borrow before running: tasks may queue or remove others.
        let task = {
            let mut queue = self.queue.borrow_mut();
            let key = match queue.keys().next() {
                Some(key) => *key,
                None => return false,
            };
            queue.remove(&key)
        };

        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run queued tasks until the queue is empty, returning how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.iteration() {
            ran += 1;
        }
        ran
    }
}
