/// Maintenance tracker: Collaborator Ports
///
/// The engine never reads the system clock or writes a log file itself.
/// Both are injected, and tests swap in the in-memory versions below.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{Local, NaiveDateTime};

/// Source of wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Append-only activity log. Appends never fail from the caller's view.
pub trait ActivityLog {
    fn append(&self, message: &str);
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<T: ActivityLog + ?Sized> ActivityLog for Rc<T> {
    fn append(&self, message: &str) {
        (**self).append(message)
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn set(&self, instant: NaiveDateTime) {
        self.now.set(instant);
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ActivityLog for NullLog {
    fn append(&self, _message: &str) {}
}

/// Keeps every appended line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: RefCell<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl ActivityLog for MemoryLog {
    fn append(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}
