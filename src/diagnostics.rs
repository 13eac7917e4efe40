use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Entries kept between drains. Older entries are discarded first.
pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MissingTarget { function: &'static str },
    UnresolvedCallback { name: String },
    ScriptLoadFailed { message: String },
    UpdateFailed { message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingTarget { function } => {
                write!(f, "{function}: no dynamic object is configured")
            }
            Diagnostic::UnresolvedCallback { name } => {
                write!(f, "update function '{name}' is not defined by the script; ticks will do nothing")
            }
            Diagnostic::ScriptLoadFailed { message } => write!(f, "script load failed: {message}"),
            Diagnostic::UpdateFailed { message } => write!(f, "update function failed: {message}"),
        }
    }
}

#[derive(Debug)]
struct Entries {
    capacity: usize,
    retained: VecDeque<Diagnostic>,
    discarded: u64,
}

/// Shared between the host and the closures it publishes into the engine.
/// Holds at most `capacity` entries; a host that is never drained keeps only
/// the most recent ones and counts the rest.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: Rc<RefCell<Entries>>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DIAGNOSTIC_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let entries = Entries { capacity, retained: VecDeque::with_capacity(capacity), discarded: 0 };
        Self { entries: Rc::new(RefCell::new(entries)) }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::MissingTarget { .. } | Diagnostic::UnresolvedCallback { .. } => {
                tracing::warn!("{diagnostic}")
            }
            Diagnostic::ScriptLoadFailed { .. } | Diagnostic::UpdateFailed { .. } => {
                tracing::error!("{diagnostic}")
            }
        }
        let mut entries = self.entries.borrow_mut();
        if entries.retained.len() == entries.capacity {
            entries.retained.pop_front();
            entries.discarded += 1;
        }
        entries.retained.push_back(diagnostic);
    }

    /// Drains the retained entries, oldest first.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.entries.borrow_mut().retained.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().retained.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.borrow().capacity
    }

    /// Entries pushed out by newer ones since the log was created.
    pub fn discarded(&self) -> u64 {
        self.entries.borrow().discarded
    }
}
