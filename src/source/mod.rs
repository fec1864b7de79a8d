//! Event-source capability: readers that buffer recent entries and deliver
//! live entries to registered listeners.

pub mod buffered;

use crate::domain::LogEntry;
use std::sync::Arc;
use thiserror::Error;

pub use buffered::{BufferedLogReader, DEFAULT_HISTORY_CAPACITY};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Log source is closed")]
    Closed,
    #[error("Invalid history capacity: {0}")]
    InvalidCapacity(usize),
}

/// Receives live entries from a log reader.
///
/// `logged` is called on whatever thread the source delivers on.
pub trait LogListener: Send + Sync {
    fn logged(&self, entry: &LogEntry);
}

/// A runtime-discoverable source of log entries.
#[cfg_attr(test, mockall::automock)]
pub trait LogReader: Send + Sync {
    /// Registers `listener` for live delivery. Registering the same listener
    /// twice is a no-op.
    fn add_listener(&self, listener: Arc<dyn LogListener>);

    /// Unregisters `listener`. Unknown listeners are ignored.
    fn remove_listener(&self, listener: &Arc<dyn LogListener>) -> Result<(), SourceError>;

    /// Buffered history, newest entry first.
    fn history(&self) -> Vec<LogEntry>;
}

/// Listener identity is pointer identity of the shared allocation.
pub fn same_listener(a: &Arc<dyn LogListener>, b: &Arc<dyn LogListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
