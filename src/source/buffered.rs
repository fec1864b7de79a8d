use super::{LogListener, LogReader, SourceError, same_listener};
use crate::domain::LogEntry;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// In-memory log reader with a bounded history.
///
/// `log` appends to the history (dropping the oldest entry once the capacity
/// is reached) and then delivers the entry to every registered listener on
/// the calling thread.
pub struct BufferedLogReader {
    capacity: usize,
    // newest first
    history: Mutex<VecDeque<LogEntry>>,
    listeners: RwLock<Vec<Arc<dyn LogListener>>>,
    closed: AtomicBool,
}

impl BufferedLogReader {
    pub fn new(capacity: usize) -> Result<Self, SourceError> {
        if capacity == 0 {
            return Err(SourceError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            listeners: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn log(&self, entry: LogEntry) {
        if self.is_closed() {
            tracing::trace!(logger = %entry.logger_name, "Dropping entry for closed log source");
            return;
        }

        {
            let mut history = self.history.lock();
            if history.len() == self.capacity {
                history.pop_back();
            }
            history.push_front(entry.clone());
        }

        // Snapshot so listeners may (un)register themselves while being called
        let listeners: Vec<_> = self.listeners.read().clone();
        for listener in &listeners {
            listener.logged(&entry);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Marks the source as gone. Listeners are dropped and later removal
    /// attempts fail with [`SourceError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.listeners.write().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for BufferedLogReader {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            history: Mutex::new(VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY)),
            listeners: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }
}

impl LogReader for BufferedLogReader {
    fn add_listener(&self, listener: Arc<dyn LogListener>) {
        if self.is_closed() {
            return;
        }

        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    fn remove_listener(&self, listener: &Arc<dyn LogListener>) -> Result<(), SourceError> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }

        self.listeners.write().retain(|l| !same_listener(l, listener));
        Ok(())
    }

    fn history(&self) -> Vec<LogEntry> {
        self.history.lock().iter().cloned().collect()
    }
}

impl std::fmt::Debug for BufferedLogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedLogReader")
            .field("capacity", &self.capacity)
            .field("history_len", &self.history.lock().len())
            .field("listeners", &self.listener_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
