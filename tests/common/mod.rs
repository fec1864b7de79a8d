#![allow(dead_code)]

use log::{Level, LevelFilter};
use logsource_bridge::domain::{FrameworkStartLevel, LogEntry, LogLevel};
use logsource_bridge::forwarder::{BackendLogger, LogBackend};
use logsource_bridge::source::LogListener;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub logger: String,
    pub level: Level,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Default)]
struct Shared {
    thresholds: Mutex<HashMap<String, LevelFilter>>,
    default_threshold: Mutex<Option<LevelFilter>>,
    records: Mutex<Vec<Recorded>>,
    in_call: AtomicBool,
    overlaps: AtomicUsize,
}

impl Shared {
    fn threshold(&self, name: &str) -> LevelFilter {
        self.thresholds
            .lock()
            .get(name)
            .copied()
            .or(*self.default_threshold.lock())
            .unwrap_or(LevelFilter::Trace)
    }
}

struct RecordingLogger {
    name: String,
    shared: Arc<Shared>,
}

impl BackendLogger for RecordingLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self, level: Level) -> bool {
        level <= self.shared.threshold(&self.name)
    }

    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>) {
        if self.shared.in_call.swap(true, Ordering::SeqCst) {
            self.shared.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::yield_now();

        self.shared.records.lock().push(Recorded {
            logger: self.name.clone(),
            level,
            message: message.to_string(),
            error: error.map(|e| e.to_string()),
        });

        self.shared.in_call.store(false, Ordering::SeqCst);
    }
}

/// Backend recording every emitted call, with per-logger thresholds and
/// detection of overlapping backend calls.
#[derive(Default)]
pub struct RecordingBackend {
    shared: Arc<Shared>,
    loggers: Mutex<HashMap<String, Arc<dyn BackendLogger>>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_threshold(threshold: LevelFilter) -> Arc<Self> {
        let backend = Self::default();
        *backend.shared.default_threshold.lock() = Some(threshold);
        Arc::new(backend)
    }

    pub fn set_threshold(&self, logger: &str, threshold: LevelFilter) {
        self.shared
            .thresholds
            .lock()
            .insert(logger.to_string(), threshold);
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.shared.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn clear(&self) {
        self.shared.records.lock().clear();
    }

    pub fn overlaps(&self) -> usize {
        self.shared.overlaps.load(Ordering::SeqCst)
    }

    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl LogBackend for RecordingBackend {
    fn logger(&self, name: &str) -> Arc<dyn BackendLogger> {
        self.loggers
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| -> Arc<dyn BackendLogger> {
                Arc::new(RecordingLogger {
                    name: name.to_string(),
                    shared: self.shared.clone(),
                })
            })
            .clone()
    }
}

/// Start level that counts how often it was read.
#[derive(Default)]
pub struct CountingStartLevel {
    pub level: AtomicI32,
    pub reads: AtomicUsize,
}

impl CountingStartLevel {
    pub fn new(level: i32) -> Arc<Self> {
        Arc::new(Self {
            level: AtomicI32::new(level),
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FrameworkStartLevel for CountingStartLevel {
    fn start_level(&self) -> i32 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.level.load(Ordering::SeqCst)
    }
}

/// Listener counting deliveries, used to observe sources directly.
#[derive(Default)]
pub struct CountingListener {
    pub count: AtomicUsize,
}

impl LogListener for CountingListener {
    fn logged(&self, _entry: &LogEntry) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn info(logger: &str, message: &str) -> LogEntry {
    LogEntry::new(LogLevel::Info, logger).with_message(message)
}
