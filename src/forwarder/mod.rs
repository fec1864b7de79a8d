pub mod backend;
pub mod format;

use crate::domain::{FrameworkStartLevel, LogEntry, LogLevel};
use crate::source::LogListener;
use parking_lot::ReentrantMutex;
use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;

pub use backend::{BackendLogger, FacadeBackend, FacadeLogger, LogBackend};
pub use format::{LEVEL_SERVICE_LOGGERS, format_message, resolve_module_name};

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Entries from these loggers are logged under their module's name.
    pub level_service_loggers: Vec<String>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            level_service_loggers: LEVEL_SERVICE_LOGGERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Forwards log entries from any number of sources to a [`LogBackend`].
///
/// One instance is shared by every attached source. Severity gating happens
/// without locking; formatting and the backend call run under a single
/// guard so that no two messages are ever built or emitted interleaved.
pub struct EventForwarder {
    backend: Arc<dyn LogBackend>,
    start_level: Arc<dyn FrameworkStartLevel>,
    config: ForwarderConfig,
    // reentrant: replay holds it across the batch and forward_one nests
    emit_guard: ReentrantMutex<()>,
}

impl EventForwarder {
    pub fn new(backend: Arc<dyn LogBackend>, start_level: Arc<dyn FrameworkStartLevel>) -> Self {
        Self::with_config(backend, start_level, ForwarderConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn LogBackend>,
        start_level: Arc<dyn FrameworkStartLevel>,
        config: ForwarderConfig,
    ) -> Self {
        Self {
            backend,
            start_level,
            config,
            emit_guard: ReentrantMutex::new(()),
        }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn is_level_service_entry(&self, entry: &LogEntry) -> bool {
        self.config
            .level_service_loggers
            .iter()
            .any(|name| *name == entry.logger_name)
    }

    /// Backend logger identity for `entry`.
    pub fn logger_identity<'a>(&self, entry: &'a LogEntry) -> Cow<'a, str> {
        if self.is_level_service_entry(entry) {
            resolve_module_name(entry.module.as_ref())
        } else {
            Cow::Borrowed(entry.logger_name.as_str())
        }
    }

    pub fn forward_one(&self, entry: &LogEntry) {
        let logger = self.backend.logger(&self.logger_identity(entry));
        if !is_enabled(logger.as_ref(), entry.level) {
            // early exit, no formatting work for disabled levels
            return;
        }

        let _guard = self.emit_guard.lock();
        let message = format_message(entry, self.start_level.as_ref());
        let error = entry.error.as_deref().map(|e| e as &(dyn Error + 'static));
        emit(logger.as_ref(), entry.level, &message, error);
    }

    /// Forwards a newest-first history batch in chronological order.
    ///
    /// The whole batch is emitted under the guard, so two replays never
    /// interleave.
    pub fn replay<I>(&self, history: I)
    where
        I: IntoIterator<Item = LogEntry>,
    {
        let mut entries: Vec<LogEntry> = history.into_iter().collect();
        entries.reverse();

        tracing::debug!(entries = entries.len(), "Replaying buffered log history");

        let _guard = self.emit_guard.lock();
        for entry in &entries {
            self.forward_one(entry);
        }
    }
}

impl LogListener for EventForwarder {
    fn logged(&self, entry: &LogEntry) {
        self.forward_one(entry);
    }
}

impl std::fmt::Debug for EventForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventForwarder")
            .field("config", &self.config)
            .field("start_level", &self.start_level.start_level())
            .finish()
    }
}

/// Whether `logger` accepts entries of `level`.
pub fn is_enabled(logger: &dyn BackendLogger, level: LogLevel) -> bool {
    match level {
        LogLevel::Debug => logger.is_debug_enabled(),
        LogLevel::Info => logger.is_info_enabled(),
        LogLevel::Warn => logger.is_warn_enabled(),
        LogLevel::Error => logger.is_error_enabled(),
        LogLevel::Trace => logger.is_trace_enabled(),
        // audit is treated as trace
        LogLevel::Audit => logger.is_trace_enabled(),
    }
}

fn emit(
    logger: &dyn BackendLogger,
    level: LogLevel,
    message: &str,
    error: Option<&(dyn Error + 'static)>,
) {
    match level {
        LogLevel::Debug => logger.debug(message, error),
        LogLevel::Info => logger.info(message, error),
        LogLevel::Warn => logger.warn(message, error),
        LogLevel::Error => logger.error(message, error),
        LogLevel::Trace => logger.trace(message, error),
        LogLevel::Audit => logger.trace(message, error),
    }
}
