use log::{Level, Metadata, Record};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

/// Handle to a named logger of the structured-logging backend.
pub trait BackendLogger: Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self, level: Level) -> bool;

    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>);

    fn is_trace_enabled(&self) -> bool {
        self.is_enabled(Level::Trace)
    }

    fn is_debug_enabled(&self) -> bool {
        self.is_enabled(Level::Debug)
    }

    fn is_info_enabled(&self) -> bool {
        self.is_enabled(Level::Info)
    }

    fn is_warn_enabled(&self) -> bool {
        self.is_enabled(Level::Warn)
    }

    fn is_error_enabled(&self) -> bool {
        self.is_enabled(Level::Error)
    }

    fn trace(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(Level::Trace, message, error);
    }

    fn debug(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(Level::Debug, message, error);
    }

    fn info(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(Level::Info, message, error);
    }

    fn warn(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(Level::Warn, message, error);
    }

    fn error(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        self.log(Level::Error, message, error);
    }
}

/// Factory for backend loggers. Implementations are expected to hand out
/// the same handle for the same identity.
pub trait LogBackend: Send + Sync {
    fn logger(&self, name: &str) -> Arc<dyn BackendLogger>;
}

/// Backend writing through the `log` crate facade, using the logger identity
/// as the record target.
#[derive(Default)]
pub struct FacadeBackend {
    loggers: RwLock<HashMap<String, Arc<dyn BackendLogger>>>,
}

impl FacadeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger_count(&self) -> usize {
        self.loggers.read().len()
    }
}

impl LogBackend for FacadeBackend {
    fn logger(&self, name: &str) -> Arc<dyn BackendLogger> {
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }

        self.loggers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| -> Arc<dyn BackendLogger> { Arc::new(FacadeLogger::new(name)) })
            .clone()
    }
}

impl std::fmt::Debug for FacadeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacadeBackend")
            .field("loggers", &self.logger_count())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct FacadeLogger {
    target: String,
}

impl FacadeLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl BackendLogger for FacadeLogger {
    fn name(&self) -> &str {
        &self.target
    }

    fn is_enabled(&self, level: Level) -> bool {
        level <= log::max_level()
            && log::logger().enabled(&Metadata::builder().level(level).target(&self.target).build())
    }

    fn log(&self, level: Level, message: &str, error: Option<&(dyn Error + 'static)>) {
        let logger = log::logger();
        match error {
            Some(error) => {
                let kv = ("error", log::kv::Value::from_dyn_error(error));
                logger.log(
                    &Record::builder()
                        .args(format_args!("{message}"))
                        .level(level)
                        .target(&self.target)
                        .key_values(&kv)
                        .build(),
                );
            }
            None => logger.log(
                &Record::builder()
                    .args(format_args!("{message}"))
                    .level(level)
                    .target(&self.target)
                    .build(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loggers_are_memoized_per_identity() {
        let backend = FacadeBackend::new();
        let a = backend.logger("org.example.a");
        let b = backend.logger("org.example.a");
        let c = backend.logger("org.example.c");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(c.name(), "org.example.c");
        assert_eq!(backend.logger_count(), 2);
    }
}
