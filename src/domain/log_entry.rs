use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::sync::Arc;

/// Causing error attached to a log entry.
pub type EntryError = Arc<dyn Error + Send + Sync + 'static>;

/// Identity of the component/service that produced an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Persistent identity (`service.pid`).
    pub pid: Option<String>,
    /// Component name (`component.name`).
    pub component_name: Option<String>,
    /// Human readable description (`service.description`).
    pub description: Option<String>,
    /// Numeric identity (`service.id`).
    pub id: u64,
    /// Declared capability names (`objectClass`).
    pub object_class: Vec<String>,
}

impl ServiceInfo {
    pub fn new(id: u64, object_class: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id,
            object_class: object_class.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_pid(mut self, pid: impl Into<String>) -> Self {
        self.pid = Some(pid.into());
        self
    }

    pub fn with_component_name(mut self, name: impl Into<String>) -> Self {
        self.component_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// First present of pid, component name and description.
    pub fn label(&self) -> Option<&str> {
        self.pid
            .as_deref()
            .or(self.component_name.as_deref())
            .or(self.description.as_deref())
    }
}

/// Identity of the module (bundle) that produced an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    pub symbolic_name: Option<String>,
    pub location: Option<String>,
    pub id: u64,
}

impl ModuleInfo {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_symbolic_name(mut self, name: impl Into<String>) -> Self {
        self.symbolic_name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A single entry read from an event source.
///
/// Entries are produced by the source and consumed synchronously by the
/// forwarder; they are never mutated after creation.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub logger_name: String,
    pub message: Option<String>,
    pub error: Option<EntryError>,
    pub timestamp: DateTime<Utc>,
    pub service: Option<ServiceInfo>,
    pub module: Option<ModuleInfo>,
}

impl LogEntry {
    pub fn new(level: LogLevel, logger_name: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: None,
            error: None,
            timestamp: Utc::now(),
            service: None,
            module: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error<E>(mut self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(error));
        self
    }

    pub fn with_service(mut self, service: ServiceInfo) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_module(mut self, module: ModuleInfo) -> Self {
        self.module = Some(module);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
