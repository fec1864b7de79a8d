//! Message formatting and logger identity resolution.

use crate::domain::{FrameworkStartLevel, LogEntry, ModuleInfo, ServiceInfo};
use std::borrow::Cow;
use std::fmt::Write;

pub const LOGGER_EVENT_FRAMEWORK: &str = "Events.Framework";
pub const LOGGER_EVENT_BUNDLE: &str = "Events.Bundle";
pub const LOGGER_EVENT_SERVICE: &str = "Events.Service";
pub const LOGGER_EVENT_LOG_SERVICE: &str = "LogService";

/// Logger names whose entries are logged under the originating module's name.
pub const LEVEL_SERVICE_LOGGERS: [&str; 4] = [
    LOGGER_EVENT_FRAMEWORK,
    LOGGER_EVENT_BUNDLE,
    LOGGER_EVENT_SERVICE,
    LOGGER_EVENT_LOG_SERVICE,
];

pub const STARTLEVEL_MARKER: &str = "STARTLEVEL CHANGED";

/// Identity used when an entry has no originating module.
pub const SYSTEM_MODULE_NAME: &str = "system.bundle";

/// Symbolic name, else location, else the numeric id.
pub fn resolve_module_name(module: Option<&ModuleInfo>) -> Cow<'_, str> {
    let Some(module) = module else {
        return Cow::Borrowed(SYSTEM_MODULE_NAME);
    };

    module
        .symbolic_name
        .as_deref()
        .or(module.location.as_deref())
        .map_or_else(|| Cow::Owned(module.id.to_string()), Cow::Borrowed)
}

/// Builds the single backend message for `entry`.
///
/// The start level is read here, so a start-level marker reports the level
/// current at format time.
pub fn format_message(entry: &LogEntry, start_level: &dyn FrameworkStartLevel) -> String {
    let mut msg = String::new();

    if let Some(service) = &entry.service {
        write_service(&mut msg, service);
    }

    if let Some(message) = &entry.message {
        msg.push_str(message);
        if entry.logger_name == LOGGER_EVENT_FRAMEWORK && message.contains(STARTLEVEL_MARKER) {
            let _ = write!(msg, " to {}", start_level.start_level());
        }
    }

    if let Some(error) = &entry.error {
        let _ = write!(msg, " ({error})");
    }

    msg
}

fn write_service(msg: &mut String, service: &ServiceInfo) {
    msg.push_str("Service [");
    if let Some(label) = service.label() {
        msg.push_str(label);
        msg.push(',');
    }
    let _ = write!(msg, "{}, [{}]] ", service.id, service.object_class.join(", "));
}
