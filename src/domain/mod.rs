//! Domain layer for logsource-bridge.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: an entry read from an event source, with its
//!   `ServiceInfo` and `ModuleInfo` origin
//! - `LogLevel`: source severity (Audit/Trace/Debug/Info/Warn/Error)
//! - `StartLevel`: the framework start level read by the forwarder
//! - `BridgeError`: Top-level error type

pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod start_level;

pub use error::BridgeError;
pub use log_entry::{EntryError, LogEntry, ModuleInfo, ServiceInfo};
pub use log_level::LogLevel;
pub use start_level::{FrameworkStartLevel, StartLevel};
