use thiserror::Error;

/// Top-level error type for the bridge host.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Initialization error: {0}")]
    Initialization(#[from] crate::app::InitializationError),

    #[error("Source error: {0}")]
    Source(#[from] crate::source::SourceError),

    #[error("Bridge already started")]
    AlreadyStarted,

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
