use super::config::{Config, FilterLevel, LogFormat};
use super::initialization::{FallbackStrategy, InitializationError, LogDirective};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds and installs the tracing subscriber that receives both the
/// bridge's own diagnostics and every entry forwarded through the `log`
/// facade.
pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
    fallback_level: FilterLevel,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
            fallback_level: FilterLevel::Info,
        }
    }

    /// Logging system for `config`: default directives plus the configured
    /// ones, with malformed directives handled by their fallback strategy.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let logging_system = Self::new();
        logging_system.add_default_directives();
        for directive in &config.log_directives {
            logging_system.add_directive(directive)?;
        }
        Ok(logging_system)
    }

    pub fn add_directive(&self, directive_str: &str) -> Result<(), InitializationError> {
        match LogDirective::parse(directive_str) {
            Ok(directive) => {
                self.directives.write().push(directive);
                Ok(())
            }
            Err(e) => match e.fallback_strategy() {
                FallbackStrategy::UseDefaultLevel => {
                    eprintln!("Warning: {e}, using default level");
                    self.add_default_directive(directive_str);
                    Ok(())
                }
                FallbackStrategy::SkipDirective => {
                    eprintln!("Warning: {e}, skipping directive");
                    Ok(())
                }
                FallbackStrategy::UseStderrLogging => Err(e),
            },
        }
    }

    fn add_default_directive(&self, directive_str: &str) {
        let target = directive_str.split('=').next().unwrap_or("unknown").trim();
        self.directives
            .write()
            .push(LogDirective::new(target, self.fallback_level));
    }

    pub fn add_default_directives(&self) {
        let default_directives = [("mio", FilterLevel::Warn), ("tokio", FilterLevel::Warn)];

        let mut directives = self.directives.write();
        for (target, level) in default_directives {
            directives.push(LogDirective::new(target, level));
        }
    }

    pub fn initialize_tracing(
        &self,
        default_level: FilterLevel,
        format: LogFormat,
    ) -> Result<(), InitializationError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| InitializationError::LoggingInitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            })?;

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = match format {
            LogFormat::Compact => tracing::subscriber::set_global_default(
                registry.with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(true)
                        .compact(),
                ),
            ),
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(fmt::layer().json().with_target(true).with_thread_ids(true)),
            ),
        };

        result.map_err(|e| InitializationError::LoggingInitFailed {
            details: "Failed to set global tracing subscriber".to_string(),
            source: Box::new(e),
        })?;

        // route `log` records from the forwarding backend into tracing
        tracing_log::LogTracer::init().map_err(|e| InitializationError::LoggingInitFailed {
            details: "Failed to install log facade bridge".to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    pub fn build_filter_string(&self, default_level: FilterLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));

        filter_parts.join(",")
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global subscriber once per process. Later calls return the
/// outcome of the first one.
pub fn setup_logging_safe(config: &Config) -> Result<(), InitializationError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = INIT.get_or_init(|| {
        LoggingSystem::from_config(config)
            .map_err(|e| e.to_string())?
            .initialize_tracing(config.log_level, config.log_format)
            .map_err(|e| e.to_string())
    });

    outcome
        .clone()
        .map_err(|details| InitializationError::LoggingInitFailed {
            details,
            source: Box::new(std::io::Error::other("Logging initialization error")),
        })
}
