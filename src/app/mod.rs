pub mod config;
pub mod initialization;
pub mod logging_system;

pub use config::{Config, ConfigError, FilterLevel, LogFormat};
pub use initialization::InitializationError;
pub use logging_system::{LoggingSystem, setup_logging_safe};

use crate::domain::{BridgeError, LogEntry, LogLevel, ModuleInfo, ServiceInfo, StartLevel};
use crate::forwarder::FacadeBackend;
use crate::forwarder::format::LOGGER_EVENT_FRAMEWORK;
use crate::lifecycle::SourceLifecycleManager;
use crate::registry::{Properties, ServiceReference, SourceRegistry};
use crate::source::BufferedLogReader;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// Self-contained host: a registry with the framework's own log reader, a
/// start-level counter, and the lifecycle manager bridging every registered
/// reader to the `log` facade.
pub struct App {
    config: Config,
    registry: Arc<SourceRegistry>,
    start_level: StartLevel,
    framework_log: Arc<BufferedLogReader>,
    framework_log_ref: ServiceReference,
    manager: Option<SourceLifecycleManager>,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, BridgeError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args_and_env(args)?;
        setup_logging_safe(&config)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, BridgeError> {
        config.validate()?;

        let registry = Arc::new(SourceRegistry::new());
        let start_level = StartLevel::new(config.initial_start_level);
        let framework_log = Arc::new(BufferedLogReader::new(config.history_capacity)?);

        let mut properties = Properties::new();
        properties.insert(
            "service.description".to_string(),
            "Framework log reader".to_string(),
        );
        let framework_log_ref = registry.register(framework_log.clone(), properties);

        framework_log.log(
            LogEntry::new(LogLevel::Info, LOGGER_EVENT_FRAMEWORK)
                .with_message("FrameworkEvent STARTED")
                .with_module(system_module()),
        );

        Ok(Self {
            config,
            registry,
            start_level,
            framework_log,
            framework_log_ref,
            manager: None,
        })
    }

    /// Attaches the forwarder to every registered reader, replaying what
    /// they buffered so far.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if self.manager.is_some() {
            return Err(BridgeError::AlreadyStarted);
        }

        info!("Starting logsource-bridge v{}", env!("CARGO_PKG_VERSION"));
        self.manager = Some(SourceLifecycleManager::start(
            self.registry.clone(),
            Arc::new(self.start_level.clone()),
            Arc::new(FacadeBackend::new()),
        ));
        Ok(())
    }

    /// Raises the start level one step at a time up to the configured
    /// target, logging a framework event for every step.
    pub fn advance_start_level(&self) {
        while self.start_level.get() < self.config.target_start_level {
            self.start_level.set(self.start_level.get() + 1);
            self.framework_log.log(
                LogEntry::new(LogLevel::Info, LOGGER_EVENT_FRAMEWORK)
                    .with_message("FrameworkEvent STARTLEVEL CHANGED")
                    .with_module(system_module()),
            );
        }
    }

    /// Registers an additional log reader the way a component would when it
    /// comes up, and logs one entry attributed to that component.
    pub fn register_component_log(&self, name: &str, service_id: u64) -> Result<ServiceReference, BridgeError> {
        let reader = Arc::new(BufferedLogReader::new(self.config.history_capacity)?);
        reader.log(
            LogEntry::new(LogLevel::Info, name)
                .with_message("component activated")
                .with_service(
                    ServiceInfo::new(service_id, ["logsource.bridge.LogReader"])
                        .with_component_name(name),
                ),
        );
        Ok(self.registry.register(reader, Properties::new()))
    }

    pub fn stop(&mut self) {
        if let Some(mut manager) = self.manager.take() {
            manager.stop();
        }
    }

    pub async fn run(mut self) -> Result<(), BridgeError> {
        self.start()?;
        self.advance_start_level();
        let component = self.register_component_log("logsource.bridge.demo", 1000)?;

        info!("logsource-bridge is running. Press Ctrl+C to stop.");

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| BridgeError::Shutdown(e.to_string()))?;

        self.registry.unregister(&component);
        self.stop();
        self.registry.unregister(&self.framework_log_ref);
        info!("logsource-bridge stopped.");
        Ok(())
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn start_level(&self) -> &StartLevel {
        &self.start_level
    }

    pub fn framework_log(&self) -> &Arc<BufferedLogReader> {
        &self.framework_log
    }

    pub fn manager(&self) -> Option<&SourceLifecycleManager> {
        self.manager.as_ref()
    }
}

fn system_module() -> ModuleInfo {
    ModuleInfo::new(0).with_symbolic_name("system.bundle")
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        println!("logsource-bridge {}", get_version());
        return Ok(());
    }

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        Config::parse_from(["logsource-bridge", "--help"]);
        return Ok(());
    }

    match App::from_args(args) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    }

    Ok(())
}
