//! Source lifecycle management: attaches the shared [`EventForwarder`] to
//! every log reader present in the registry and detaches it when the reader
//! goes away.

use crate::domain::FrameworkStartLevel;
use crate::forwarder::{EventForwarder, LogBackend};
use crate::registry::{ServiceReference, ServiceTracker, SourceRegistry, TrackerCustomizer};
use crate::source::{LogListener, LogReader};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Tracker callbacks wiring a reader to the forwarder.
pub struct ForwardingCustomizer {
    registry: Arc<SourceRegistry>,
    forwarder: Arc<EventForwarder>,
    // same allocation as `forwarder`, so removal finds the registered listener
    listener: Arc<dyn LogListener>,
}

impl ForwardingCustomizer {
    pub fn new(registry: Arc<SourceRegistry>, forwarder: Arc<EventForwarder>) -> Self {
        let listener: Arc<dyn LogListener> = forwarder.clone();
        Self {
            registry,
            forwarder,
            listener,
        }
    }

    pub fn forwarder(&self) -> &Arc<EventForwarder> {
        &self.forwarder
    }
}

impl TrackerCustomizer for ForwardingCustomizer {
    fn on_added(&self, reference: &ServiceReference) -> Option<Arc<dyn LogReader>> {
        let Some(reader) = self.registry.resolve(reference) else {
            trace!(%reference, "Log reader no longer available, skipping");
            return None;
        };

        reader.add_listener(self.listener.clone());
        self.forwarder.replay(reader.history());
        debug!(%reference, "Attached forwarder to log reader");
        Some(reader)
    }

    fn on_modified(&self, _reference: &ServiceReference, _service: &Arc<dyn LogReader>) {
        // nothing to do
    }

    fn on_removed(&self, reference: &ServiceReference, service: Arc<dyn LogReader>) {
        match service.remove_listener(&self.listener) {
            Ok(()) => debug!(%reference, "Detached forwarder from log reader"),
            Err(e) => debug!(%reference, error = %e, "Log reader already gone"),
        }
    }
}

/// Keeps exactly one forwarder subscription per log reader in the registry.
///
/// Construction opens the tracker; [`stop`](Self::stop) (or drop) closes it,
/// detaching the forwarder from every reader still tracked.
pub struct SourceLifecycleManager {
    tracker: Option<ServiceTracker>,
    forwarder: Option<Arc<EventForwarder>>,
}

impl SourceLifecycleManager {
    pub fn start(
        registry: Arc<SourceRegistry>,
        start_level: Arc<dyn FrameworkStartLevel>,
        backend: Arc<dyn LogBackend>,
    ) -> Self {
        let forwarder = Arc::new(EventForwarder::new(backend, start_level));
        Self::start_with_forwarder(registry, forwarder)
    }

    pub fn start_with_forwarder(registry: Arc<SourceRegistry>, forwarder: Arc<EventForwarder>) -> Self {
        let customizer = Arc::new(ForwardingCustomizer::new(registry.clone(), forwarder.clone()));
        let tracker = ServiceTracker::new(registry, customizer);
        tracker.open();

        info!(sources = tracker.tracked(), "Log source tracking started");

        Self {
            tracker: Some(tracker),
            forwarder: Some(forwarder),
        }
    }

    pub fn stop(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.close();
            info!("Log source tracking stopped");
        }
        self.forwarder = None;
    }

    pub fn is_running(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn forwarder(&self) -> Option<&Arc<EventForwarder>> {
        self.forwarder.as_ref()
    }

    pub fn tracked_sources(&self) -> usize {
        self.tracker.as_ref().map_or(0, ServiceTracker::tracked)
    }
}

impl Drop for SourceLifecycleManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SourceLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLifecycleManager")
            .field("running", &self.is_running())
            .field("tracked_sources", &self.tracked_sources())
            .finish()
    }
}
