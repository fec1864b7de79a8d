//! In-memory service registry for log readers.
//!
//! Readers are registered and unregistered at runtime; subscribed
//! [`ServiceListener`]s are notified synchronously on the thread performing
//! the change. [`ServiceTracker`] builds add/modify/remove tracking of
//! individual references on top of these notifications.

pub mod tracker;

use crate::source::LogReader;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use tracker::{ServiceTracker, TrackerCustomizer};

pub type ServiceId = u64;
pub type ListenerId = u64;
pub type Properties = BTreeMap<String, String>;

/// Handle to a registered log reader. Resolving it fails once the reader has
/// been unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceReference {
    id: ServiceId,
}

impl ServiceReference {
    pub fn id(&self) -> ServiceId {
        self.id
    }
}

impl fmt::Display for ServiceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceReference({})", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEvent {
    Registered(ServiceReference),
    Modified(ServiceReference),
    /// Delivered before the reader is removed from the registry.
    Unregistering(ServiceReference),
}

impl ServiceEvent {
    pub fn reference(&self) -> ServiceReference {
        match self {
            ServiceEvent::Registered(r) | ServiceEvent::Modified(r) | ServiceEvent::Unregistering(r) => *r,
        }
    }
}

pub trait ServiceListener: Send + Sync {
    fn service_changed(&self, event: ServiceEvent);
}

struct Registration {
    reader: Arc<dyn LogReader>,
    properties: Properties,
    // set while `Unregistering` is being delivered
    unregistering: bool,
}

impl Registration {
    fn is_live(&self) -> bool {
        !self.unregistering
    }
}

pub struct SourceRegistry {
    next_service_id: AtomicU64,
    next_listener_id: AtomicU64,
    services: RwLock<BTreeMap<ServiceId, Registration>>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn ServiceListener>)>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            next_service_id: AtomicU64::new(1),
            next_listener_id: AtomicU64::new(1),
            services: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, reader: Arc<dyn LogReader>, properties: Properties) -> ServiceReference {
        let id = self.next_service_id.fetch_add(1, Ordering::Relaxed);
        self.services.write().insert(
            id,
            Registration {
                reader,
                properties,
                unregistering: false,
            },
        );

        let reference = ServiceReference { id };
        tracing::debug!(service_id = id, "Log reader registered");
        self.dispatch(ServiceEvent::Registered(reference));
        reference
    }

    /// Returns `false` if the reference was not registered or is already
    /// being unregistered.
    ///
    /// While `Unregistering` is delivered the reference no longer resolves
    /// and its properties can no longer be changed.
    pub fn unregister(&self, reference: &ServiceReference) -> bool {
        {
            let mut services = self.services.write();
            match services.get_mut(&reference.id) {
                Some(registration) if registration.is_live() => registration.unregistering = true,
                _ => return false,
            }
        }

        self.dispatch(ServiceEvent::Unregistering(*reference));
        let removed = self.services.write().remove(&reference.id).is_some();
        if removed {
            tracing::debug!(service_id = reference.id, "Log reader unregistered");
        }
        removed
    }

    /// Replaces the properties of a registration and notifies listeners.
    pub fn set_properties(&self, reference: &ServiceReference, properties: Properties) -> bool {
        {
            let mut services = self.services.write();
            match services.get_mut(&reference.id) {
                Some(registration) if registration.is_live() => registration.properties = properties,
                _ => return false,
            }
        }

        self.dispatch(ServiceEvent::Modified(*reference));
        true
    }

    pub fn resolve(&self, reference: &ServiceReference) -> Option<Arc<dyn LogReader>> {
        self.services
            .read()
            .get(&reference.id)
            .filter(|r| r.is_live())
            .map(|r| r.reader.clone())
    }

    pub fn properties(&self, reference: &ServiceReference) -> Option<Properties> {
        self.services
            .read()
            .get(&reference.id)
            .filter(|r| r.is_live())
            .map(|r| r.properties.clone())
    }

    pub fn references(&self) -> Vec<ServiceReference> {
        self.services
            .read()
            .iter()
            .filter(|(_, r)| r.is_live())
            .map(|(&id, _)| ServiceReference { id })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    pub fn add_service_listener(&self, listener: Arc<dyn ServiceListener>) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, listener));
        id
    }

    pub fn remove_service_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn dispatch(&self, event: ServiceEvent) {
        // No registry lock is held while listeners run
        let listeners: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            listener.service_changed(event);
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("services", &self.len())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
