use super::{ListenerId, ServiceEvent, ServiceListener, ServiceReference, SourceRegistry};
use crate::source::LogReader;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Callbacks driven by a [`ServiceTracker`].
pub trait TrackerCustomizer: Send + Sync {
    /// A matching reference appeared. Returning `None` leaves it untracked.
    fn on_added(&self, reference: &ServiceReference) -> Option<Arc<dyn LogReader>>;

    /// A tracked reference changed its properties or was reported again.
    fn on_modified(&self, reference: &ServiceReference, service: &Arc<dyn LogReader>);

    /// A tracked reference went away or the tracker was closed.
    fn on_removed(&self, reference: &ServiceReference, service: Arc<dyn LogReader>);
}

#[derive(Default)]
struct TrackerState {
    tracked: HashMap<ServiceReference, Arc<dyn LogReader>>,
    // references whose `on_added` is in flight
    adding: HashSet<ServiceReference>,
    // events delivered after close are ignored
    closed: bool,
}

struct TrackerInner {
    customizer: Arc<dyn TrackerCustomizer>,
    state: Mutex<TrackerState>,
}

impl TrackerInner {
    fn track(&self, reference: ServiceReference) {
        let existing = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            if let Some(service) = state.tracked.get(&reference) {
                Some(service.clone())
            } else if !state.adding.insert(reference) {
                // another thread is already adding it
                return;
            } else {
                None
            }
        };

        if let Some(service) = existing {
            self.customizer.on_modified(&reference, &service);
            return;
        }

        let added = self.customizer.on_added(&reference);

        let cancelled = {
            let mut state = self.state.lock();
            let still_pending = state.adding.remove(&reference) && !state.closed;
            match &added {
                Some(service) if still_pending => {
                    state.tracked.insert(reference, service.clone());
                    false
                }
                _ => !still_pending,
            }
        };

        match added {
            Some(service) if cancelled => {
                // removed or closed while on_added was running
                self.customizer.on_removed(&reference, service);
            }
            Some(_) => tracing::debug!(%reference, "Tracking log reader"),
            None => tracing::trace!(%reference, "Log reader not tracked"),
        }
    }

    fn untrack(&self, reference: ServiceReference) {
        let removed = {
            let mut state = self.state.lock();
            state.adding.remove(&reference);
            state.tracked.remove(&reference)
        };

        if let Some(service) = removed {
            tracing::debug!(%reference, "Untracking log reader");
            self.customizer.on_removed(&reference, service);
        }
    }

    fn untrack_all(&self) {
        let drained: Vec<_> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.adding.clear();
            state.tracked.drain().collect()
        };

        for (reference, service) in drained {
            self.customizer.on_removed(&reference, service);
        }
    }
}

impl ServiceListener for TrackerInner {
    fn service_changed(&self, event: ServiceEvent) {
        match event {
            ServiceEvent::Registered(reference) | ServiceEvent::Modified(reference) => {
                self.track(reference);
            }
            ServiceEvent::Unregistering(reference) => self.untrack(reference),
        }
    }
}

/// Tracks every log reader in a [`SourceRegistry`] and reports
/// add/modify/remove transitions to a [`TrackerCustomizer`].
///
/// A reference reported as added while already tracked is forwarded to
/// `on_modified`, so the customizer never sees two adds for one reference
/// without a remove in between.
pub struct ServiceTracker {
    registry: Arc<SourceRegistry>,
    inner: Arc<TrackerInner>,
    listener_id: Mutex<Option<ListenerId>>,
}

impl ServiceTracker {
    pub fn new(registry: Arc<SourceRegistry>, customizer: Arc<dyn TrackerCustomizer>) -> Self {
        Self {
            registry,
            inner: Arc::new(TrackerInner {
                customizer,
                state: Mutex::new(TrackerState::default()),
            }),
            listener_id: Mutex::new(None),
        }
    }

    /// Subscribes to the registry and reports every reader that is already
    /// registered. Opening an open tracker does nothing.
    pub fn open(&self) {
        {
            let mut listener_id = self.listener_id.lock();
            if listener_id.is_some() {
                return;
            }
            self.inner.state.lock().closed = false;
            let listener: Arc<dyn ServiceListener> = self.inner.clone();
            *listener_id = Some(self.registry.add_service_listener(listener));
        }

        for reference in self.registry.references() {
            self.inner.track(reference);
        }
    }

    /// Unsubscribes and reports every tracked reader as removed.
    ///
    /// Registry events already in flight when the tracker closes are
    /// dropped, so nothing is tracked once `close` returns.
    pub fn close(&self) {
        let Some(id) = self.listener_id.lock().take() else {
            return;
        };

        self.registry.remove_service_listener(id);
        self.inner.untrack_all();
    }

    pub fn is_open(&self) -> bool {
        self.listener_id.lock().is_some()
    }

    pub fn tracked(&self) -> usize {
        self.inner.state.lock().tracked.len()
    }

    pub fn tracked_references(&self) -> Vec<ServiceReference> {
        let mut references: Vec<_> = self.inner.state.lock().tracked.keys().copied().collect();
        references.sort();
        references
    }
}

impl Drop for ServiceTracker {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ServiceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTracker")
            .field("open", &self.is_open())
            .field("tracked", &self.tracked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Properties;
    use crate::source::BufferedLogReader;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Added(u64),
        Modified(u64),
        Removed(u64),
    }

    struct Recording {
        registry: Arc<SourceRegistry>,
        calls: Mutex<Vec<Call>>,
    }

    impl TrackerCustomizer for Recording {
        fn on_added(&self, reference: &ServiceReference) -> Option<Arc<dyn LogReader>> {
            self.calls.lock().push(Call::Added(reference.id()));
            self.registry.resolve(reference)
        }

        fn on_modified(&self, reference: &ServiceReference, _service: &Arc<dyn LogReader>) {
            self.calls.lock().push(Call::Modified(reference.id()));
        }

        fn on_removed(&self, reference: &ServiceReference, _service: Arc<dyn LogReader>) {
            self.calls.lock().push(Call::Removed(reference.id()));
        }
    }

    fn setup() -> (Arc<SourceRegistry>, Arc<Recording>, ServiceTracker) {
        let registry = Arc::new(SourceRegistry::new());
        let recording = Arc::new(Recording {
            registry: registry.clone(),
            calls: Mutex::new(Vec::new()),
        });
        let tracker = ServiceTracker::new(registry.clone(), recording.clone());
        (registry, recording, tracker)
    }

    fn reader() -> Arc<dyn LogReader> {
        Arc::new(BufferedLogReader::default())
    }

    #[test]
    fn test_open_reports_existing_references() {
        let (registry, recording, tracker) = setup();
        let a = registry.register(reader(), Properties::new());

        tracker.open();
        assert_eq!(*recording.calls.lock(), vec![Call::Added(a.id())]);
        assert_eq!(tracker.tracked(), 1);

        // second open is ignored
        tracker.open();
        assert_eq!(recording.calls.lock().len(), 1);
    }

    #[test]
    fn test_add_modify_remove_cycle() {
        let (registry, recording, tracker) = setup();
        tracker.open();

        let a = registry.register(reader(), Properties::new());
        registry.set_properties(&a, Properties::new());
        registry.unregister(&a);

        assert_eq!(
            *recording.calls.lock(),
            vec![
                Call::Added(a.id()),
                Call::Modified(a.id()),
                Call::Removed(a.id()),
            ]
        );
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn test_duplicate_add_is_reported_as_modified() {
        let (registry, recording, tracker) = setup();
        tracker.open();
        let a = registry.register(reader(), Properties::new());

        tracker.inner.service_changed(ServiceEvent::Registered(a));

        assert_eq!(
            *recording.calls.lock(),
            vec![Call::Added(a.id()), Call::Modified(a.id())]
        );
        assert_eq!(tracker.tracked(), 1);
    }

    #[test]
    fn test_close_removes_all_tracked() {
        let (registry, recording, tracker) = setup();
        let a = registry.register(reader(), Properties::new());
        let b = registry.register(reader(), Properties::new());
        tracker.open();

        tracker.close();
        assert!(!tracker.is_open());
        assert_eq!(tracker.tracked(), 0);

        let mut removed: Vec<_> = recording
            .calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Removed(_)))
            .cloned()
            .collect();
        removed.sort_by_key(|c| match c {
            Call::Removed(id) => *id,
            _ => 0,
        });
        assert_eq!(removed, vec![Call::Removed(a.id()), Call::Removed(b.id())]);

        // closed tracker no longer sees registry events
        registry.register(reader(), Properties::new());
        assert_eq!(tracker.tracked(), 0);
    }

    /// Closes the tracker from inside a registry event that is dispatched
    /// to it right afterwards.
    struct CloseOnRegistered {
        tracker: Mutex<Option<Arc<ServiceTracker>>>,
    }

    impl ServiceListener for CloseOnRegistered {
        fn service_changed(&self, event: ServiceEvent) {
            if !matches!(event, ServiceEvent::Registered(_)) {
                return;
            }
            let tracker = self.tracker.lock().take();
            if let Some(tracker) = tracker {
                tracker.close();
            }
        }
    }

    #[test]
    fn test_event_in_flight_during_close_is_ignored() {
        let (registry, recording, tracker) = setup();
        let tracker = Arc::new(tracker);
        // registered first, so it runs before the tracker sees the event
        registry.add_service_listener(Arc::new(CloseOnRegistered {
            tracker: Mutex::new(Some(tracker.clone())),
        }));
        tracker.open();

        registry.register(reader(), Properties::new());

        assert!(!tracker.is_open());
        assert_eq!(tracker.tracked(), 0);
        assert!(recording.calls.lock().is_empty());
    }

    #[test]
    fn test_add_cancelled_by_close_is_removed() {
        struct CloseWhileAdding {
            registry: Arc<SourceRegistry>,
            tracker: Mutex<Option<Arc<ServiceTracker>>>,
            calls: Mutex<Vec<Call>>,
        }

        impl TrackerCustomizer for CloseWhileAdding {
            fn on_added(&self, reference: &ServiceReference) -> Option<Arc<dyn LogReader>> {
                self.calls.lock().push(Call::Added(reference.id()));
                let tracker = self.tracker.lock().take();
                if let Some(tracker) = tracker {
                    tracker.close();
                }
                self.registry.resolve(reference)
            }

            fn on_modified(&self, reference: &ServiceReference, _service: &Arc<dyn LogReader>) {
                self.calls.lock().push(Call::Modified(reference.id()));
            }

            fn on_removed(&self, reference: &ServiceReference, _service: Arc<dyn LogReader>) {
                self.calls.lock().push(Call::Removed(reference.id()));
            }
        }

        let registry = Arc::new(SourceRegistry::new());
        let customizer = Arc::new(CloseWhileAdding {
            registry: registry.clone(),
            tracker: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        });
        let tracker = Arc::new(ServiceTracker::new(registry.clone(), customizer.clone()));
        *customizer.tracker.lock() = Some(tracker.clone());
        tracker.open();

        let a = registry.register(reader(), Properties::new());

        assert_eq!(tracker.tracked(), 0);
        assert_eq!(
            *customizer.calls.lock(),
            vec![Call::Added(a.id()), Call::Removed(a.id())]
        );
    }

    #[test]
    fn test_tracker_can_be_reopened() {
        let (registry, recording, tracker) = setup();
        tracker.open();
        tracker.close();
        tracker.open();

        let a = registry.register(reader(), Properties::new());
        assert_eq!(tracker.tracked(), 1);
        assert_eq!(*recording.calls.lock(), vec![Call::Added(a.id())]);
    }

    #[test]
    fn test_modify_during_unregister_does_not_retrack() {
        struct ModifyOnUnregistering {
            registry: Arc<SourceRegistry>,
        }

        impl ServiceListener for ModifyOnUnregistering {
            fn service_changed(&self, event: ServiceEvent) {
                if let ServiceEvent::Unregistering(reference) = event {
                    self.registry.set_properties(&reference, Properties::new());
                }
            }
        }

        let (registry, recording, tracker) = setup();
        tracker.open();
        registry.add_service_listener(Arc::new(ModifyOnUnregistering {
            registry: registry.clone(),
        }));

        let a = registry.register(reader(), Properties::new());
        registry.unregister(&a);

        assert_eq!(tracker.tracked(), 0);
        assert_eq!(
            *recording.calls.lock(),
            vec![Call::Added(a.id()), Call::Removed(a.id())]
        );
    }

    #[test]
    fn test_unresolvable_reference_is_not_tracked() {
        let (registry, recording, tracker) = setup();
        tracker.open();

        let a = registry.register(reader(), Properties::new());
        registry.unregister(&a);
        // stale notification for a reference that no longer resolves
        tracker.inner.service_changed(ServiceEvent::Registered(a));

        assert_eq!(tracker.tracked(), 0);
        assert_eq!(
            *recording.calls.lock(),
            vec![Call::Added(a.id()), Call::Removed(a.id()), Call::Added(a.id())]
        );
    }
}
