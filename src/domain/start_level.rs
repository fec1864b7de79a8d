use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// Read-only view of the framework start level.
pub trait FrameworkStartLevel: Send + Sync {
    /// Current value; every call observes the latest published level.
    fn start_level(&self) -> i32;
}

/// Shared start-level counter owned by the host framework.
///
/// Clones share the same counter. The bridge only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct StartLevel {
    level: Arc<AtomicI32>,
}

impl StartLevel {
    pub fn new(initial: i32) -> Self {
        Self {
            level: Arc::new(AtomicI32::new(initial)),
        }
    }

    pub fn get(&self) -> i32 {
        self.level.load(Ordering::Acquire)
    }

    pub fn set(&self, level: i32) {
        self.level.store(level, Ordering::Release);
    }
}

impl FrameworkStartLevel for StartLevel {
    fn start_level(&self) -> i32 {
        self.get()
    }
}
