use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identities with a sync currently running.
///
/// `try_acquire` hands out at most one guard per identity; the slot is freed
/// when the guard drops. Identities compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, identity: &str) -> Option<InFlightGuard> {
        let key = identity.to_ascii_lowercase();
        if !lock(&self.active).insert(key.clone()) {
            log::debug!("Sync already in flight for {identity}");
            return None;
        }
        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    pub fn is_active(&self, identity: &str) -> bool {
        lock(&self.active).contains(&identity.to_ascii_lowercase())
    }
}

/// Holds an identity's in-flight slot until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
    }
}

// The set stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(active: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    active.lock().unwrap_or_else(|e| e.into_inner())
}
