//! In-memory session pool.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::SessionProvider;
use crate::job::SessionId;

enum Slot<H> {
    Idle(H),
    Leased,
}

/// Map of session id to handle. Ids iterate in sorted order so worker
/// spawning is deterministic.
pub struct SessionPool<H> {
    slots: Mutex<BTreeMap<SessionId, Slot<H>>>,
}

impl<H> Default for SessionPool<H> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<H> SessionPool<H> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, Slot<H>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add (or replace) a session. Replacing a leased session leaves the
    /// running worker untouched; the new handle becomes idle.
    pub fn insert(&self, id: impl Into<SessionId>, handle: H) {
        self.lock().insert(id.into(), Slot::Idle(handle));
    }

    /// Revoke a session. A leased handle is dropped when its worker returns it.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_leased(&self, id: &str) -> bool {
        matches!(self.lock().get(id), Some(Slot::Leased))
    }
}

impl<H: Send + 'static> SessionProvider for SessionPool<H> {
    type Handle = H;

    fn session_ids(&self) -> Vec<SessionId> {
        self.lock().keys().cloned().collect()
    }

    fn checkout(&self, id: &str) -> Option<H> {
        let mut slots = self.lock();
        let slot = slots.get_mut(id)?;
        match std::mem::replace(slot, Slot::Leased) {
            Slot::Idle(handle) => Some(handle),
            Slot::Leased => None,
        }
    }

    fn release(&self, id: &str, handle: H) {
        let mut slots = self.lock();
        if let Some(slot) = slots.get_mut(id) {
            if matches!(slot, Slot::Leased) {
                *slot = Slot::Idle(handle);
            }
        }
    }

    fn invalidate(&self, id: &str) {
        self.lock().remove(id);
    }
}
