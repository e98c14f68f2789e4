//! Cooperative cancellation: a shared set of media ids the user asked to stop.
//!
//! Workers consult the set when they dequeue a job and again between chunks;
//! nothing is interrupted mid-write. The id is taken out of the set by the
//! worker that acts on it.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct CancelSet {
    ids: Mutex<HashSet<String>>,
}

impl CancelSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flag `media_id`. Returns false if it was already flagged.
    pub fn request(&self, media_id: &str) -> bool {
        self.lock().insert(media_id.to_string())
    }

    pub fn is_requested(&self, media_id: &str) -> bool {
        self.lock().contains(media_id)
    }

    /// Remove the flag, returning whether it was set.
    pub fn take(&self, media_id: &str) -> bool {
        self.lock().remove(media_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
