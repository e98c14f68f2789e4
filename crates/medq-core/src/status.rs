//! Job status table: one lifecycle entry per media id.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StatusError;
use crate::job::JobState;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    state: JobState,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// Thread-safe map of media id to lifecycle state.
///
/// `Done` and `Cancelled` are sealed: neither `update` nor `register`
/// replaces them; only `remove`/`clear_completed` drop them.
#[derive(Default)]
pub struct StatusTable {
    inner: RwLock<Inner>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Start tracking `media_id` as `Waiting`. A `Failed` entry is replaced;
    /// a live or sealed one is reported as `AlreadyTracked`.
    pub fn register(&self, media_id: &str) -> Result<(), StatusError> {
        let mut inner = self.write();
        if let Some(existing) = inner.entries.get(media_id) {
            if !matches!(existing.state, JobState::Failed { .. }) {
                return Err(StatusError::AlreadyTracked {
                    media_id: media_id.to_string(),
                    state: existing.state.clone(),
                });
            }
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            media_id.to_string(),
            Entry {
                seq,
                state: JobState::Waiting,
            },
        );
        Ok(())
    }

    /// Set the state of a tracked id. Returns false when the id is unknown or
    /// its current state is sealed.
    pub fn update(&self, media_id: &str, state: JobState) -> bool {
        let mut inner = self.write();
        match inner.entries.get_mut(media_id) {
            Some(entry) if !entry.state.is_sealed() => {
                entry.state = state;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, media_id: &str) -> Option<JobState> {
        self.read().entries.get(media_id).map(|e| e.state.clone())
    }

    pub fn contains(&self, media_id: &str) -> bool {
        self.read().entries.contains_key(media_id)
    }

    pub fn percent(&self, media_id: &str) -> Option<u8> {
        self.read().entries.get(media_id).map(|e| e.state.percent())
    }

    /// Remove a terminal entry. Live entries are kept and `false` is returned.
    pub fn remove(&self, media_id: &str) -> bool {
        let mut inner = self.write();
        match inner.entries.get(media_id) {
            Some(entry) if entry.state.is_terminal() => {
                inner.entries.remove(media_id);
                true
            }
            _ => false,
        }
    }

    /// Drop every `Done`/`Cancelled` row; returns the removed ids in
    /// registration order. Failed rows stay so they can still be retried.
    pub fn clear_completed(&self) -> Vec<String> {
        let mut inner = self.write();
        let mut removed: Vec<(u64, String)> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.state.is_sealed())
            .map(|(id, e)| (e.seq, id.clone()))
            .collect();
        removed.sort();
        for (_, id) in &removed {
            inner.entries.remove(id);
        }
        removed.into_iter().map(|(_, id)| id).collect()
    }

    /// Ids whose state is not terminal, in registration order.
    pub fn non_terminal_ids(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|(_, s)| !s.is_terminal())
            .map(|(id, _)| id)
            .collect()
    }

    /// All rows in registration order.
    pub fn snapshot(&self) -> Vec<(String, JobState)> {
        let inner = self.read();
        let mut rows: Vec<(u64, String, JobState)> = inner
            .entries
            .iter()
            .map(|(id, e)| (e.seq, id.clone(), e.state.clone()))
            .collect();
        rows.sort_by_key(|(seq, _, _)| *seq);
        rows.into_iter().map(|(_, id, s)| (id, s)).collect()
    }

    /// True when every tracked job is terminal (vacuously true when empty).
    pub fn all_terminal(&self) -> bool {
        self.read().entries.values().all(|e| e.state.is_terminal())
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn done() -> JobState {
        JobState::Done {
            path: PathBuf::from("/music/a.mp3"),
            display_name: "a".into(),
        }
    }

    #[test]
    fn register_rejects_live_duplicate() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        let err = t.register("a").unwrap_err();
        assert!(matches!(err, StatusError::AlreadyTracked { ref state, .. } if *state == JobState::Waiting));
        t.update("a", JobState::Running { done: 5, total: 10 });
        assert!(t.register("a").is_err());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn register_keeps_sealed_entries() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        t.update("a", JobState::Cancelled);
        assert!(matches!(
            t.register("a"),
            Err(StatusError::AlreadyTracked { state: JobState::Cancelled, .. })
        ));
        assert_eq!(t.get("a"), Some(JobState::Cancelled));

        t.register("b").unwrap();
        t.update("b", done());
        assert!(t.register("b").is_err());
        assert_eq!(t.get("b"), Some(done()));

        assert!(t.remove("b"));
        t.register("b").unwrap();
        assert_eq!(t.get("b"), Some(JobState::Waiting));
    }

    #[test]
    fn register_replaces_failed_entry() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        t.update(
            "a",
            JobState::Failed {
                reason: "gone".into(),
            },
        );
        t.register("a").unwrap();
        assert_eq!(t.get("a"), Some(JobState::Waiting));
    }

    #[test]
    fn sealed_states_are_not_overwritten() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        assert!(t.update("a", done()));
        assert!(!t.update("a", JobState::Waiting));
        assert_eq!(t.get("a"), Some(done()));

        t.register("b").unwrap();
        assert!(t.update("b", JobState::Cancelled));
        assert!(!t.update("b", JobState::Running { done: 1, total: 2 }));
    }

    #[test]
    fn failed_can_be_reset_to_waiting() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        t.update(
            "a",
            JobState::Failed {
                reason: "timeout".into(),
            },
        );
        assert!(t.update("a", JobState::Waiting));
    }

    #[test]
    fn update_unknown_is_noop() {
        let t = StatusTable::new();
        assert!(!t.update("missing", JobState::Waiting));
        assert!(t.is_empty());
    }

    #[test]
    fn remove_only_terminal() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        assert!(!t.remove("a"));
        t.update("a", done());
        assert!(t.remove("a"));
        assert!(!t.contains("a"));
    }

    #[test]
    fn clear_completed_skips_live_and_failed() {
        let t = StatusTable::new();
        for id in ["w", "r", "d", "f", "c"] {
            t.register(id).unwrap();
        }
        t.update("r", JobState::Running { done: 3, total: 10 });
        t.update("d", done());
        t.update(
            "f",
            JobState::Failed {
                reason: "x".into(),
            },
        );
        t.update("c", JobState::Cancelled);
        assert_eq!(t.clear_completed(), vec!["d", "c"]);
        let ids: Vec<String> = t.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["w", "r", "f"]);
        assert_eq!(t.non_terminal_ids(), vec!["w", "r"]);
    }

    #[test]
    fn percent_reflects_running_progress() {
        let t = StatusTable::new();
        t.register("a").unwrap();
        assert_eq!(t.percent("a"), Some(0));
        t.update("a", JobState::Running { done: 96, total: 100 });
        assert_eq!(t.percent("a"), Some(96));
        assert_eq!(t.percent("b"), None);
    }
}
