//! Failed-job archive: original descriptors of jobs that exhausted their
//! attempts (or failed permanently), kept until the user retries them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::job::JobDescriptor;

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, (u64, JobDescriptor)>,
    next_seq: u64,
}

#[derive(Default)]
pub struct FailedArchive {
    inner: Mutex<Inner>,
}

impl FailedArchive {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store the descriptor, replacing an older archive entry for the same id.
    pub fn insert(&self, job: JobDescriptor) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(job.media_id.clone(), (seq, job));
    }

    pub fn take(&self, media_id: &str) -> Option<JobDescriptor> {
        self.lock().jobs.remove(media_id).map(|(_, job)| job)
    }

    /// Atomically empty the archive, returning descriptors in failure order.
    pub fn drain(&self) -> Vec<JobDescriptor> {
        let mut entries: Vec<(u64, JobDescriptor)> =
            self.lock().jobs.drain().map(|(_, v)| v).collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, job)| job).collect()
    }

    pub fn get(&self, media_id: &str) -> Option<JobDescriptor> {
        self.lock().jobs.get(media_id).map(|(_, job)| job.clone())
    }

    pub fn contains(&self, media_id: &str) -> bool {
        self.lock().jobs.contains_key(media_id)
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }
}
