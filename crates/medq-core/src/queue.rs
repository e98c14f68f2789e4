//! Unbounded FIFO of job descriptors shared by producers and workers.
//!
//! `dequeue` parks the calling worker on a condvar until a job arrives or the
//! queue is closed. Closing is the only shutdown signal: once closed, blocked
//! workers drain what is left and then see `None`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::QueueClosed;
use crate::job::JobDescriptor;

#[derive(Default)]
struct Inner {
    items: VecDeque<JobDescriptor>,
    closed: bool,
}

#[derive(Default)]
pub struct JobQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push a job to the back. Never blocks; fails only once closed.
    pub fn enqueue(&self, job: JobDescriptor) -> Result<(), QueueClosed> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(QueueClosed);
        }
        inner.items.push_back(job);
        drop(inner);
        self.available.notify_one();
        Ok(())
    }

    /// Block until a job is available. `None` means closed and drained.
    pub fn dequeue(&self) -> Option<JobDescriptor> {
        let never = AtomicBool::new(false);
        self.dequeue_or_stop(&never)
    }

    /// Like `dequeue`, but also returns `None` once `stop` is raised and
    /// `wake_all` has been called. A raised stop flag wins over pending jobs.
    pub fn dequeue_or_stop(&self, stop: &AtomicBool) -> Option<JobDescriptor> {
        let mut inner = self.lock();
        loop {
            if stop.load(Ordering::Acquire) {
                return None;
            }
            if let Some(job) = inner.items.pop_front() {
                return Some(job);
            }
            if inner.closed {
                return None;
            }
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Non-blocking pop.
    pub fn try_dequeue(&self) -> Option<JobDescriptor> {
        self.lock().items.pop_front()
    }

    /// Wake every parked worker so it re-checks its stop flag.
    pub fn wake_all(&self) {
        let _guard = self.lock();
        self.available.notify_all();
    }

    /// Close the queue: further enqueues fail, blocked dequeues return once drained.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        drop(inner);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Ids currently waiting in the queue, front first.
    pub fn pending_ids(&self) -> Vec<String> {
        self.lock()
            .items
            .iter()
            .map(|j| j.media_id.clone())
            .collect()
    }
}
