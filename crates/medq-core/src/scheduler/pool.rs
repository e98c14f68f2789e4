//! Worker pool: keeps exactly one worker per usable session, capped at
//! `max_threads`, and reconciles that set against the session provider.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::error::EngineError;
use crate::job::SessionId;
use crate::progress::Event;
use crate::session::{SessionLease, SessionProvider};
use crate::transport::Transport;

use super::shared::Shared;
use super::worker::Worker;

struct WorkerRecord {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// What one `rebuild` changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub started: Vec<SessionId>,
    pub stopped: Vec<SessionId>,
    /// Live workers after the rebuild, including ones still winding down.
    pub workers: usize,
    /// The provider offered no sessions at all.
    pub no_sessions: bool,
}

pub(crate) struct WorkerPool<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    provider: Arc<P>,
    transport: Arc<T>,
    shared: Arc<Shared>,
    records: Mutex<BTreeMap<SessionId, WorkerRecord>>,
}

impl<P, T> WorkerPool<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    pub(crate) fn new(provider: Arc<P>, transport: Arc<T>, shared: Arc<Shared>) -> Self {
        Self {
            provider,
            transport,
            shared,
            records: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, WorkerRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reconcile workers with the provider's sessions: reap finished
    /// threads, stop workers whose session is gone, then start workers for
    /// unbound sessions until `max_threads` are alive.
    pub(crate) fn rebuild(&self) -> Result<RebuildReport, EngineError> {
        if self.shared.queue.is_closed() {
            return Err(EngineError::ShuttingDown);
        }
        let mut records = self.lock();
        self.reap(&mut records);

        let mut report = RebuildReport::default();
        let session_ids = self.provider.session_ids();

        for (session_id, record) in records.iter() {
            if !session_ids.contains(session_id) && !record.stop.swap(true, Ordering::AcqRel) {
                tracing::info!(session_id = %session_id, "session revoked; stopping worker");
                report.stopped.push(session_id.clone());
            }
        }
        if !report.stopped.is_empty() {
            self.shared.queue.wake_all();
        }

        if session_ids.is_empty() {
            tracing::warn!("no session available; jobs stay queued");
            self.shared.reporter.send(Event::NoSessionAvailable);
            report.no_sessions = true;
            report.workers = records.len();
            return Ok(report);
        }

        let max_threads = self.shared.cfg.max_threads;
        for session_id in session_ids {
            if records.len() >= max_threads {
                break;
            }
            if records.contains_key(&session_id) {
                continue;
            }
            let Some(lease) = SessionLease::checkout(&self.provider, &session_id) else {
                tracing::debug!(session_id = %session_id, "session unavailable for checkout");
                continue;
            };
            let record = self.spawn(lease)?;
            tracing::info!(session_id = %session_id, "worker spawned");
            self.shared.reporter.send(Event::WorkerStarted {
                session_id: session_id.clone(),
            });
            records.insert(session_id.clone(), record);
            report.started.push(session_id);
        }

        report.workers = records.len();
        tracing::debug!(
            workers = report.workers,
            started = report.started.len(),
            stopped = report.stopped.len(),
            "worker pool rebuilt"
        );
        Ok(report)
    }

    fn spawn(&self, lease: SessionLease<P>) -> Result<WorkerRecord, EngineError> {
        let session_id = lease.id().to_string();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = Worker::new(
            lease,
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            Arc::clone(&stop),
        );
        let handle = thread::Builder::new()
            .name(format!("session-dl-{session_id}"))
            .spawn(move || worker.run())
            .map_err(|source| EngineError::Spawn { session_id, source })?;
        Ok(WorkerRecord { stop, handle })
    }

    /// Join and drop records whose thread has ended.
    fn reap(&self, records: &mut BTreeMap<SessionId, WorkerRecord>) {
        let finished: Vec<SessionId> = records
            .iter()
            .filter(|(_, r)| r.handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        for session_id in finished {
            let Some(record) = records.remove(&session_id) else {
                continue;
            };
            if record.handle.join().is_err() {
                tracing::error!(session_id = %session_id, "worker panicked");
                self.shared.reporter.send(Event::WorkerExited { session_id });
            }
        }
    }

    /// Ask the worker bound to `session_id` to exit after its current job.
    pub(crate) fn revoke(&self, session_id: &str) -> bool {
        let records = self.lock();
        let Some(record) = records.get(session_id) else {
            return false;
        };
        let first = !record.stop.swap(true, Ordering::AcqRel);
        drop(records);
        if first {
            self.shared.queue.wake_all();
        }
        first
    }

    pub(crate) fn worker_count(&self) -> usize {
        let mut records = self.lock();
        self.reap(&mut records);
        records.len()
    }

    pub(crate) fn session_ids(&self) -> Vec<SessionId> {
        let mut records = self.lock();
        self.reap(&mut records);
        records.keys().cloned().collect()
    }

    /// Close the queue and wait for every worker. Workers drain what is
    /// already queued before exiting.
    pub(crate) fn shutdown(&self) {
        self.shared.queue.close();
        let records = std::mem::take(&mut *self.lock());
        for (session_id, record) in records {
            if record.handle.join().is_err() {
                tracing::error!(session_id = %session_id, "worker panicked during shutdown");
            }
        }
        tracing::info!("worker pool shut down");
    }
}
