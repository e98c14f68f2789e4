//! Producer and control surface over the queue, tables and worker pool.

use std::sync::Arc;

use crate::config::MedqConfig;
use crate::error::{EngineError, StatusError};
use crate::job::{CancelOutcome, JobDescriptor, JobState, SessionId, SubmitOutcome};
use crate::progress::{EventReceiver, ProgressEvent, ProgressReporter, STATUS_WAITING};
use crate::session::SessionProvider;
use crate::transport::Transport;

use super::pool::{RebuildReport, WorkerPool};
use super::shared::Shared;

/// The download engine. Cheap to call from any thread; every method takes
/// `&self`. Progress flows out through the `EventReceiver` returned by
/// [`Engine::new`].
///
/// No worker runs until [`Engine::rebuild_workers`] is called.
pub struct Engine<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    shared: Arc<Shared>,
    pool: WorkerPool<P, T>,
}

impl<P, T> Engine<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    pub fn new(cfg: MedqConfig, provider: Arc<P>, transport: Arc<T>) -> (Self, EventReceiver) {
        let (reporter, events) = ProgressReporter::channel();
        let shared = Arc::new(Shared::new(cfg, reporter));
        let pool = WorkerPool::new(provider, transport, Arc::clone(&shared));
        (Self { shared, pool }, events)
    }

    pub fn config(&self) -> &MedqConfig {
        &self.shared.cfg
    }

    /// Enqueue a job.
    ///
    /// - an archived failure with this id is re-queued from its archived
    ///   descriptor (`Requeued`);
    /// - a live id is not duplicated, but a pending cancellation for it is
    ///   withdrawn (`AlreadyQueued`);
    /// - a `Done` or `Cancelled` id is left alone (`AlreadyQueued`) until
    ///   [`Engine::clear_completed`] forgets it;
    /// - an untracked id starts a fresh lifecycle (`Queued`).
    pub fn submit(&self, job: JobDescriptor) -> Result<SubmitOutcome, EngineError> {
        let shared = &self.shared;
        let media_id = job.media_id.clone();
        let _settle = shared.settle_lock();
        if shared.queue.is_closed() {
            return Err(EngineError::ShuttingDown);
        }

        if let Some(archived) = shared.archive.take(&media_id) {
            if shared.requeue(archived)? {
                tracing::info!(media_id = %media_id, "failed job re-submitted");
                return Ok(SubmitOutcome::Requeued);
            }
        }

        match shared.status.register(&media_id) {
            Ok(()) => {
                shared.cancels.take(&media_id);
                if let Err(e) = shared.queue.enqueue(job) {
                    shared.status.update(&media_id, JobState::Cancelled);
                    return Err(e.into());
                }
                shared
                    .reporter
                    .progress(ProgressEvent::status(&media_id, STATUS_WAITING));
                tracing::debug!(media_id = %media_id, "job queued");
                Ok(SubmitOutcome::Queued)
            }
            Err(StatusError::AlreadyTracked { state, .. }) => {
                if shared.cancels.take(&media_id) {
                    tracing::info!(media_id = %media_id, "pending cancellation withdrawn");
                }
                tracing::debug!(media_id = %media_id, state = state.label(), "already tracked");
                Ok(SubmitOutcome::AlreadyQueued)
            }
        }
    }

    /// Request cancellation of a tracked, unfinished job. Jobs at or above
    /// `cancel_threshold_percent` are left to finish.
    pub fn cancel(&self, media_id: &str) -> CancelOutcome {
        let shared = &self.shared;
        let Some(state) = shared.status.get(media_id) else {
            return CancelOutcome::NotTracked;
        };
        if state.is_terminal() {
            return CancelOutcome::Finished;
        }
        let pct = state.percent();
        if pct >= shared.cfg.cancel_threshold_percent {
            tracing::debug!(media_id, percent = pct, "too far along to cancel");
            return CancelOutcome::TooLate;
        }
        if shared.cancels.request(media_id) {
            tracing::info!(media_id, percent = pct, "cancellation requested");
            CancelOutcome::Requested
        } else {
            CancelOutcome::AlreadyRequested
        }
    }

    /// `cancel` every unfinished job. Returns how many new requests were made.
    pub fn cancel_all(&self) -> usize {
        self.shared
            .status
            .non_terminal_ids()
            .iter()
            .filter(|id| self.cancel(id) == CancelOutcome::Requested)
            .count()
    }

    /// Re-queue one archived failure. `Ok(false)` if it is not archived.
    pub fn retry(&self, media_id: &str) -> Result<bool, EngineError> {
        let _settle = self.shared.settle_lock();
        if self.shared.queue.is_closed() {
            return Err(EngineError::ShuttingDown);
        }
        let Some(job) = self.shared.archive.take(media_id) else {
            return Ok(false);
        };
        let requeued = self.shared.requeue(job)?;
        if requeued {
            tracing::info!(media_id, "retrying failed job");
        }
        Ok(requeued)
    }

    /// Re-queue every archived failure in failure order. A second call with
    /// nothing newly failed re-queues nothing.
    pub fn retry_all(&self) -> Result<usize, EngineError> {
        let _settle = self.shared.settle_lock();
        if self.shared.queue.is_closed() {
            return Err(EngineError::ShuttingDown);
        }
        let mut jobs = self.shared.archive.drain().into_iter();
        let mut count = 0;
        while let Some(job) = jobs.next() {
            match self.shared.requeue(job) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => {
                    for rest in jobs {
                        self.shared.archive.insert(rest);
                    }
                    return Err(e.into());
                }
            }
        }
        if count > 0 {
            tracing::info!(count, "retrying failed jobs");
        }
        Ok(count)
    }

    /// Forget `Done` and `Cancelled` entries; returns their ids.
    /// Failed jobs stay visible and retryable.
    pub fn clear_completed(&self) -> Vec<String> {
        let cleared = self.shared.status.clear_completed();
        if !cleared.is_empty() {
            tracing::debug!(count = cleared.len(), "cleared finished jobs");
        }
        cleared
    }

    /// Reconcile workers with the current sessions. Call after the session
    /// provider changes.
    pub fn rebuild_workers(&self) -> Result<RebuildReport, EngineError> {
        self.pool.rebuild()
    }

    /// Stop the worker bound to `session_id` once its current job settles.
    pub fn revoke_session(&self, session_id: &str) -> bool {
        self.pool.revoke(session_id)
    }

    pub fn status(&self, media_id: &str) -> Option<JobState> {
        self.shared.status.get(media_id)
    }

    /// All tracked jobs in registration order.
    pub fn snapshot(&self) -> Vec<(String, JobState)> {
        self.shared.status.snapshot()
    }

    /// True when no tracked job is waiting or running.
    pub fn is_idle(&self) -> bool {
        self.shared.status.all_terminal()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn worker_sessions(&self) -> Vec<SessionId> {
        self.pool.session_ids()
    }

    pub fn queued_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Archived descriptor for a failed job.
    pub fn failed_job(&self, media_id: &str) -> Option<JobDescriptor> {
        self.shared.archive.get(media_id)
    }

    pub fn failed_len(&self) -> usize {
        self.shared.archive.len()
    }

    pub fn is_cancel_pending(&self, media_id: &str) -> bool {
        self.shared.cancels.is_requested(media_id)
    }

    pub fn pending_cancels(&self) -> usize {
        self.shared.cancels.len()
    }

    /// Close the queue and join every worker. Queued jobs are still served
    /// by live workers before they exit.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl<P, T> Drop for Engine<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    fn drop(&mut self) {
        // Unblock workers parked on the queue; they finish and release their sessions.
        self.shared.queue.close();
    }
}
