//! One download worker: a thread bound to a single leased session that
//! pulls jobs until the queue closes or the pool asks it to stop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::job::{JobDescriptor, JobState};
use crate::paths;
use crate::progress::{
    Event, ProgressEvent, STATUS_DOWNLOADING, STATUS_RETRYING, STATUS_WAITING,
};
use crate::retry::{run_with_retry, RetryPolicy, TransferError};
use crate::session::{SessionLease, SessionProvider};
use crate::storage::PartFile;
use crate::transport::{MediaStream, Transport};

use super::shared::Shared;

/// Granularity of the interruptible pauses (between jobs and between attempts).
const WAIT_TICK: Duration = Duration::from_millis(50);

/// What became of one dequeued job, from the worker's point of view.
enum Step {
    /// Job settled without touching the transport (pre-cancelled).
    Skipped,
    /// Job settled after at least one transfer attempt.
    Settled,
    /// The session was rejected; the job went back to the queue.
    SessionExpired,
}

struct Completed {
    path: PathBuf,
    display_name: String,
}

pub(crate) struct Worker<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    lease: SessionLease<P>,
    transport: Arc<T>,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    policy: RetryPolicy,
}

impl<P, T> Worker<P, T>
where
    P: SessionProvider,
    T: Transport<Session = P::Handle>,
{
    pub(crate) fn new(
        lease: SessionLease<P>,
        transport: Arc<T>,
        shared: Arc<Shared>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let policy = RetryPolicy::from_config(&shared.cfg);
        Self {
            lease,
            transport,
            shared,
            stop,
            policy,
        }
    }

    /// Thread body. Returns when the queue is closed and drained, the stop
    /// flag is raised, or the session expires.
    pub(crate) fn run(self) {
        let session_id = self.lease.id().to_string();
        tracing::info!(session_id = %session_id, "worker started");

        let mut expired = false;
        while let Some(job) = self.shared.queue.dequeue_or_stop(&self.stop) {
            match self.process(job) {
                Step::Skipped => {}
                Step::Settled => self.pace(),
                Step::SessionExpired => {
                    expired = true;
                    break;
                }
            }
        }

        let Worker { lease, shared, .. } = self;
        if expired {
            tracing::warn!(session_id = %session_id, "session expired; worker exiting");
            lease.invalidate();
            shared.reporter.send(Event::SessionInvalid {
                session_id: session_id.clone(),
            });
        } else {
            drop(lease);
        }
        tracing::info!(session_id = %session_id, "worker exited");
        shared.reporter.send(Event::WorkerExited { session_id });
    }

    fn process(&self, job: JobDescriptor) -> Step {
        let shared = &self.shared;
        let media_id = job.media_id.clone();

        if shared.cancels.is_requested(&media_id) {
            shared.mark_cancelled(&media_id);
            return Step::Skipped;
        }

        let Some(session) = self.lease.handle() else {
            return self.bounce(job);
        };

        shared
            .status
            .update(&media_id, JobState::Running { done: 0, total: 0 });
        shared
            .reporter
            .progress(ProgressEvent::status(&media_id, STATUS_DOWNLOADING));
        tracing::debug!(
            media_id = %media_id,
            session_id = %self.lease.id(),
            media_type = %job.media_type,
            "download started"
        );

        let max_attempts = self.policy.max_attempts;
        let result = run_with_retry(
            &self.policy,
            |attempt| {
                tracing::debug!(media_id = %media_id, attempt, "transfer attempt");
                self.transfer(session, &job)
            },
            |next, err, delay| {
                tracing::warn!(
                    media_id = %media_id,
                    attempt = next,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after: {}",
                    err
                );
                shared.reporter.progress(ProgressEvent::status(
                    &media_id,
                    format!("{STATUS_RETRYING} ({next}/{max_attempts})"),
                ));
            },
            |delay| self.wait(delay, Some(media_id.as_str())),
        );

        match result {
            Ok(done) => shared.mark_done(&media_id, done.path, done.display_name),
            Err(TransferError::Cancelled) => shared.mark_cancelled(&media_id),
            Err(TransferError::AuthExpired) => return self.bounce(job),
            Err(e) => shared.mark_failed(job, &e.to_string()),
        }
        Step::Settled
    }

    /// Hand a job this worker cannot serve back to the queue.
    fn bounce(&self, job: JobDescriptor) -> Step {
        let media_id = job.media_id.clone();
        let shared = &self.shared;
        shared.status.update(&media_id, JobState::Waiting);
        match shared.queue.enqueue(job.clone()) {
            Ok(()) => {
                shared
                    .reporter
                    .progress(ProgressEvent::status(&media_id, STATUS_WAITING));
                tracing::info!(media_id = %media_id, "job re-queued for another session");
            }
            Err(e) => shared.mark_failed(job, &e.to_string()),
        }
        Step::SessionExpired
    }

    /// One attempt: open, stream to a `.part` file, verify length, rename.
    fn transfer(
        &self,
        session: &T::Session,
        job: &JobDescriptor,
    ) -> Result<Completed, TransferError> {
        let shared = &self.shared;
        let media_id = job.media_id.as_str();
        if shared.cancels.is_requested(media_id) {
            return Err(TransferError::Cancelled);
        }

        let mut stream = self.transport.open(session, job)?;
        let total = stream.total_len();
        let info = stream.info();
        let final_path = paths::output_path(&shared.cfg.download_root, job, &info.file_name);
        let mut part = PartFile::create(&final_path).map_err(TransferError::Storage)?;

        shared
            .status
            .update(media_id, JobState::Running { done: 0, total });

        if let Err(e) = self.pump(media_id, &mut stream, &mut part, total) {
            part.discard();
            return Err(e);
        }

        part.finalize(&final_path).map_err(TransferError::Storage)?;
        Ok(Completed {
            path: final_path,
            display_name: info.display_name,
        })
    }

    fn pump(
        &self,
        media_id: &str,
        stream: &mut T::Stream,
        part: &mut PartFile,
        total: u64,
    ) -> Result<(), TransferError> {
        let shared = &self.shared;
        loop {
            if shared.cancels.is_requested(media_id) {
                tracing::debug!(media_id, written = part.written(), "cancelled between chunks");
                return Err(TransferError::Cancelled);
            }
            let Some(chunk) = stream.read_chunk(shared.cfg.chunk_size)? else {
                break;
            };
            part.write_chunk(&chunk).map_err(TransferError::Storage)?;
            let done = part.written();
            shared
                .status
                .update(media_id, JobState::Running { done, total });
            shared
                .reporter
                .progress(ProgressEvent::chunk(media_id, done, total));
        }

        let received = part.written();
        if received.saturating_add(shared.cfg.dl_end_padding_bytes) < total {
            return Err(TransferError::PartialTransfer {
                expected: total,
                received,
            });
        }
        Ok(())
    }

    /// Wait `download_delay` before the next job, waking early on stop or close.
    fn pace(&self) {
        let _ = self.wait(self.shared.cfg.download_delay(), None);
    }

    /// Sleep up to `delay` in ticks. A raised stop flag or a closed queue
    /// ends the wait early with `Ok`; a cancellation of `media_id` ends it
    /// with `Cancelled`.
    fn wait(&self, delay: Duration, media_id: Option<&str>) -> Result<(), TransferError> {
        let deadline = Instant::now() + delay;
        loop {
            if media_id.is_some_and(|id| self.shared.cancels.is_requested(id)) {
                return Err(TransferError::Cancelled);
            }
            if self.stop.load(Ordering::SeqCst) || self.shared.queue.is_closed() {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(WAIT_TICK));
        }
    }
}
