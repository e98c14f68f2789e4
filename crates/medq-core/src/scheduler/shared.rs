//! State shared by the engine and every worker. Each structure carries its
//! own lock; nothing here holds one across I/O.
//!
//! Moves between `Failed` and the archive also take the settle lock, so a
//! failed job is never seen without its archive entry.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::archive::FailedArchive;
use crate::config::MedqConfig;
use crate::control::CancelSet;
use crate::error::QueueClosed;
use crate::job::{JobDescriptor, JobState};
use crate::progress::{ProgressEvent, ProgressReporter, STATUS_WAITING};
use crate::queue::JobQueue;
use crate::status::StatusTable;

pub(crate) struct Shared {
    pub(crate) cfg: MedqConfig,
    pub(crate) queue: JobQueue,
    pub(crate) status: StatusTable,
    pub(crate) cancels: CancelSet,
    pub(crate) archive: FailedArchive,
    pub(crate) reporter: ProgressReporter,
    settle: Mutex<()>,
}

impl Shared {
    pub(crate) fn new(cfg: MedqConfig, reporter: ProgressReporter) -> Self {
        Self {
            cfg,
            queue: JobQueue::new(),
            status: StatusTable::new(),
            cancels: CancelSet::new(),
            archive: FailedArchive::new(),
            reporter,
            settle: Mutex::new(()),
        }
    }

    /// Serializes archive moves. Held by `mark_failed`, and by callers of
    /// [`Shared::requeue`] around their archive lookup.
    pub(crate) fn settle_lock(&self) -> MutexGuard<'_, ()> {
        self.settle.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn mark_cancelled(&self, media_id: &str) {
        self.cancels.take(media_id);
        self.status.update(media_id, JobState::Cancelled);
        self.reporter.progress(ProgressEvent::cancelled(media_id));
        tracing::info!(media_id, "download cancelled");
    }

    pub(crate) fn mark_done(&self, media_id: &str, path: PathBuf, display_name: String) {
        if self.cancels.take(media_id) {
            tracing::debug!(media_id, "cancellation arrived after the last chunk; ignored");
        }
        self.status.update(
            media_id,
            JobState::Done {
                path: path.clone(),
                display_name: display_name.clone(),
            },
        );
        self.reporter
            .progress(ProgressEvent::done(media_id, path.clone(), display_name));
        tracing::info!(media_id, path = %path.display(), "download complete");
    }

    /// Record an unrecoverable failure. A pending cancellation wins: the job
    /// ends `Cancelled` and is not archived.
    pub(crate) fn mark_failed(&self, job: JobDescriptor, reason: &str) {
        let media_id = job.media_id.clone();
        let _settle = self.settle_lock();
        if self.cancels.is_requested(&media_id) {
            self.mark_cancelled(&media_id);
            return;
        }
        self.status.update(
            &media_id,
            JobState::Failed {
                reason: reason.to_string(),
            },
        );
        self.archive.insert(job);
        self.reporter.progress(ProgressEvent::failed(&media_id, reason));
        tracing::warn!(media_id = %media_id, reason, "download failed; archived for retry");
    }

    /// Put an archived job back on the queue as `Waiting`, dropping any
    /// stale cancellation flag. The caller holds [`Shared::settle_lock`].
    ///
    /// Only a `Failed` (or forgotten) row is resumed; `Ok(false)` means the
    /// row is live or sealed and the archived descriptor was dropped. On a
    /// closed queue the job is archived again.
    pub(crate) fn requeue(&self, job: JobDescriptor) -> Result<bool, QueueClosed> {
        let media_id = job.media_id.clone();
        let resumable = match self.status.get(&media_id) {
            Some(JobState::Failed { .. }) => self.status.update(&media_id, JobState::Waiting),
            Some(_) => false,
            None => self.status.register(&media_id).is_ok(),
        };
        if !resumable {
            tracing::debug!(media_id = %media_id, "archived entry is stale; dropped");
            return Ok(false);
        }
        self.cancels.take(&media_id);
        if let Err(e) = self.queue.enqueue(job.clone()) {
            self.status.update(
                &media_id,
                JobState::Failed {
                    reason: e.to_string(),
                },
            );
            self.archive.insert(job);
            return Err(e);
        }
        self.reporter
            .progress(ProgressEvent::status(&media_id, STATUS_WAITING));
        Ok(true)
    }
}
