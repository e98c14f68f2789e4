//! Progress reporting from worker threads to a single observer.
//!
//! Every worker holds a clone of `ProgressReporter`; the observer owns the
//! one `EventReceiver`. The channel is unbounded so a slow observer never
//! stalls a transfer, and sends to a dropped receiver are ignored.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::job::{percent, SessionId};

pub const STATUS_WAITING: &str = "Waiting";
pub const STATUS_DOWNLOADING: &str = "Downloading";
pub const STATUS_RETRYING: &str = "Retrying";
pub const STATUS_DONE: &str = "Downloaded";
pub const STATUS_FAILED: &str = "Failed";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// How a job ended, attached to its last event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    /// Archived; the user can retry it.
    Failed,
    Cancelled,
}

/// One progress/status update for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub media_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// `(bytes_done, bytes_total)`; terminal failure/cancel events carry `(0, 100)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<(u64, u64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl ProgressEvent {
    pub fn status(media_id: &str, status: impl Into<String>) -> Self {
        Self {
            media_id: media_id.to_string(),
            status: Some(status.into()),
            progress: None,
            result_path: None,
            result_name: None,
            outcome: None,
        }
    }

    pub fn chunk(media_id: &str, done: u64, total: u64) -> Self {
        Self {
            progress: Some((done, total)),
            ..Self::status(media_id, STATUS_DOWNLOADING)
        }
    }

    pub fn done(media_id: &str, path: PathBuf, name: String) -> Self {
        Self {
            progress: Some((100, 100)),
            result_path: Some(path),
            result_name: Some(name),
            outcome: Some(Outcome::Done),
            ..Self::status(media_id, STATUS_DONE)
        }
    }

    pub fn failed(media_id: &str, reason: &str) -> Self {
        Self {
            progress: Some((0, 100)),
            outcome: Some(Outcome::Failed),
            ..Self::status(media_id, format!("{STATUS_FAILED}: {reason}"))
        }
    }

    pub fn cancelled(media_id: &str) -> Self {
        Self {
            progress: Some((0, 100)),
            outcome: Some(Outcome::Cancelled),
            ..Self::status(media_id, STATUS_CANCELLED)
        }
    }

    /// Displayed percent for this event, if it carries progress.
    pub fn percent(&self) -> Option<u8> {
        self.progress.map(|(done, total)| percent(done, total))
    }

    /// A percent of 100 or more counts as complete even without exact equality.
    pub fn is_complete(&self) -> bool {
        self.outcome == Some(Outcome::Done)
            || (self.outcome.is_none() && self.percent().is_some_and(|p| p >= 100))
    }
}

/// Everything the observer can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Progress(ProgressEvent),
    /// A rebuild found no session to bind workers to.
    NoSessionAvailable,
    WorkerStarted { session_id: SessionId },
    WorkerExited { session_id: SessionId },
    /// A worker found its session expired and gave it up.
    SessionInvalid { session_id: SessionId },
}

pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Sending half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<Event>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, event: ProgressEvent) {
        self.send(Event::Progress(event));
    }
}

/// One row of the observer-side view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRow {
    pub status: String,
    pub percent: u8,
    pub result_path: Option<PathBuf>,
    pub result_name: Option<String>,
    pub outcome: Option<Outcome>,
}

/// Observer-side table fed by events. Rows exist only for ids the observer
/// tracked; events for unknown ids (late, or after a clear) are ignored.
#[derive(Debug, Default)]
pub struct ProgressView {
    rows: HashMap<String, ViewRow>,
}

impl ProgressView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, media_id: impl Into<String>) {
        self.rows.entry(media_id.into()).or_insert_with(|| ViewRow {
            status: STATUS_WAITING.to_string(),
            ..ViewRow::default()
        });
    }

    pub fn forget(&mut self, media_id: &str) -> bool {
        self.rows.remove(media_id).is_some()
    }

    /// Apply one event. Returns the updated row, or `None` when the id is unknown.
    pub fn apply(&mut self, event: &ProgressEvent) -> Option<&ViewRow> {
        let Some(row) = self.rows.get_mut(&event.media_id) else {
            tracing::debug!(media_id = %event.media_id, "progress for untracked job ignored");
            return None;
        };
        if let Some(status) = &event.status {
            row.status = status.clone();
        }
        if let Some(p) = event.percent() {
            row.percent = p;
        }
        if event.is_complete() {
            row.percent = 100;
            row.result_path = event.result_path.clone().or(row.result_path.take());
            row.result_name = event.result_name.clone().or(row.result_name.take());
        }
        if event.outcome.is_some() {
            row.outcome = event.outcome;
        } else if !event.is_complete() {
            // A fresh status after a terminal one means the job was re-queued.
            row.outcome = None;
        }
        Some(row)
    }

    pub fn get(&self, media_id: &str) -> Option<&ViewRow> {
        self.rows.get(media_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every tracked row has an outcome.
    pub fn all_finished(&self) -> bool {
        self.rows.values().all(|r| r.outcome.is_some())
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.rows
            .values()
            .filter(|r| r.outcome == Some(outcome))
            .count()
    }
}
