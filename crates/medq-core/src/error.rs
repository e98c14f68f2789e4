//! Error types shared across the engine.

use crate::job::JobState;

/// Returned by `JobQueue::enqueue` after the queue was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("job queue is closed")]
pub struct QueueClosed;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// The id already has a live or sealed (`Done`/`Cancelled`) entry.
    #[error("job {media_id} is already tracked ({})", state.label())]
    AlreadyTracked { media_id: String, state: JobState },
}

/// Errors surfaced by the producer/control API and the worker pool.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is shutting down")]
    ShuttingDown,
    #[error("failed to spawn worker thread for session {session_id}")]
    Spawn {
        session_id: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<QueueClosed> for EngineError {
    fn from(_: QueueClosed) -> Self {
        EngineError::ShuttingDown
    }
}
