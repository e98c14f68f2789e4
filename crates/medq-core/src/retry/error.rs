//! Error returned by a single transfer attempt.

/// Why one attempt at downloading a job stopped.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Connection reset, timeout, DNS failure. Retried.
    #[error("transient transport error: {0}")]
    Transient(String),
    /// The session's credentials are no longer accepted.
    #[error("session expired")]
    AuthExpired,
    /// Media unavailable for this account or region. Not retried.
    #[error("media not found or forbidden: {0}")]
    NotFoundOrForbidden(String),
    /// Stream ended before the expected length (minus the end padding).
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Local disk write failed (disk full, permission denied). Not retried.
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
    /// The user cancelled the job between chunks.
    #[error("cancelled")]
    Cancelled,
}

impl TransferError {
    pub fn transient(msg: impl Into<String>) -> Self {
        TransferError::Transient(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        TransferError::NotFoundOrForbidden(msg.into())
    }
}
