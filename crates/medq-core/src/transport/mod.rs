//! The transfer protocol a worker drives with its leased session.
//!
//! Implementations own the network side: opening a stream for a job and
//! handing back fixed-size chunks. `LocalTransport` serves files from a
//! directory and is used by the CLI harness and tests.

mod local;

pub use local::{LocalSession, LocalTransport};

use crate::job::JobDescriptor;
use crate::retry::TransferError;

/// Naming information for a stream, known once it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// File name for the output, including extension.
    pub file_name: String,
    /// Human-readable name reported on completion.
    pub display_name: String,
}

/// An open media stream.
pub trait MediaStream: Send {
    /// Announced length in bytes.
    fn total_len(&self) -> u64;

    fn info(&self) -> MediaInfo;

    /// Read up to `size` bytes. `Ok(None)` is end of stream.
    fn read_chunk(&mut self, size: usize) -> Result<Option<Vec<u8>>, TransferError>;
}

pub trait Transport: Send + Sync + 'static {
    /// Session handle type this transport authenticates with.
    type Session: Send + 'static;
    type Stream: MediaStream;

    fn open(&self, session: &Self::Session, job: &JobDescriptor) -> Result<Self::Stream, TransferError>;
}
