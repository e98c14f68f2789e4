//! Transport that reads media files from a local directory.
//!
//! `media_id` names a file directly under the source directory. A missing
//! file is reported as not-found; other I/O errors are transient.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::{MediaInfo, MediaStream, Transport};
use crate::job::JobDescriptor;
use crate::paths::sanitize_component;
use crate::retry::TransferError;

/// Session handle for `LocalTransport`: just an account label for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSession {
    pub account: String,
}

impl LocalSession {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalTransport {
    source_dir: PathBuf,
}

impl LocalTransport {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

pub struct LocalStream {
    file: File,
    total: u64,
    info: MediaInfo,
}

fn map_io(media_id: &str, e: io::Error) -> TransferError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            TransferError::not_found(format!("{media_id}: {e}"))
        }
        _ => TransferError::transient(format!("{media_id}: {e}")),
    }
}

impl Transport for LocalTransport {
    type Session = LocalSession;
    type Stream = LocalStream;

    fn open(&self, session: &LocalSession, job: &JobDescriptor) -> Result<LocalStream, TransferError> {
        let name = sanitize_component(&job.media_id);
        if name.is_empty() || name != job.media_id {
            return Err(TransferError::not_found(format!(
                "{}: not a plain file name",
                job.media_id
            )));
        }
        let path = self.source_dir.join(&name);
        tracing::debug!(account = %session.account, path = %path.display(), "opening local media");
        let file = File::open(&path).map_err(|e| map_io(&job.media_id, e))?;
        let total = file
            .metadata()
            .map_err(|e| map_io(&job.media_id, e))?
            .len();
        let display_name = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Ok(LocalStream {
            file,
            total,
            info: MediaInfo {
                file_name: name,
                display_name,
            },
        })
    }
}

impl MediaStream for LocalStream {
    fn total_len(&self) -> u64 {
        self.total
    }

    fn info(&self) -> MediaInfo {
        self.info.clone()
    }

    fn read_chunk(&mut self, size: usize) -> Result<Option<Vec<u8>>, TransferError> {
        let mut buf = vec![0u8; size.max(1)];
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransferError::transient(e.to_string())),
            }
        }
    }
}
