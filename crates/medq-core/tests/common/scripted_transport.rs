//! Transport whose behaviour per media id is scripted by the test: open
//! failures, chunk sizes, mid-stream failures, and gates that hold a
//! transfer at a given point until the test releases it.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use medq_core::job::JobDescriptor;
use medq_core::retry::TransferError;
use medq_core::transport::{MediaInfo, MediaStream, Transport};

/// Length served when an id has no script left.
pub const DEFAULT_LEN: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    NotFound,
    AuthExpired,
}

impl Failure {
    fn to_error(self, media_id: &str) -> TransferError {
        match self {
            Failure::Transient => TransferError::transient(format!("{media_id}: connection reset")),
            Failure::NotFound => TransferError::not_found(format!("{media_id}: unavailable")),
            Failure::AuthExpired => TransferError::AuthExpired,
        }
    }
}

pub enum Step {
    Bytes(usize),
    /// Block the reading worker until the paired sender fires (or is dropped).
    Gate(Receiver<()>),
    Fail(Failure),
}

/// What one `open` call does.
pub enum Attempt {
    OpenFails(Failure),
    Stream { total: u64, steps: Vec<Step> },
}

/// A gate step plus the handle that releases it.
pub fn gate() -> (Step, Sender<()>) {
    let (tx, rx) = mpsc::channel();
    (Step::Gate(rx), tx)
}

#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Attempt>>>,
    opens: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, media_id: &str, attempt: Attempt) {
        self.scripts
            .lock()
            .unwrap()
            .entry(media_id.to_string())
            .or_default()
            .push_back(attempt);
    }

    /// `(session, media_id)` for every `open` so far.
    pub fn opens(&self) -> Vec<(String, String)> {
        self.opens.lock().unwrap().clone()
    }

    pub fn opens_for(&self, media_id: &str) -> usize {
        self.opens
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, id)| id == media_id)
            .count()
    }
}

pub struct ScriptedStream {
    total: u64,
    info: MediaInfo,
    steps: VecDeque<Step>,
    media_id: String,
}

impl MediaStream for ScriptedStream {
    fn total_len(&self) -> u64 {
        self.total
    }

    fn info(&self) -> MediaInfo {
        self.info.clone()
    }

    fn read_chunk(&mut self, _size: usize) -> Result<Option<Vec<u8>>, TransferError> {
        loop {
            match self.steps.pop_front() {
                None => return Ok(None),
                Some(Step::Bytes(n)) => return Ok(Some(vec![0xAB; n])),
                Some(Step::Gate(rx)) => {
                    let _ = rx.recv();
                }
                Some(Step::Fail(f)) => return Err(f.to_error(&self.media_id)),
            }
        }
    }
}

impl Transport for ScriptedTransport {
    type Session = String;
    type Stream = ScriptedStream;

    fn open(&self, session: &String, job: &JobDescriptor) -> Result<ScriptedStream, TransferError> {
        self.opens
            .lock()
            .unwrap()
            .push((session.clone(), job.media_id.clone()));
        let attempt = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&job.media_id)
            .and_then(|q| q.pop_front());
        let (total, steps) = match attempt {
            Some(Attempt::OpenFails(f)) => return Err(f.to_error(&job.media_id)),
            Some(Attempt::Stream { total, steps }) => (total, steps),
            None => (DEFAULT_LEN, vec![Step::Bytes(60), Step::Bytes(40)]),
        };
        Ok(ScriptedStream {
            total,
            info: MediaInfo {
                file_name: format!("{}.bin", job.media_id),
                display_name: job.media_id.to_uppercase(),
            },
            steps: steps.into(),
            media_id: job.media_id.clone(),
        })
    }
}
