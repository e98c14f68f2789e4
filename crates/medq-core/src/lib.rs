pub mod config;
pub mod logging;

pub mod archive;
pub mod control;
pub mod error;
pub mod job;
pub mod paths;
pub mod progress;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod storage;
pub mod transport;

pub use config::MedqConfig;
pub use error::EngineError;
pub use job::{CancelOutcome, JobDescriptor, JobState, MediaType, SubmitOutcome};
pub use progress::{Event, EventReceiver, ProgressEvent};
pub use scheduler::{Engine, RebuildReport};
