//! Job descriptors and per-job lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of an authenticated session (one worker per session).
pub type SessionId = String;

/// Kind of media a job downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Track,
    Album,
    Artist,
    Playlist,
    PodcastEpisode,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Track => "track",
            MediaType::Album => "album",
            MediaType::Artist => "artist",
            MediaType::Playlist => "playlist",
            MediaType::PodcastEpisode => "podcast_episode",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(MediaType::Track),
            "album" => Ok(MediaType::Album),
            "artist" => Ok(MediaType::Artist),
            "playlist" => Ok(MediaType::Playlist),
            "podcast_episode" | "episode" => Ok(MediaType::PodcastEpisode),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// Playlist context carried by tracks queued from a playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMetadata {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    /// Playlist file this track is listed in, when playlist files are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m3u_filename: Option<String>,
}

/// One requested media download. Immutable once submitted; the worker that
/// dequeues it owns it until a terminal state is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub media_id: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_paths: Vec<String>,
    /// The first extra path is a root directory of its own instead of a
    /// segment below the download root.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extra_path_as_root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist: Option<PlaylistMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_override: Option<PathBuf>,
}

impl JobDescriptor {
    pub fn new(media_id: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            media_id: media_id.into(),
            media_type,
            session_affinity: None,
            extra_paths: Vec::new(),
            extra_path_as_root: false,
            playlist: None,
            destination_override: None,
        }
    }

    pub fn with_extra_path(mut self, segment: impl Into<String>) -> Self {
        self.extra_paths.push(segment.into());
        self
    }

    pub fn with_extra_path_as_root(mut self) -> Self {
        self.extra_path_as_root = true;
        self
    }

    pub fn with_playlist(mut self, playlist: PlaylistMetadata) -> Self {
        self.playlist = Some(playlist);
        self
    }

    pub fn with_destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination_override = Some(dir.into());
        self
    }

    pub fn with_session_affinity(mut self, session: impl Into<SessionId>) -> Self {
        self.session_affinity = Some(session.into());
        self
    }
}

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Running { done: u64, total: u64 },
    Done { path: PathBuf, display_name: String },
    Failed { reason: String },
    Cancelled,
}

impl JobState {
    /// `Done`, `Failed` and `Cancelled` admit no further worker transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Done { .. } | JobState::Failed { .. } | JobState::Cancelled
        )
    }

    /// States that `update` must never overwrite.
    pub fn is_sealed(&self) -> bool {
        matches!(self, JobState::Done { .. } | JobState::Cancelled)
    }

    /// Displayed progress in percent (0..=100). A running job whose length
    /// is not known yet reports 0.
    pub fn percent(&self) -> u8 {
        match self {
            JobState::Waiting | JobState::Failed { .. } | JobState::Cancelled => 0,
            JobState::Running { done, total } => percent(*done, *total),
            JobState::Done { .. } => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Running { .. } => "running",
            JobState::Done { .. } => "done",
            JobState::Failed { .. } => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

/// `floor(done / total * 100)`, clamped to 100. An unknown (zero) total
/// reports 0; only a `Done` outcome completes such a transfer.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let p = (done as u128 * 100) / total as u128;
    p.min(100) as u8
}

/// Result of `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// New lifecycle started; the descriptor was enqueued.
    Queued,
    /// The id is already waiting or running; nothing was enqueued.
    AlreadyQueued,
    /// The id had failed; its archived descriptor was re-enqueued.
    Requeued,
}

/// Result of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Requested,
    AlreadyRequested,
    /// Progress already at or past the completion threshold; ignored.
    TooLate,
    /// Job is in a terminal state.
    Finished,
    NotTracked,
}
