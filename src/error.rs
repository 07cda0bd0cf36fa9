use thiserror::Error;

/// Transport-level failure. Ends the current stream only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("ingest service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StreamError::Decode(e.to_string())
        } else {
            StreamError::Transport(e.to_string())
        }
    }
}

/// One malformed frame. The frame is skipped; the stream continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameParseError {
    #[error("frame payload is not valid JSON: {0}")]
    Json(String),

    #[error("frame payload is not a JSON object")]
    NotAnObject,

    #[error("segment frame is missing `{0}`")]
    MissingTiming(&'static str),

    #[error("segment ends before it starts (start={start}, end={end})")]
    InvertedRange { start: f64, end: f64 },

    #[error("segment timing is not finite")]
    NonFinite,

    #[error("segment index {0} was already received")]
    DuplicateIndex(u64),
}

/// One clip failed to load or play. The coordinator stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioPlaybackError {
    #[error("failed to launch player for {audio_ref}: {message}")]
    Launch { audio_ref: String, message: String },

    #[error("player exited with {code:?} for {audio_ref}")]
    Exited { audio_ref: String, code: Option<i32> },
}

/// A new session was requested while the previous one was still live.
/// Resolved by forced cancellation; only ever logged.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("session {requested} requested while {active} is still {status}")]
pub struct SessionConflictError {
    pub requested: String,
    pub active: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("buffer threshold must be at least 1, got {0}")]
    BufferThreshold(usize),

    #[error("poll interval must be non-zero")]
    PollInterval,

    #[error("match tolerance must be a finite, non-negative number of seconds, got {0}")]
    Tolerance(f64),

    #[error("playback rate must be a finite positive multiplier, got {0}")]
    PlaybackRate(f32),

    #[error("invalid value for {key}: {message}")]
    Env { key: String, message: String },
}
