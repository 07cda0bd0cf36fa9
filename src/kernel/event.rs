use crate::error::{AudioPlaybackError, FrameParseError, StreamError};

use super::audio::ClipId;
use super::segment::{Segment, StreamEvent};
use super::session::{SessionEpoch, SessionId};

/// Every external occurrence the kernel reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// Supersedes whatever session is active.
    StartSession(SessionId),

    /// One decoded frame from the session's reader.
    Frame { epoch: SessionEpoch, event: StreamEvent },

    /// A frame the reader had to skip.
    FrameRejected { epoch: SessionEpoch, error: FrameParseError },

    /// Transport reported end-of-body.
    StreamClosed { epoch: SessionEpoch },

    StreamFailed { epoch: SessionEpoch, error: StreamError },

    /// Finalized list from the reconciliation endpoint.
    Reconciled { epoch: SessionEpoch, segments: Vec<Segment> },

    ReconcileFailed { epoch: SessionEpoch, error: StreamError },

    Clock(ClockSignal),

    ClipFinished(ClipId),

    ClipFailed { clip: ClipId, error: AudioPlaybackError },
}

impl Event {
    /// Epoch of session-scoped events; `None` for everything else.
    pub fn epoch(&self) -> Option<SessionEpoch> {
        match self {
            Event::Frame { epoch, .. }
            | Event::FrameRejected { epoch, .. }
            | Event::StreamClosed { epoch }
            | Event::StreamFailed { epoch, .. }
            | Event::Reconciled { epoch, .. }
            | Event::ReconcileFailed { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}

/// Notifications from the playback clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    Played,
    Paused,
    SeekBegin,
    SeekEnd,
}

/// Clock state sampled by the driver at each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    pub position: f64,
    pub playing: bool,
}

impl ClockReading {
    pub fn playing_at(position: f64) -> Self {
        Self { position, playing: true }
    }

    pub fn paused_at(position: f64) -> Self {
        Self { position, playing: false }
    }
}
