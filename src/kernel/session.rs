use std::fmt;

use serde::{Deserialize, Serialize};

use super::audio::AudioCoordinator;
use super::gate::BufferGate;
use super::store::SegmentStore;

/// Opaque session token issued by the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generation counter stamped on everything a session's tasks send back.
/// Events carrying an older epoch belong to a superseded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionEpoch(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Idle,
    Buffering,
    Ready,
    Streaming,
    Complete,
    Aborted,
}

impl SessionStatus {
    /// Stream still open.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionStatus::Buffering | SessionStatus::Ready | SessionStatus::Streaming
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Aborted)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub session_id: Option<SessionId>,
    pub status: SessionStatus,
    pub received_count: usize,
}

/// The live (Store, Gate, Coordinator) tuple of one session. The reader
/// half lives in a driver task and is reached through its cancellation token.
#[derive(Debug)]
pub struct Session {
    pub id: Option<SessionId>,
    pub epoch: SessionEpoch,
    pub store: SegmentStore,
    pub gate: BufferGate,
    pub coordinator: AudioCoordinator,
}

impl Session {
    pub fn idle(buffer_threshold: usize, playback_rate: f32) -> Self {
        Self {
            id: None,
            epoch: SessionEpoch(0),
            store: SegmentStore::new(),
            gate: BufferGate::new(buffer_threshold),
            coordinator: AudioCoordinator::new(playback_rate),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            session_id: self.id.clone(),
            status: self.gate.status(),
            received_count: self.gate.received(),
        }
    }
}
