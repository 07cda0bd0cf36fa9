use serde::{Deserialize, Serialize};

use crate::kernel::audio::ClipId;
use crate::kernel::session::{SessionEpoch, SessionStatus};
use crate::kernel::time::Tick;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionStarted {
        epoch: SessionEpoch,
        tick: Tick,
    },

    /// A live session was torn down to make room for a new one.
    SessionSuperseded {
        epoch: SessionEpoch,
        status: SessionStatus,
    },

    FrameDropped {
        epoch: SessionEpoch,
        reason: FrameDropReason,
    },

    BufferReady {
        epoch: SessionEpoch,
        received: usize,
        latency_ticks: u64,
    },

    StreamEnded {
        epoch: SessionEpoch,
        outcome: StreamOutcome,
        received: usize,
    },

    Reconciled {
        epoch: SessionEpoch,
        provisional: usize,
        finalized: usize,
    },

    Clip {
        clip: ClipId,
        segment_index: Option<u64>,
        event: ClipEventKind,
    },

    /// Event from a superseded session arrived late and was ignored.
    StaleEvent {
        epoch: SessionEpoch,
    },

    CaptionChanged {
        blank: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameDropReason {
    Malformed,
    DuplicateIndex,
    AfterTerminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamOutcome {
    /// Completion marker received.
    Completed,
    /// Body ended without a marker.
    Closed,
    Aborted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipEventKind {
    Started,
    Stopped,
    Finished,
    Failed,
}
