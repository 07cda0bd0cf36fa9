use std::collections::VecDeque;

use serde::Serialize;

use super::event::{ClipEventKind, FrameDropReason, StreamOutcome, TelemetryEvent};

#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub sessions: SessionStats,
    pub frames: FrameStats,
    pub clips: ClipStats,
    pub captions_changed: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub started: u64,
    pub superseded: u64,
    pub completed: u64,
    pub closed: u64,
    pub aborted: u64,
    pub reconciled: u64,
    pub ready_fired: u64,
    pub avg_ready_latency_ticks: f64,
    pub stale_events: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameStats {
    pub malformed: u64,
    pub duplicates: u64,
    pub after_terminal: u64,
}

impl FrameStats {
    pub fn dropped(&self) -> u64 {
        self.malformed + self.duplicates + self.after_terminal
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClipStats {
    pub started: u64,
    pub stopped: u64,
    pub finished: u64,
    pub failed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut ready_latency_total = 0u64;

    for event in events {
        match event {
            TelemetryEvent::SessionStarted { .. } => snap.sessions.started += 1,
            TelemetryEvent::SessionSuperseded { .. } => snap.sessions.superseded += 1,
            TelemetryEvent::FrameDropped { reason, .. } => match reason {
                FrameDropReason::Malformed => snap.frames.malformed += 1,
                FrameDropReason::DuplicateIndex => snap.frames.duplicates += 1,
                FrameDropReason::AfterTerminal => snap.frames.after_terminal += 1,
            },
            TelemetryEvent::BufferReady { latency_ticks, .. } => {
                snap.sessions.ready_fired += 1;
                ready_latency_total += latency_ticks;
            }
            TelemetryEvent::StreamEnded { outcome, .. } => match outcome {
                StreamOutcome::Completed => snap.sessions.completed += 1,
                StreamOutcome::Closed => snap.sessions.closed += 1,
                StreamOutcome::Aborted => snap.sessions.aborted += 1,
                StreamOutcome::Cancelled => {}
            },
            TelemetryEvent::Reconciled { .. } => snap.sessions.reconciled += 1,
            TelemetryEvent::Clip { event, .. } => match event {
                ClipEventKind::Started => snap.clips.started += 1,
                ClipEventKind::Stopped => snap.clips.stopped += 1,
                ClipEventKind::Finished => snap.clips.finished += 1,
                ClipEventKind::Failed => snap.clips.failed += 1,
            },
            TelemetryEvent::StaleEvent { .. } => snap.sessions.stale_events += 1,
            TelemetryEvent::CaptionChanged { .. } => snap.captions_changed += 1,
        }
    }

    if snap.sessions.ready_fired > 0 {
        snap.sessions.avg_ready_latency_ticks =
            ready_latency_total as f64 / snap.sessions.ready_fired as f64;
    }

    snap
}
