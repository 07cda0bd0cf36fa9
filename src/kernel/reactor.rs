use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{ConfigError, FrameParseError, SessionConflictError, StreamError};

use super::audio::{ClipId, PlaybackGates};
use super::cancel::CancellationRegistry;
use super::effect::SideEffect;
use super::event::{ClockReading, ClockSignal, Event};
use super::gate::GateSignal;
use super::segment::{Segment, StreamEvent, WireSegment};
use super::session::{Session, SessionEpoch, SessionId, SessionState};
use super::store::Snapshot;
use super::telemetry::event::{ClipEventKind, FrameDropReason, StreamOutcome, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Tick;
use super::timeline::TimelineSynchronizer;

/// Last known state of the external playback clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockState {
    pub position: f64,
    pub playing: bool,
    pub seeking: bool,
}

/// The single state-update routine. Owns the active session and controls
/// its lifecycle; everything it wants done outside is returned as
/// `SideEffect`s.
pub struct Reactor {
    config: SyncConfig,
    pub tick: Tick,
    session: Session,
    synchronizer: TimelineSynchronizer,
    clock: ClockState,
    streams: CancellationRegistry,
    next_epoch: u64,
    session_started_at: Tick,
    autoplay_due: Option<Tick>,
    pub telemetry: TelemetryRecorder,
}

impl Reactor {
    /// Fails fast on invalid configuration, before any session exists.
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            session: Session::idle(config.buffer_threshold, config.playback_rate),
            synchronizer: TimelineSynchronizer::new(config.match_policy),
            config,
            tick: Tick::new(),
            clock: ClockState::default(),
            streams: CancellationRegistry::new(),
            next_epoch: 0,
            session_started_at: Tick::new(),
            autoplay_due: None,
            telemetry: TelemetryRecorder::new(),
        })
    }

    /// One synchronizer tick. Events are applied in delivery order, then the
    /// clock reading, then timeline resolution. Never awaits.
    pub fn tick_step(&mut self, events: Vec<Event>, reading: ClockReading) -> Vec<SideEffect> {
        self.tick = self.tick.next();
        let mut effects = Vec::new();

        for event in events {
            effects.extend(self.handle(event));
        }

        effects.extend(self.observe_clock(reading));
        effects.extend(self.autoplay());
        effects.extend(self.synchronize());
        effects
    }

    /// Applies one event outside the tick cadence.
    pub fn handle(&mut self, event: Event) -> Vec<SideEffect> {
        if let Some(epoch) = event.epoch() {
            if self.session.id.is_none() {
                debug!(epoch = epoch.0, "discarding session event with no session started");
                self.telemetry.record(TelemetryEvent::StaleEvent { epoch });
                return Vec::new();
            }
            if epoch != self.session.epoch {
                debug!(stale = epoch.0, current = self.session.epoch.0, "discarding event from superseded session");
                self.telemetry.record(TelemetryEvent::StaleEvent { epoch });
                return Vec::new();
            }
        }

        match event {
            Event::StartSession(id) => self.start_session(id),
            Event::Frame { event: StreamEvent::Segment(wire), .. } => self.on_segment(wire),
            Event::Frame { event: StreamEvent::Complete, .. } => self.on_complete(),
            Event::FrameRejected { error, .. } => {
                warn!(epoch = self.session.epoch.0, %error, "skipping malformed frame");
                self.drop_frame(FrameDropReason::Malformed);
                Vec::new()
            }
            Event::StreamClosed { .. } => self.on_stream_closed(),
            Event::StreamFailed { error, .. } => self.on_stream_failed(error),
            Event::Reconciled { segments, .. } => self.on_reconciled(segments),
            Event::ReconcileFailed { error, .. } => {
                warn!(epoch = self.session.epoch.0, %error, "reconciliation failed, keeping provisional segments");
                Vec::new()
            }
            Event::Clock(signal) => self.on_clock(signal),
            Event::ClipFinished(clip) => {
                if self.session.coordinator.on_clip_finished(clip) {
                    self.record_clip(clip, None, ClipEventKind::Finished);
                }
                Vec::new()
            }
            Event::ClipFailed { clip, error } => {
                self.session.coordinator.on_clip_failed(clip, error);
                self.record_clip(clip, None, ClipEventKind::Failed);
                Vec::new()
            }
        }
    }

    /// Owning context is going away: cancel the stream and silence audio.
    /// The session's segments stay readable.
    pub fn shutdown(&mut self) -> Vec<SideEffect> {
        let state = self.session.state();
        if let Some(epoch) = self.streams.cancel_current() {
            if state.status.is_live() {
                self.session.gate.abort();
                self.telemetry.record(TelemetryEvent::StreamEnded {
                    epoch,
                    outcome: StreamOutcome::Cancelled,
                    received: state.received_count,
                });
            }
        }
        self.autoplay_due = None;
        info!(epoch = self.session.epoch.0, "reactor shut down");
        self.halt_audio()
    }

    // === Session Controller ===

    fn start_session(&mut self, id: SessionId) -> Vec<SideEffect> {
        let previous = self.session.state();
        if previous.status.is_live() {
            let conflict = SessionConflictError {
                requested: id.to_string(),
                active: previous
                    .session_id
                    .as_ref()
                    .map(SessionId::to_string)
                    .unwrap_or_default(),
                status: previous.status.to_string(),
            };
            warn!(%conflict, "forcing teardown of live session");
            self.telemetry.record(TelemetryEvent::SessionSuperseded {
                epoch: self.session.epoch,
                status: previous.status,
            });
        }

        // Teardown completes before anything new starts; no tick runs in between.
        let mut effects = Vec::new();
        if let Some(epoch) = self.streams.cancel_current() {
            if previous.status.is_live() {
                self.telemetry.record(TelemetryEvent::StreamEnded {
                    epoch,
                    outcome: StreamOutcome::Cancelled,
                    received: previous.received_count,
                });
            }
        }
        let halted = self.session.coordinator.halt();
        self.note_clip_effects(&halted);
        effects.extend(halted);
        self.session.store.reset();
        self.session.gate.reset();
        self.autoplay_due = None;
        if let Some(caption) = self.synchronizer.clear() {
            self.telemetry.record(TelemetryEvent::CaptionChanged { blank: true });
            effects.push(caption);
        }
        if self.clock.playing {
            effects.push(SideEffect::PauseVideo);
        }

        self.next_epoch += 1;
        let epoch = SessionEpoch(self.next_epoch);
        self.session.id = Some(id.clone());
        self.session.epoch = epoch;
        self.session.gate.begin();
        self.session_started_at = self.tick;
        let cancel = self.streams.arm(epoch);

        info!(session_id = %id, epoch = epoch.0, "session started");
        self.telemetry.record(TelemetryEvent::SessionStarted { epoch, tick: self.tick });

        effects.push(SideEffect::OpenStream { epoch, session: id, cancel });
        effects
    }

    // === Buffer Gate / Store ===

    fn on_segment(&mut self, wire: WireSegment) -> Vec<SideEffect> {
        if self.session.gate.status().is_terminal() {
            debug!(epoch = self.session.epoch.0, "segment after stream end ignored");
            self.drop_frame(FrameDropReason::AfterTerminal);
            return Vec::new();
        }

        let index = wire.index.unwrap_or(self.session.gate.received() as u64);
        if self.session.store.contains_index(index) {
            let error = FrameParseError::DuplicateIndex(index);
            warn!(epoch = self.session.epoch.0, %error, "skipping frame");
            self.drop_frame(FrameDropReason::DuplicateIndex);
            return Vec::new();
        }

        self.session.store.append(wire.into_segment(index));
        if let Some(GateSignal::Ready) = self.session.gate.record_arrival() {
            self.on_ready();
        }
        Vec::new()
    }

    fn on_complete(&mut self) -> Vec<SideEffect> {
        if self.session.gate.status().is_terminal() {
            return Vec::new();
        }
        if let Some(GateSignal::Ready) = self.session.gate.complete() {
            self.on_ready();
        }

        let epoch = self.session.epoch;
        let received = self.session.gate.received();
        info!(epoch = epoch.0, received, "stream complete, requesting finalized segments");
        self.telemetry.record(TelemetryEvent::StreamEnded {
            epoch,
            outcome: StreamOutcome::Completed,
            received,
        });

        match self.session.id.clone() {
            Some(session) => vec![SideEffect::Reconcile { epoch, session }],
            None => Vec::new(),
        }
    }

    fn on_stream_closed(&mut self) -> Vec<SideEffect> {
        let epoch = self.session.epoch;
        self.streams.release(epoch);
        if !self.session.gate.status().is_live() {
            return Vec::new();
        }

        if let Some(GateSignal::Ready) = self.session.gate.complete() {
            self.on_ready();
        }
        let received = self.session.gate.received();
        info!(epoch = epoch.0, received, "stream closed without completion marker");
        self.telemetry.record(TelemetryEvent::StreamEnded {
            epoch,
            outcome: StreamOutcome::Closed,
            received,
        });
        Vec::new()
    }

    fn on_stream_failed(&mut self, error: StreamError) -> Vec<SideEffect> {
        let epoch = self.session.epoch;
        self.streams.release(epoch);
        if !self.session.gate.status().is_live() {
            debug!(epoch = epoch.0, %error, "transport error after stream end ignored");
            return Vec::new();
        }

        self.session.gate.abort();
        let received = self.session.gate.received();
        warn!(epoch = epoch.0, received, %error, "stream aborted");
        self.telemetry.record(TelemetryEvent::StreamEnded {
            epoch,
            outcome: StreamOutcome::Aborted,
            received,
        });
        Vec::new()
    }

    fn on_reconciled(&mut self, segments: Vec<Segment>) -> Vec<SideEffect> {
        let provisional = self.session.store.len();
        let finalized = segments.len();
        self.session.store.replace_all(segments);
        info!(epoch = self.session.epoch.0, provisional, finalized, "segments reconciled");
        self.telemetry.record(TelemetryEvent::Reconciled {
            epoch: self.session.epoch,
            provisional,
            finalized,
        });
        Vec::new()
    }

    fn on_ready(&mut self) {
        let epoch = self.session.epoch;
        let received = self.session.gate.received();
        info!(epoch = epoch.0, received, "buffer ready");
        self.telemetry.record(TelemetryEvent::BufferReady {
            epoch,
            received,
            latency_ticks: self.tick.ticks_since(self.session_started_at),
        });
        if self.config.autoplay {
            self.autoplay_due = Some(Tick {
                frame: self.tick.frame.saturating_add(self.config.autoplay_delay_ticks()),
            });
        }
    }

    // === Playback clock ===

    fn on_clock(&mut self, signal: ClockSignal) -> Vec<SideEffect> {
        match signal {
            ClockSignal::Played => {
                self.clock.playing = true;
                Vec::new()
            }
            ClockSignal::Paused => {
                self.clock.playing = false;
                self.halt_audio()
            }
            ClockSignal::SeekBegin => {
                self.clock.seeking = true;
                self.halt_audio()
            }
            ClockSignal::SeekEnd => {
                self.clock.seeking = false;
                Vec::new()
            }
        }
    }

    fn observe_clock(&mut self, reading: ClockReading) -> Vec<SideEffect> {
        self.clock.position = reading.position;
        let paused_unannounced = self.clock.playing && !reading.playing;
        self.clock.playing = reading.playing;
        if paused_unannounced {
            self.halt_audio()
        } else {
            Vec::new()
        }
    }

    fn autoplay(&mut self) -> Vec<SideEffect> {
        match self.autoplay_due {
            Some(due) if self.tick >= due => {
                self.autoplay_due = None;
                if self.clock.playing {
                    Vec::new()
                } else {
                    info!(epoch = self.session.epoch.0, "autoplay");
                    vec![SideEffect::PlayVideo]
                }
            }
            _ => Vec::new(),
        }
    }

    // === Timeline Synchronizer -> Audio Coordinator ===

    fn synchronize(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        let snapshot = self.session.store.snapshot();
        let resolution = self.synchronizer.sync(&snapshot, self.clock.position);

        if let Some(caption) = resolution.caption {
            let blank = matches!(caption, SideEffect::ShowCaption(None));
            self.telemetry.record(TelemetryEvent::CaptionChanged { blank });
            effects.push(caption);
        }

        let gates = PlaybackGates {
            playing: self.clock.playing,
            seeking: self.clock.seeking,
            ready: self.session.gate.has_fired(),
        };
        let clip_effects = self.session.coordinator.on_resolved(resolution.active.as_ref(), gates);
        self.note_clip_effects(&clip_effects);
        effects.extend(clip_effects);
        effects
    }

    fn halt_audio(&mut self) -> Vec<SideEffect> {
        let effects = self.session.coordinator.halt();
        self.note_clip_effects(&effects);
        effects
    }

    fn note_clip_effects(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            match effect {
                SideEffect::StartClip { clip, .. } => {
                    let index = self.session.coordinator.last_played_index();
                    self.record_clip(*clip, index, ClipEventKind::Started);
                }
                SideEffect::StopClip(clip) => self.record_clip(*clip, None, ClipEventKind::Stopped),
                _ => {}
            }
        }
    }

    fn record_clip(&mut self, clip: ClipId, segment_index: Option<u64>, event: ClipEventKind) {
        self.telemetry.record(TelemetryEvent::Clip { clip, segment_index, event });
    }

    fn drop_frame(&mut self, reason: FrameDropReason) {
        self.telemetry.record(TelemetryEvent::FrameDropped {
            epoch: self.session.epoch,
            reason,
        });
    }

    // Read-only accessors

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.session.epoch
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.store.snapshot()
    }

    pub fn clock(&self) -> ClockState {
        self.clock
    }

    pub fn caption(&self) -> Option<&str> {
        self.synchronizer.shown()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn has_live_stream(&self) -> bool {
        self.streams.is_armed()
    }
}
