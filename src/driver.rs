use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::ConfigError;
use crate::ingress::SegmentStreamReader;
use crate::kernel::effect::SideEffect;
use crate::kernel::event::Event;
use crate::kernel::reactor::Reactor;
use crate::kernel::session::{SessionEpoch, SessionId};
use crate::playback::{AudioSink, CaptionDisplay, PlaybackClock};
use crate::services::ingest::IngestBackend;

/// Kernel event channel depth.
pub const EVENT_QUEUE: usize = 256;

/// Async shell around the [`Reactor`]: collects events, samples the clock at
/// the poll cadence, and executes the side effects each tick returns.
pub struct Driver<B, C, A, D> {
    reactor: Reactor,
    rx: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    backend: B,
    clock: C,
    audio: A,
    captions: D,
    deferred: Vec<Event>,
}

impl<B, C, A, D> Driver<B, C, A, D>
where
    B: IngestBackend,
    C: PlaybackClock,
    A: AudioSink,
    D: CaptionDisplay,
{
    /// `channel` must be the pair other producers (audio sink, controls) were
    /// handed senders of.
    pub fn new(
        config: SyncConfig,
        channel: (mpsc::Sender<Event>, mpsc::Receiver<Event>),
        backend: B,
        clock: C,
        audio: A,
        captions: D,
    ) -> Result<Self, ConfigError> {
        let (tx, rx) = channel;
        Ok(Self {
            reactor: Reactor::new(config)?,
            rx,
            tx,
            backend,
            clock,
            audio,
            captions,
            deferred: Vec::new(),
        })
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Queues an event for the next `step` without touching the channel.
    /// Used by whoever owns the loop, which must never wait on the channel it
    /// drains.
    pub fn push_event(&mut self, event: Event) {
        self.deferred.push(event);
    }

    /// Runs ticks at the configured poll interval until `shutdown` fires.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let period = self.reactor.config().poll_interval;
        info!(poll_ms = period.as_millis() as u64, "synchronizer loop started");

        let mut cadence = interval(period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = cadence.tick() => {}
            }
            self.step();
        }
        self.shutdown();
    }

    /// Cancels the live stream and stops audio. Call once, after the last
    /// `step`.
    pub fn shutdown(&mut self) {
        let effects = self.reactor.shutdown();
        self.execute(effects);
        info!("synchronizer loop stopped");
    }

    /// One tick: drain pending events, sample the clock, apply, execute.
    /// Returns the number of events applied.
    pub fn step(&mut self) -> usize {
        let mut events = std::mem::take(&mut self.deferred);
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        let applied = events.len();

        let reading = self.clock.reading();
        let effects = self.reactor.tick_step(events, reading);
        self.execute(effects);
        applied
    }

    fn execute(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::OpenStream { epoch, session, cancel } => self.spawn_reader(epoch, session, cancel),
                SideEffect::Reconcile { epoch, session } => self.spawn_reconcile(epoch, session),
                SideEffect::ShowCaption(text) => self.captions.show(text.as_deref()),
                SideEffect::PlayVideo => self.clock.play(),
                SideEffect::PauseVideo => self.clock.pause(),
                SideEffect::StartClip { clip, audio_ref, rate } => {
                    let resolved = self.backend.resolve_audio_ref(&audio_ref);
                    if let Err(error) = self.audio.start(clip, &resolved, rate) {
                        // Reported on the next tick like any other clip outcome.
                        self.deferred.push(Event::ClipFailed { clip, error });
                    }
                }
                SideEffect::StopClip(clip) => self.audio.stop(clip),
            }
        }
    }

    fn spawn_reader(&self, epoch: SessionEpoch, session: SessionId, cancel: CancellationToken) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                opened = backend.open(&session) => opened,
            };
            match opened {
                Ok(source) => {
                    let exit = SegmentStreamReader::new(source, epoch, tx, cancel).run().await;
                    debug!(session_id = %session, epoch = epoch.0, ?exit, "reader finished");
                }
                Err(error) => {
                    warn!(session_id = %session, epoch = epoch.0, %error, "failed to open segment stream");
                    let _ = tx.send(Event::StreamFailed { epoch, error }).await;
                }
            }
        });
    }

    fn spawn_reconcile(&self, epoch: SessionEpoch, session: SessionId) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match backend.finalized(&session).await {
                Ok(segments) => Event::Reconciled { epoch, segments },
                Err(error) => Event::ReconcileFailed { epoch, error },
            };
            let _ = tx.send(event).await;
        });
    }
}
