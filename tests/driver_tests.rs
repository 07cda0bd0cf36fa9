use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dubline::config::SyncConfig;
use dubline::driver::{Driver, EVENT_QUEUE};
use dubline::error::{AudioPlaybackError, StreamError};
use dubline::ingress::ChunkSource;
use dubline::kernel::audio::ClipId;
use dubline::kernel::event::{ClockSignal, Event};
use dubline::kernel::segment::Segment;
use dubline::kernel::session::{SessionId, SessionStatus};
use dubline::playback::{AudioSink, CaptionDisplay, PlaybackClock, WallClock};
use dubline::services::ingest::IngestBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const BODY: &str = concat!(
    "data: {\"index\":0,\"start\":0.0,\"end\":2.0,\"azure_text\":\"முதல்\",\"audio_url\":\"/audio/0.mp3\"}\n\n",
    "data: {\"index\":1,\"start\":2.0,\"end\":4.0,\"azure_text\":\"இரண்டு\",\"audio_url\":\"/audio/1.mp3\"}\n\n",
    "data: {\"index\":2,\"start\":4.0,\"end\":6.0,\"azure_text\":\"மூன்று\"}\n\n",
    "data: {\"done\":true}\n\n",
);

#[derive(Clone)]
struct MemoryBackend {
    body: Option<Arc<Vec<u8>>>,
    finalized: Arc<Vec<Segment>>,
}

struct MemoryStream {
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkSource for MemoryStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        Ok(self.chunks.pop_front())
    }
}

impl IngestBackend for MemoryBackend {
    type Stream = MemoryStream;

    async fn open(&self, _session: &SessionId) -> Result<MemoryStream, StreamError> {
        match &self.body {
            Some(body) => Ok(MemoryStream {
                chunks: body.chunks(7).map(|c| c.to_vec()).collect(),
            }),
            None => Err(StreamError::Status {
                status: 404,
                url: "memory://stream".to_string(),
            }),
        }
    }

    async fn finalized(&self, _session: &SessionId) -> Result<Vec<Segment>, StreamError> {
        Ok(self.finalized.as_ref().clone())
    }

    fn resolve_audio_ref(&self, audio_ref: &str) -> String {
        format!("http://ingest{audio_ref}")
    }
}

#[derive(Default)]
struct ManualClock {
    position: f64,
    playing: bool,
}

impl PlaybackClock for ManualClock {
    fn position(&self) -> f64 {
        self.position
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    started: Arc<Mutex<Vec<(ClipId, String)>>>,
    stopped: Arc<Mutex<Vec<ClipId>>>,
    fail: bool,
}

impl AudioSink for RecordingSink {
    fn start(&mut self, clip: ClipId, audio_ref: &str, _rate: f32) -> Result<(), AudioPlaybackError> {
        if self.fail {
            return Err(AudioPlaybackError::Launch {
                audio_ref: audio_ref.to_string(),
                message: "no player".to_string(),
            });
        }
        self.started.lock().unwrap().push((clip, audio_ref.to_string()));
        Ok(())
    }

    fn stop(&mut self, clip: ClipId) {
        self.stopped.lock().unwrap().push(clip);
    }
}

#[derive(Clone, Default)]
struct RecordingCaptions {
    shown: Arc<Mutex<Vec<Option<String>>>>,
}

impl CaptionDisplay for RecordingCaptions {
    fn show(&mut self, text: Option<&str>) {
        self.shown.lock().unwrap().push(text.map(str::to_string));
    }
}

type TestDriver = Driver<MemoryBackend, ManualClock, RecordingSink, RecordingCaptions>;

fn driver(backend: MemoryBackend, sink: RecordingSink, captions: RecordingCaptions) -> TestDriver {
    let config = SyncConfig {
        buffer_threshold: 2,
        autoplay_delay: Duration::ZERO,
        ..SyncConfig::default()
    };
    Driver::new(config, mpsc::channel(EVENT_QUEUE), backend, ManualClock::default(), sink, captions).unwrap()
}

/// Steps until `done` holds, giving spawned tasks time to deliver.
async fn step_until(driver: &mut TestDriver, done: impl Fn(&TestDriver) -> bool) {
    for _ in 0..100 {
        driver.step();
        if done(driver) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("driver never reached the expected state");
}

fn finalized() -> Vec<Segment> {
    vec![
        Segment::new(0, 0.0, 2.1, "முதல்").with_audio("/audio/0.mp3"),
        Segment::new(1, 2.1, 4.0, "இரண்டு").with_audio("/audio/1.mp3"),
        Segment::new(2, 4.0, 6.0, "மூன்று"),
    ]
}

#[tokio::test]
async fn test_stream_to_audio_pipeline() {
    let backend = MemoryBackend {
        body: Some(Arc::new(BODY.as_bytes().to_vec())),
        finalized: Arc::new(finalized()),
    };
    let sink = RecordingSink::default();
    let captions = RecordingCaptions::default();
    let mut driver = driver(backend, sink.clone(), captions.clone());

    driver.sender().send(Event::StartSession(SessionId::new("demo"))).await.unwrap();

    // 1. Stream drains, reconciliation lands.
    step_until(&mut driver, |d| d.reactor().telemetry.snapshot().sessions.reconciled == 1).await;
    assert_eq!(driver.reactor().session_state().status, SessionStatus::Complete);
    assert_eq!(*driver.reactor().snapshot(), finalized());

    // 2. Autoplay started the clock; the first clip plays from the resolved URL.
    step_until(&mut driver, |_| !sink.started.lock().unwrap().is_empty()).await;
    assert!(driver.clock().is_playing());
    assert_eq!(sink.started.lock().unwrap()[0].1, "http://ingest/audio/0.mp3");
    assert!(captions.shown.lock().unwrap().contains(&Some("முதல்".to_string())));

    // 3. Shutdown silences audio.
    driver.shutdown();
    assert_eq!(sink.stopped.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_failure_aborts_session() {
    let backend = MemoryBackend {
        body: None,
        finalized: Arc::new(Vec::new()),
    };
    let mut driver = driver(backend, RecordingSink::default(), RecordingCaptions::default());
    driver.sender().send(Event::StartSession(SessionId::new("missing"))).await.unwrap();

    step_until(&mut driver, |d| d.reactor().session_state().status == SessionStatus::Aborted).await;
    assert!(driver.reactor().snapshot().is_empty());
    assert_eq!(driver.reactor().telemetry.snapshot().sessions.aborted, 1);
}

#[tokio::test]
async fn test_sink_launch_failure_is_fed_back() {
    let backend = MemoryBackend {
        body: Some(Arc::new(BODY.as_bytes().to_vec())),
        finalized: Arc::new(finalized()),
    };
    let sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };
    let mut driver = driver(backend, sink, RecordingCaptions::default());
    driver.sender().send(Event::StartSession(SessionId::new("demo"))).await.unwrap();

    step_until(&mut driver, |d| d.reactor().session().coordinator.failures() == 1).await;
    assert_eq!(driver.reactor().telemetry.snapshot().clips.failed, 1);
    assert!(driver.reactor().session().coordinator.current().is_none());
}

/// Body far longer than the event queue.
fn long_body(frames: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..frames {
        body.push_str(&format!(
            "data: {{\"index\":{i},\"start\":{i}.0,\"end\":{}.0,\"azure_text\":\"வரி {i}\"}}\n\n",
            i + 1
        ));
    }
    body.push_str("data: {\"done\":true}\n\n");
    body.into_bytes()
}

#[tokio::test]
async fn test_control_events_bypass_full_queue() {
    let backend = MemoryBackend {
        body: Some(Arc::new(long_body(400))),
        finalized: Arc::new(Vec::new()),
    };
    let config = SyncConfig {
        buffer_threshold: 2,
        autoplay: false,
        ..SyncConfig::default()
    };
    let mut driver = Driver::new(
        config,
        mpsc::channel(EVENT_QUEUE),
        backend,
        ManualClock::default(),
        RecordingSink::default(),
        RecordingCaptions::default(),
    )
    .unwrap();

    // 1. Start a session and let the reader fill the queue.
    driver.push_event(Event::StartSession(SessionId::new("first")));
    driver.step();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(driver.sender().capacity(), 0, "reader is blocked on a full queue");

    // 2. Controls are queued without waiting on the channel.
    driver.push_event(Event::Clock(ClockSignal::Paused));
    driver.push_event(Event::StartSession(SessionId::new("second")));
    let applied = driver.step();
    assert!(applied > EVENT_QUEUE, "controls and the backlog land in one tick");

    // 3. Controls ran ahead of the backlog, which is now stale.
    let state = driver.reactor().session_state();
    assert_eq!(state.session_id, Some(SessionId::new("second")));
    assert!(driver.reactor().telemetry.snapshot().sessions.stale_events >= EVENT_QUEUE as u64);

    // 4. The new session streams to the end.
    step_until(&mut driver, |d| d.reactor().session_state().received_count == 400).await;
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let backend = MemoryBackend {
        body: Some(Arc::new(BODY.as_bytes().to_vec())),
        finalized: Arc::new(finalized()),
    };
    let mut driver = driver(backend, RecordingSink::default(), RecordingCaptions::default());
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(1), driver.run(shutdown))
        .await
        .expect("run exits once shutdown fires");
}

#[tokio::test]
async fn test_wall_clock_tracks_play_pause_and_seek() {
    let mut clock = WallClock::new();
    assert!(!clock.is_playing());
    assert_eq!(clock.position(), 0.0);

    clock.play();
    tokio::time::sleep(Duration::from_millis(30)).await;
    clock.pause();
    let paused_at = clock.position();
    assert!(paused_at > 0.0);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(clock.position(), paused_at, "paused clock does not advance");

    let remote = clock.clone();
    remote.seek(30.0);
    assert_eq!(clock.position(), 30.0, "clones share one timeline");
    assert!(!clock.is_playing());
}
