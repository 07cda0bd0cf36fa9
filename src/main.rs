use anyhow::Context;
use dubline::config::SyncConfig;
use dubline::driver::{Driver, EVENT_QUEUE};
use dubline::kernel::event::{ClockSignal, Event};
use dubline::kernel::session::SessionId;
use dubline::playback::{CommandAudioSink, PlaybackClock, PlayerConfig, StdoutCaptions, WallClock};
use dubline::services::ingest::{IngestConfig, IngestService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Console controls. Clock commands act on the clock first, then tell the
/// kernel, the way a real player reports its own transitions.
enum Command {
    Play,
    Pause,
    Seek(f64),
    Session(SessionId),
    Stats,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "play" => Some(Command::Play),
        "pause" => Some(Command::Pause),
        "seek" => parts.next()?.parse().ok().filter(|p: &f64| p.is_finite()).map(Command::Seek),
        "session" => parts.next().map(|id| Command::Session(SessionId::new(id))),
        "stats" => Some(Command::Stats),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = SyncConfig::from_env().context("invalid synchronizer configuration")?;
    let ingest = IngestService::new(IngestConfig::from_env()?).context("building ingest client")?;
    let player = PlayerConfig::from_env()?;

    let session = std::env::args()
        .nth(1)
        .map(SessionId::new)
        .unwrap_or_else(SessionId::generate);

    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    let clock = WallClock::new();
    let audio = CommandAudioSink::new(player, tx.clone());
    let poll_interval = config.poll_interval;
    let mut driver = Driver::new(config, (tx, rx), ingest, clock.clone(), audio, StdoutCaptions)?;

    tracing::info!(session_id = %session, "dubline starting");
    driver.push_event(Event::StartSession(session));

    let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Commands: play | pause | seek <secs> | session <id> | stats | quit");
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(cmd) => {
                    if cmd_tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                None => println!("unrecognized command: {}", line.trim()),
            }
        }
    });

    let mut cadence = interval(poll_interval);
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut control = clock.clone();

    // Pause and seek-begin step at once so audio stops before the next tick.
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            cmd = cmd_rx.recv() => match cmd {
                None | Some(Command::Quit) => break,
                Some(Command::Play) => {
                    control.play();
                    driver.push_event(Event::Clock(ClockSignal::Played));
                }
                Some(Command::Pause) => {
                    control.pause();
                    driver.push_event(Event::Clock(ClockSignal::Paused));
                    driver.step();
                }
                Some(Command::Seek(position)) => {
                    driver.push_event(Event::Clock(ClockSignal::SeekBegin));
                    driver.step();
                    control.seek(position);
                    driver.push_event(Event::Clock(ClockSignal::SeekEnd));
                }
                Some(Command::Session(id)) => driver.push_event(Event::StartSession(id)),
                Some(Command::Stats) => {
                    let reactor = driver.reactor();
                    let state = reactor.session_state();
                    println!(
                        "session={} status={} received={} position={:.2}s",
                        state.session_id.map(|id| id.to_string()).unwrap_or_default(),
                        state.status,
                        state.received_count,
                        control.position(),
                    );
                    println!("{}", serde_json::to_string_pretty(&reactor.telemetry.snapshot())?);
                }
            },
            _ = cadence.tick() => {
                driver.step();
            }
        }
    }

    driver.shutdown();
    Ok(())
}
