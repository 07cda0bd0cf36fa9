use std::collections::HashMap;
use std::process::Stdio;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{AudioPlaybackError, ConfigError};
use crate::kernel::audio::ClipId;
use crate::kernel::event::Event;

/// Audio output capability. `start` must not block on playback; completion
/// and late failures are reported back as `ClipFinished` / `ClipFailed`.
pub trait AudioSink {
    fn start(&mut self, clip: ClipId, audio_ref: &str, rate: f32) -> Result<(), AudioPlaybackError>;
    fn stop(&mut self, clip: ClipId);
}

/// Discards audio. For caption-only runs.
#[derive(Debug, Default)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn start(&mut self, clip: ClipId, audio_ref: &str, rate: f32) -> Result<(), AudioPlaybackError> {
        debug!(clip = clip.0, audio_ref, rate, "audio disabled, clip skipped");
        Ok(())
    }

    fn stop(&mut self, _clip: ClipId) {}
}

/// External player command. `{ref}` and `{rate}` in the arguments are
/// substituted per clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "quiet", "-af", "atempo={rate}", "{ref}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PlayerConfig {
    /// `DUBLINE_PLAYER="mpv --no-video --speed={rate} {ref}"`
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("DUBLINE_PLAYER") {
            Ok(template) => Self::parse(&template),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| ConfigError::Env {
            key: "DUBLINE_PLAYER".to_string(),
            message: "empty player command".to_string(),
        })?;
        let args: Vec<String> = parts.collect();
        if !args.iter().any(|a| a.contains("{ref}")) {
            return Err(ConfigError::Env {
                key: "DUBLINE_PLAYER".to_string(),
                message: "player arguments must contain {ref}".to_string(),
            });
        }
        Ok(Self { program, args })
    }

    pub fn render(&self, audio_ref: &str, rate: f32) -> Vec<String> {
        let rate = format!("{rate:.2}");
        self.args
            .iter()
            .map(|a| a.replace("{rate}", &rate).replace("{ref}", audio_ref))
            .collect()
    }
}

/// Plays each clip in its own player process. Stopping kills the process.
pub struct CommandAudioSink {
    config: PlayerConfig,
    tx: mpsc::Sender<Event>,
    running: HashMap<ClipId, oneshot::Sender<()>>,
}

impl CommandAudioSink {
    pub fn new(config: PlayerConfig, tx: mpsc::Sender<Event>) -> Self {
        Self {
            config,
            tx,
            running: HashMap::new(),
        }
    }
}

impl AudioSink for CommandAudioSink {
    fn start(&mut self, clip: ClipId, audio_ref: &str, rate: f32) -> Result<(), AudioPlaybackError> {
        self.running.retain(|_, stop| !stop.is_closed());

        let mut child = tokio::process::Command::new(&self.config.program)
            .args(self.config.render(audio_ref, rate))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioPlaybackError::Launch {
                audio_ref: audio_ref.to_string(),
                message: e.to_string(),
            })?;

        info!(clip = clip.0, audio_ref, rate, "clip started");
        let (stop_tx, mut stop_rx) = oneshot::channel();
        self.running.insert(clip, stop_tx);

        let tx = self.tx.clone();
        let audio_ref = audio_ref.to_string();
        tokio::spawn(async move {
            let report = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => Some(Event::ClipFinished(clip)),
                    Ok(status) => Some(Event::ClipFailed {
                        clip,
                        error: AudioPlaybackError::Exited { audio_ref, code: status.code() },
                    }),
                    Err(e) => Some(Event::ClipFailed {
                        clip,
                        error: AudioPlaybackError::Launch { audio_ref, message: e.to_string() },
                    }),
                },
                _ = &mut stop_rx => {
                    let _ = child.kill().await;
                    None
                }
            };
            if let Some(event) = report {
                let _ = tx.send(event).await;
            }
        });
        Ok(())
    }

    fn stop(&mut self, clip: ClipId) {
        if let Some(stop) = self.running.remove(&clip) {
            debug!(clip = clip.0, "clip stopped");
            let _ = stop.send(());
        }
    }
}

impl Drop for CommandAudioSink {
    fn drop(&mut self) {
        for (_, stop) in self.running.drain() {
            let _ = stop.send(());
        }
    }
}
