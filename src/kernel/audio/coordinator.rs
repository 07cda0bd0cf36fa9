use tracing::{debug, warn};

use crate::error::AudioPlaybackError;
use crate::kernel::effect::SideEffect;
use crate::kernel::segment::Segment;

/// Identifies one acquired clip. Never reused, even across sessions, so a
/// late completion report cannot be mistaken for a newer clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ClipId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct ClipHandle {
    pub clip: ClipId,
    pub segment_index: u64,
    pub audio_ref: String,
}

/// Conditions that must all hold before a clip may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackGates {
    pub playing: bool,
    pub seeking: bool,
    pub ready: bool,
}

impl PlaybackGates {
    pub fn open(&self) -> bool {
        self.playing && !self.seeking && self.ready
    }
}

/// Sole owner of the audio handle: at most one clip is live at a time.
#[derive(Debug)]
pub struct AudioCoordinator {
    rate: f32,
    current: Option<ClipHandle>,
    last_played: Option<u64>,
    next_clip: u64,
    failures: u64,
    last_failure: Option<AudioPlaybackError>,
}

impl AudioCoordinator {
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            current: None,
            last_played: None,
            next_clip: 0,
            failures: 0,
            last_failure: None,
        }
    }

    /// Maps the synchronizer's resolution to play/stop decisions.
    ///
    /// "No active segment" and segments without audio leave the current clip
    /// to finish on its own.
    pub fn on_resolved(&mut self, resolved: Option<&Segment>, gates: PlaybackGates) -> Vec<SideEffect> {
        let Some(segment) = resolved else {
            return Vec::new();
        };
        let Some(audio_ref) = segment.audio_ref.as_deref() else {
            return Vec::new();
        };
        if self.last_played == Some(segment.index) {
            return Vec::new();
        }
        if !gates.open() {
            debug!(index = segment.index, ?gates, "clip start suppressed");
            return Vec::new();
        }

        let mut effects = self.release();
        let clip = ClipId(self.next_clip);
        self.next_clip += 1;
        self.current = Some(ClipHandle {
            clip,
            segment_index: segment.index,
            audio_ref: audio_ref.to_string(),
        });
        self.last_played = Some(segment.index);

        effects.push(SideEffect::StartClip {
            clip,
            audio_ref: audio_ref.to_string(),
            rate: self.rate,
        });
        effects
    }

    /// Pause, seek-begin and session reset: stop now and forget what was
    /// played, so re-entering the same segment later replays it.
    pub fn halt(&mut self) -> Vec<SideEffect> {
        self.last_played = None;
        self.release()
    }

    /// Clip ran to its end. `last_played` is kept so polling the same
    /// segment does not restart it.
    pub fn on_clip_finished(&mut self, clip: ClipId) -> bool {
        if self.is_current(clip) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Records the failure and releases the handle. The segment is not
    /// retried until it is re-entered after a halt.
    pub fn on_clip_failed(&mut self, clip: ClipId, error: AudioPlaybackError) -> bool {
        warn!(clip = clip.0, %error, "audio clip failed");
        self.failures += 1;
        self.last_failure = Some(error);
        if self.is_current(clip) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&ClipHandle> {
        self.current.as_ref()
    }

    pub fn last_played_index(&self) -> Option<u64> {
        self.last_played
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn last_failure(&self) -> Option<&AudioPlaybackError> {
        self.last_failure.as_ref()
    }

    fn is_current(&self, clip: ClipId) -> bool {
        self.current.as_ref().is_some_and(|h| h.clip == clip)
    }

    fn release(&mut self) -> Vec<SideEffect> {
        match self.current.take() {
            Some(handle) => vec![SideEffect::StopClip(handle.clip)],
            None => Vec::new(),
        }
    }
}
