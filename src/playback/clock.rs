use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::kernel::event::ClockReading;

/// The video's playback clock. The kernel reads it and may ask it to play
/// or pause; it never moves the position.
pub trait PlaybackClock {
    fn position(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);

    fn reading(&self) -> ClockReading {
        ClockReading {
            position: self.position(),
            playing: self.is_playing(),
        }
    }
}

#[derive(Debug)]
struct WallClockState {
    /// Position at the moment `anchor` was taken.
    base: f64,
    /// Set while playing.
    anchor: Option<Instant>,
}

/// Clock that advances with wall time while playing. Clones share state, so
/// an outside controller can seek while the driver reads.
#[derive(Debug, Clone)]
pub struct WallClock {
    state: Arc<Mutex<WallClockState>>,
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(WallClockState { base: 0.0, anchor: None })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WallClockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// User-initiated jump. Keeps the play/pause state.
    pub fn seek(&self, position: f64) {
        let mut state = self.lock();
        state.base = position.max(0.0);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
    }
}

impl PlaybackClock for WallClock {
    fn position(&self) -> f64 {
        let state = self.lock();
        match state.anchor {
            Some(anchor) => state.base + anchor.elapsed().as_secs_f64(),
            None => state.base,
        }
    }

    fn is_playing(&self) -> bool {
        self.lock().anchor.is_some()
    }

    fn play(&mut self) {
        let mut state = self.lock();
        if state.anchor.is_none() {
            state.anchor = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        if let Some(anchor) = state.anchor.take() {
            state.base += anchor.elapsed().as_secs_f64();
        }
    }
}
