use super::session::SessionStatus;

/// Buffer Gate: holds playback back until `threshold` segments arrived.
#[derive(Debug, Clone)]
pub struct BufferGate {
    threshold: usize,
    received: usize,
    status: SessionStatus,
    ready_fired: bool,
}

/// One-shot signals raised by gate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateSignal {
    Ready,
}

impl BufferGate {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            received: 0,
            status: SessionStatus::Idle,
            ready_fired: false,
        }
    }

    /// Idle -> Buffering when a stream opens.
    pub fn begin(&mut self) {
        self.received = 0;
        self.ready_fired = false;
        self.status = SessionStatus::Buffering;
    }

    /// Counts one arrival. Returns `Ready` exactly once per session, on the
    /// arrival that reaches the threshold.
    pub fn record_arrival(&mut self) -> Option<GateSignal> {
        if self.status.is_terminal() {
            return None;
        }
        self.received += 1;

        if !self.ready_fired && self.received >= self.threshold {
            self.ready_fired = true;
            self.status = SessionStatus::Ready;
            return Some(GateSignal::Ready);
        }

        match self.status {
            SessionStatus::Ready => self.status = SessionStatus::Streaming,
            SessionStatus::Idle => self.status = SessionStatus::Buffering,
            _ => {}
        }
        None
    }

    /// Terminal marker. A session that completes below the threshold still
    /// fires `Ready`: there is nothing left to wait for.
    pub fn complete(&mut self) -> Option<GateSignal> {
        if self.status.is_terminal() {
            return None;
        }
        self.status = SessionStatus::Complete;
        if self.ready_fired {
            None
        } else {
            self.ready_fired = true;
            Some(GateSignal::Ready)
        }
    }

    /// Transport failure. Keeps `Complete` if the marker already arrived.
    pub fn abort(&mut self) {
        if self.status != SessionStatus::Complete {
            self.status = SessionStatus::Aborted;
        }
    }

    pub fn reset(&mut self) {
        self.received = 0;
        self.ready_fired = false;
        self.status = SessionStatus::Idle;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn has_fired(&self) -> bool {
        self.ready_fired
    }
}
