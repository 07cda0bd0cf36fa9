use tokio_util::sync::CancellationToken;

use super::session::SessionEpoch;

/// Tracks the cancellation token of the one reader that may be running.
///
/// Cancelling is synchronous: the token flips immediately and the reader's
/// pending chunk read resolves on its next poll.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    current: Option<(SessionEpoch, CancellationToken)>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any armed reader, then arms a fresh token for `epoch`.
    pub fn arm(&mut self, epoch: SessionEpoch) -> CancellationToken {
        self.cancel_current();
        let token = CancellationToken::new();
        self.current = Some((epoch, token.clone()));
        token
    }

    /// Returns the epoch whose reader was cancelled, if one was armed.
    pub fn cancel_current(&mut self) -> Option<SessionEpoch> {
        let (epoch, token) = self.current.take()?;
        token.cancel();
        Some(epoch)
    }

    /// The reader for `epoch` ended on its own; drop its token.
    pub fn release(&mut self, epoch: SessionEpoch) {
        if matches!(self.current, Some((armed, _)) if armed == epoch) {
            self.current = None;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }
}
