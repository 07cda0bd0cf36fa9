use tokio_util::sync::CancellationToken;

use super::audio::ClipId;
use super::session::{SessionEpoch, SessionId};

/// Outward actions produced by a step. The driver executes them in order.
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Start a reader for `session`; it must stop when `cancel` fires and
    /// stamp everything it sends with `epoch`.
    OpenStream {
        epoch: SessionEpoch,
        session: SessionId,
        cancel: CancellationToken,
    },

    /// Fetch the finalized segment list once.
    Reconcile { epoch: SessionEpoch, session: SessionId },

    /// Replace the caption; `None` blanks it.
    ShowCaption(Option<String>),

    PlayVideo,
    PauseVideo,

    StartClip {
        clip: ClipId,
        audio_ref: String,
        rate: f32,
    },

    StopClip(ClipId),
}
