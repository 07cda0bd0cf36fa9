use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::kernel::event::Event;
use crate::kernel::session::SessionEpoch;

use super::decoder::FrameDecoder;

/// Transport handing out raw body chunks in order. `Ok(None)` is a normal
/// end of body.
pub trait ChunkSource: Send {
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, StreamError>> + Send;
}

/// How a reader run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderExit {
    Closed,
    Failed(StreamError),
    Cancelled,
}

/// Pumps one session's ingress body into the kernel channel.
pub struct SegmentStreamReader<S> {
    source: S,
    decoder: FrameDecoder,
    epoch: SessionEpoch,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl<S: ChunkSource> SegmentStreamReader<S> {
    pub fn new(source: S, epoch: SessionEpoch, tx: mpsc::Sender<Event>, cancel: CancellationToken) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(),
            epoch,
            tx,
            cancel,
        }
    }

    /// Runs until end of body, transport failure, or cancellation. A pending
    /// chunk read is abandoned as soon as the token fires.
    pub async fn run(mut self) -> ReaderExit {
        let epoch = self.epoch;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(epoch = epoch.0, "reader cancelled");
                    return ReaderExit::Cancelled;
                }
                chunk = self.source.next_chunk() => chunk,
            };

            match chunk {
                Ok(Some(bytes)) => {
                    for result in self.decoder.push(&bytes) {
                        let event = match result {
                            Ok(event) => Event::Frame { epoch, event },
                            Err(error) => {
                                debug!(epoch = epoch.0, %error, "frame rejected");
                                Event::FrameRejected { epoch, error }
                            }
                        };
                        if !Self::send(&self.tx, &self.cancel, event).await {
                            return ReaderExit::Cancelled;
                        }
                    }
                }
                Ok(None) => {
                    if let Some(rest) = self.decoder.finish() {
                        warn!(epoch = epoch.0, bytes = rest.len(), "stream ended inside a frame, discarding it");
                    }
                    if !Self::send(&self.tx, &self.cancel, Event::StreamClosed { epoch }).await {
                        return ReaderExit::Cancelled;
                    }
                    return ReaderExit::Closed;
                }
                Err(error) => {
                    warn!(epoch = epoch.0, %error, "ingress transport failed");
                    if !Self::send(&self.tx, &self.cancel, Event::StreamFailed { epoch, error: error.clone() }).await {
                        return ReaderExit::Cancelled;
                    }
                    return ReaderExit::Failed(error);
                }
            }
        }
    }

    /// False once the session is cancelled or the kernel is gone. Borrows
    /// only the channel halves so the source never has to be `Sync`.
    async fn send(tx: &mpsc::Sender<Event>, cancel: &CancellationToken, event: Event) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = tx.send(event) => sent.is_ok(),
        }
    }
}
