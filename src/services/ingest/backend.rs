use std::future::Future;

use crate::error::StreamError;
use crate::ingress::ChunkSource;
use crate::kernel::segment::Segment;
use crate::kernel::session::SessionId;

use super::client::{HttpChunkSource, IngestService};

/// What the driver needs from the ingestion service.
pub trait IngestBackend: Clone + Send + Sync + 'static {
    type Stream: ChunkSource + 'static;

    fn open(&self, session: &SessionId) -> impl Future<Output = Result<Self::Stream, StreamError>> + Send;

    fn finalized(&self, session: &SessionId) -> impl Future<Output = Result<Vec<Segment>, StreamError>> + Send;

    fn resolve_audio_ref(&self, audio_ref: &str) -> String {
        audio_ref.to_string()
    }
}

impl IngestBackend for IngestService {
    type Stream = HttpChunkSource;

    async fn open(&self, session: &SessionId) -> Result<HttpChunkSource, StreamError> {
        self.open_stream(session).await
    }

    async fn finalized(&self, session: &SessionId) -> Result<Vec<Segment>, StreamError> {
        self.fetch_segments(session).await
    }

    fn resolve_audio_ref(&self, audio_ref: &str) -> String {
        IngestService::resolve_audio_ref(self, audio_ref)
    }
}
