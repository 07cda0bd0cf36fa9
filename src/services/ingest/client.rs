use std::time::Duration;

use reqwest::{header, Client, Response};
use tracing::{debug, info};

use crate::error::{ConfigError, StreamError};
use crate::ingress::ChunkSource;
use crate::kernel::segment::{parse_segment_list, Segment};
use crate::kernel::session::SessionId;

pub const DEFAULT_INGEST_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit for the one-shot reconciliation fetch. The ingress
    /// stream itself is long-lived and has no overall timeout.
    pub reconcile_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INGEST_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            reconcile_timeout: Duration::from_secs(30),
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DUBLINE_INGEST_URL") {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Env {
                    key: "DUBLINE_INGEST_URL".to_string(),
                    message: format!("expected an http(s) URL, got {url:?}"),
                });
            }
            config.base_url = url.to_string();
        }
        Ok(config)
    }
}

/// Client for the external ingestion service: the live segment stream, the
/// finalized segment list, and where synthesized clips live.
#[derive(Clone)]
pub struct IngestService {
    client: Client,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(config: IngestConfig) -> Result<Self, StreamError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    pub fn stream_url(&self, session: &SessionId) -> String {
        format!("{}/stream/{}", self.base(), session)
    }

    pub fn segments_url(&self, session: &SessionId) -> String {
        format!("{}/segments/{}", self.base(), session)
    }

    /// Opens the ingress body. Chunks are read by the caller.
    pub async fn open_stream(&self, session: &SessionId) -> Result<HttpChunkSource, StreamError> {
        let url = self.stream_url(session);
        info!(session_id = %session, %url, "opening segment stream");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(HttpChunkSource { response })
    }

    /// Reconciliation: the authoritative ordered segment list.
    pub async fn fetch_segments(&self, session: &SessionId) -> Result<Vec<Segment>, StreamError> {
        let url = self.segments_url(session);
        debug!(session_id = %session, %url, "fetching finalized segments");

        let response = self
            .client
            .get(&url)
            .timeout(self.config.reconcile_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        parse_segment_list(&body).map_err(|e| StreamError::Decode(e.to_string()))
    }

    /// Absolute URLs and bare tokens pass through; server-relative paths are
    /// joined onto the service base.
    pub fn resolve_audio_ref(&self, audio_ref: &str) -> String {
        if audio_ref.starts_with('/') && !audio_ref.starts_with("//") {
            format!("{}{}", self.base(), audio_ref)
        } else {
            audio_ref.to_string()
        }
    }
}

/// Ingress body as a [`ChunkSource`].
pub struct HttpChunkSource {
    response: Response,
}

impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        let chunk = self.response.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}
