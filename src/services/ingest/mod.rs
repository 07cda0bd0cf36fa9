pub mod backend;
pub mod client;

pub use backend::IngestBackend;
pub use client::{HttpChunkSource, IngestConfig, IngestService, DEFAULT_INGEST_URL};
