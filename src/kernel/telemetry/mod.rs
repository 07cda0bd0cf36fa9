//! Session telemetry.
//!
//! Telemetry is a write-only side layer: the reactor records into it but never
//! reads it back when deciding anything. Events carry identifiers and counts
//! only, never caption text or audio references.

pub mod event;
pub mod metrics;
pub mod recorder;
