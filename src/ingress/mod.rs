//! Segment Stream Reader.
//!
//! Turns an arbitrarily chunked byte stream of `data: <JSON>\n\n` frames into
//! kernel events. Decoding is split from I/O: [`decoder::FrameDecoder`] is
//! a synchronous state machine, [`reader::SegmentStreamReader`] pumps a
//! [`reader::ChunkSource`] through it until the body ends or the session's
//! cancellation token fires.

pub mod decoder;
pub mod reader;

pub use decoder::{FrameDecoder, Utf8StreamDecoder, EVENT_TAG, FRAME_DELIMITER};
pub use reader::{ChunkSource, ReaderExit, SegmentStreamReader};
