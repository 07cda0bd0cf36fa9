use serde::{Deserialize, Serialize};

use crate::error::FrameParseError;

/// A timed caption/dub unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Arrival order, unique within a session.
    pub index: u64,
    pub start: f64,
    pub end: f64,
    pub primary_text: String,
    pub fallback_text: Option<String>,
    /// Opaque token or URL of the synthesized clip.
    pub audio_ref: Option<String>,
}

impl Segment {
    pub fn new(index: u64, start: f64, end: f64, primary_text: &str) -> Self {
        Self {
            index,
            start,
            end,
            primary_text: primary_text.to_string(),
            fallback_text: None,
            audio_ref: None,
        }
    }

    pub fn with_fallback(mut self, text: &str) -> Self {
        self.fallback_text = Some(text.to_string());
        self
    }

    pub fn with_audio(mut self, audio_ref: &str) -> Self {
        self.audio_ref = Some(audio_ref.to_string());
        self
    }

    /// Closed interval `[start, end]`.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }

    /// "Best available" text: primary when non-empty, else fallback.
    pub fn best_text(&self) -> Option<&str> {
        if !self.primary_text.is_empty() {
            return Some(&self.primary_text);
        }
        self.fallback_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// One decoded frame of the ingress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Segment(WireSegment),
    Complete,
}

/// Segment as it arrives on the wire. `index` may be absent; the reactor
/// assigns one from arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct WireSegment {
    pub index: Option<u64>,
    pub start: f64,
    pub end: f64,
    pub primary_text: String,
    pub fallback_text: Option<String>,
    pub audio_ref: Option<String>,
}

impl WireSegment {
    pub fn into_segment(self, fallback_index: u64) -> Segment {
        Segment {
            index: self.index.unwrap_or(fallback_index),
            start: self.start,
            end: self.end,
            primary_text: self.primary_text,
            fallback_text: self.fallback_text,
            audio_ref: self.audio_ref,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    #[serde(default)]
    index: Option<u64>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
    #[serde(default, alias = "azure_text", alias = "text")]
    primary_text: Option<String>,
    #[serde(default, alias = "local_text")]
    fallback_text: Option<String>,
    #[serde(default, alias = "audio_url", alias = "audio")]
    audio_ref: Option<String>,
    #[serde(default, alias = "complete", alias = "completed")]
    done: Option<bool>,
}

/// Parses the JSON body of one `data:` frame.
pub fn parse_payload(json: &str) -> Result<StreamEvent, FrameParseError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| FrameParseError::Json(e.to_string()))?;
    if !value.is_object() {
        return Err(FrameParseError::NotAnObject);
    }
    let payload: FramePayload =
        serde_json::from_value(value).map_err(|e| FrameParseError::Json(e.to_string()))?;

    if payload.done == Some(true) {
        return Ok(StreamEvent::Complete);
    }
    payload.into_wire().map(StreamEvent::Segment)
}

impl FramePayload {
    fn into_wire(self) -> Result<WireSegment, FrameParseError> {
        let start = self.start.ok_or(FrameParseError::MissingTiming("start"))?;
        let end = self.end.ok_or(FrameParseError::MissingTiming("end"))?;
        if !start.is_finite() || !end.is_finite() {
            return Err(FrameParseError::NonFinite);
        }
        if end < start {
            return Err(FrameParseError::InvertedRange { start, end });
        }
        Ok(WireSegment {
            index: self.index,
            start,
            end,
            primary_text: self.primary_text.unwrap_or_default(),
            fallback_text: self.fallback_text,
            audio_ref: self.audio_ref.filter(|r| !r.is_empty()),
        })
    }
}

/// Reconciliation responses are either a bare list or `{"segments": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SegmentListBody {
    Bare(Vec<serde_json::Value>),
    Wrapped { segments: Vec<serde_json::Value> },
}

/// Decodes the finalized segment list. Entries use the same field names as
/// stream frames; invalid entries fail the whole list.
pub fn parse_segment_list(body: &str) -> Result<Vec<Segment>, FrameParseError> {
    let list: SegmentListBody =
        serde_json::from_str(body).map_err(|e| FrameParseError::Json(e.to_string()))?;
    let entries = match list {
        SegmentListBody::Bare(v) | SegmentListBody::Wrapped { segments: v } => v,
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            let payload: FramePayload = serde_json::from_value(value)
                .map_err(|e| FrameParseError::Json(e.to_string()))?;
            Ok(payload.into_wire()?.into_segment(position as u64))
        })
        .collect()
}
