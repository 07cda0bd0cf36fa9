use std::sync::Arc;

use super::segment::Segment;

/// Immutable, ordered view of a store at one point in time.
pub type Snapshot = Arc<Vec<Segment>>;

/// Append-only segment collection for one session.
///
/// Snapshots share the backing vector; an append after a snapshot was taken
/// copies on write, so a held snapshot never observes a partial append.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: Snapshot,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps arrival order even when `start` goes backwards.
    pub fn append(&mut self, segment: Segment) {
        Arc::make_mut(&mut self.segments).push(segment);
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.segments)
    }

    /// Swaps in the finalized list in one step.
    pub fn replace_all(&mut self, segments: Vec<Segment>) {
        self.segments = Arc::new(segments);
    }

    pub fn reset(&mut self) {
        self.segments = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains_index(&self, index: u64) -> bool {
        self.segments.iter().any(|s| s.index == index)
    }
}
