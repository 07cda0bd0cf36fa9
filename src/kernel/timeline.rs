//! Timeline resolution: which segment is active at a playback position.
//!
//! Containment wins: among segments with `start <= position <= end` the one
//! with the lowest `index` is active, regardless of where it sits in the
//! snapshot. Only when nothing contains the position does the configured
//! `MatchPolicy` apply. For `NearestWithin`, distance is measured from the
//! segment *start* (`|start - position|`), ties going to the lower index, and
//! the tolerance is inclusive.

use crate::config::MatchPolicy;

use super::effect::SideEffect;
use super::segment::Segment;

/// Pure resolution over a snapshot.
pub fn resolve_active(segments: &[Segment], position: f64, policy: MatchPolicy) -> Option<&Segment> {
    if !position.is_finite() {
        return None;
    }

    let contained = segments
        .iter()
        .filter(|s| s.contains(position))
        .min_by_key(|s| s.index);
    if contained.is_some() {
        return contained;
    }

    match policy {
        MatchPolicy::ContainmentOnly => None,
        MatchPolicy::NearestWithin { tolerance_secs } => {
            let mut best: Option<(&Segment, f64)> = None;
            for segment in segments {
                let distance = (segment.start - position).abs();
                best = match best {
                    Some((b, d)) if d < distance || (d == distance && b.index <= segment.index) => {
                        Some((b, d))
                    }
                    _ => Some((segment, distance)),
                };
            }
            best.filter(|(_, d)| *d <= tolerance_secs).map(|(s, _)| s)
        }
    }
}

/// Per-tick driver of the display. Remembers what it last showed so that an
/// unchanged resolution produces no new caption effect.
#[derive(Debug)]
pub struct TimelineSynchronizer {
    policy: MatchPolicy,
    shown: Option<String>,
}

/// Outcome of one synchronizer pass.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub active: Option<Segment>,
    pub caption: Option<SideEffect>,
}

impl TimelineSynchronizer {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy, shown: None }
    }

    pub fn sync(&mut self, segments: &[Segment], position: f64) -> Resolution {
        let active = resolve_active(segments, position, self.policy).cloned();
        let text = active.as_ref().and_then(|s| s.best_text()).map(str::to_string);
        let caption = self.show(text);
        Resolution { active, caption }
    }

    /// Blank the display, e.g. on session reset.
    pub fn clear(&mut self) -> Option<SideEffect> {
        self.show(None)
    }

    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    fn show(&mut self, text: Option<String>) -> Option<SideEffect> {
        if self.shown == text {
            return None;
        }
        self.shown = text.clone();
        Some(SideEffect::ShowCaption(text))
    }
}
