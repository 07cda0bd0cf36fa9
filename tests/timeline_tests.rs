use dubline::config::MatchPolicy;
use dubline::kernel::effect::SideEffect;
use dubline::kernel::segment::Segment;
use dubline::kernel::timeline::{resolve_active, TimelineSynchronizer};

fn two_segments() -> Vec<Segment> {
    vec![
        Segment::new(0, 10.0, 12.0, "first"),
        Segment::new(1, 20.0, 22.0, "second"),
    ]
}

fn within(tolerance_secs: f64) -> MatchPolicy {
    MatchPolicy::NearestWithin { tolerance_secs }
}

fn active_index(segments: &[Segment], position: f64, policy: MatchPolicy) -> Option<u64> {
    resolve_active(segments, position, policy).map(|s| s.index)
}

#[test]
fn test_containment_includes_both_bounds() {
    let segments = two_segments();
    assert_eq!(active_index(&segments, 10.0, MatchPolicy::ContainmentOnly), Some(0));
    assert_eq!(active_index(&segments, 11.0, MatchPolicy::ContainmentOnly), Some(0));
    assert_eq!(active_index(&segments, 12.0, MatchPolicy::ContainmentOnly), Some(0));
    assert_eq!(active_index(&segments, 12.01, MatchPolicy::ContainmentOnly), None);
}

#[test]
fn test_nearest_fallback_beyond_tolerance_is_none() {
    let segments = two_segments();

    // 13.5: distances 3.5 and 6.5 from the starts.
    assert_eq!(active_index(&segments, 13.5, within(2.0)), None);
    // 17: distances 7 and 3.
    assert_eq!(active_index(&segments, 17.0, within(2.0)), None);
}

#[test]
fn test_nearest_fallback_within_tolerance() {
    let segments = two_segments();
    assert_eq!(active_index(&segments, 13.5, within(4.0)), Some(0));
    assert_eq!(active_index(&segments, 17.0, within(4.0)), Some(1));
    assert_eq!(active_index(&segments, 18.0, within(2.0)), Some(1), "tolerance is inclusive");
}

#[test]
fn test_nearest_tie_goes_to_lower_index() {
    let segments = vec![
        Segment::new(5, 20.0, 21.0, "later"),
        Segment::new(2, 10.0, 11.0, "earlier"),
    ];
    // 15 is 5s from both starts.
    assert_eq!(active_index(&segments, 15.0, within(5.0)), Some(2));
}

#[test]
fn test_overlap_resolves_to_lowest_index() {
    let segments = vec![
        Segment::new(3, 0.0, 10.0, "three"),
        Segment::new(1, 4.0, 6.0, "one"),
        Segment::new(2, 5.0, 8.0, "two"),
    ];
    assert_eq!(active_index(&segments, 5.5, within(2.0)), Some(1), "not the first in order");
    assert_eq!(active_index(&segments, 7.0, within(2.0)), Some(2));
}

#[test]
fn test_empty_snapshot_and_bad_position() {
    assert_eq!(active_index(&[], 1.0, within(2.0)), None);
    assert_eq!(active_index(&two_segments(), f64::NAN, within(2.0)), None);
}

#[test]
fn test_best_text_prefers_primary() {
    let both = Segment::new(0, 0.0, 1.0, "primary").with_fallback("fallback");
    let fallback_only = Segment::new(1, 0.0, 1.0, "").with_fallback("fallback");
    let neither = Segment::new(2, 0.0, 1.0, "");

    assert_eq!(both.best_text(), Some("primary"));
    assert_eq!(fallback_only.best_text(), Some("fallback"));
    assert_eq!(neither.best_text(), None);
}

#[test]
fn test_caption_effect_only_on_change() {
    let segments = two_segments();
    let mut sync = TimelineSynchronizer::new(MatchPolicy::ContainmentOnly);

    // 1. Entering a segment shows it.
    let first = sync.sync(&segments, 11.0);
    assert_eq!(first.active.as_ref().map(|s| s.index), Some(0));
    assert!(matches!(first.caption, Some(SideEffect::ShowCaption(Some(ref t))) if t == "first"));

    // 2. Same segment on the next poll: no effect.
    let again = sync.sync(&segments, 11.5);
    assert!(again.caption.is_none());
    assert_eq!(sync.shown(), Some("first"));

    // 3. Gap blanks the display once.
    let gap = sync.sync(&segments, 15.0);
    assert!(gap.active.is_none());
    assert!(matches!(gap.caption, Some(SideEffect::ShowCaption(None))));
    assert!(sync.sync(&segments, 16.0).caption.is_none());
}

#[test]
fn test_clear_blanks_only_when_something_is_shown() {
    let mut sync = TimelineSynchronizer::new(within(2.0));
    assert!(sync.clear().is_none());

    sync.sync(&two_segments(), 21.0);
    assert!(matches!(sync.clear(), Some(SideEffect::ShowCaption(None))));
    assert_eq!(sync.shown(), None);
}
