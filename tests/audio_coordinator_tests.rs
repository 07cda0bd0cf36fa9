use dubline::error::AudioPlaybackError;
use dubline::kernel::audio::{AudioCoordinator, ClipId, PlaybackGates};
use dubline::kernel::effect::SideEffect;
use dubline::kernel::segment::Segment;

const OPEN: PlaybackGates = PlaybackGates {
    playing: true,
    seeking: false,
    ready: true,
};

fn voiced(index: u64, start: f64, end: f64) -> Segment {
    Segment::new(index, start, end, "text").with_audio(&format!("clip-{index}.mp3"))
}

fn started(effects: &[SideEffect]) -> Vec<ClipId> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::StartClip { clip, .. } => Some(*clip),
            _ => None,
        })
        .collect()
}

fn stopped(effects: &[SideEffect]) -> Vec<ClipId> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::StopClip(clip) => Some(*clip),
            _ => None,
        })
        .collect()
}

#[test]
fn test_segment_starts_once_across_polls() {
    let mut coordinator = AudioCoordinator::new(1.1);
    let segment = voiced(2, 10.0, 12.0);

    let first = coordinator.on_resolved(Some(&segment), OPEN);
    assert_eq!(started(&first).len(), 1);
    match &first[0] {
        SideEffect::StartClip { audio_ref, rate, .. } => {
            assert_eq!(audio_ref, "clip-2.mp3");
            assert_eq!(*rate, 1.1);
        }
        other => panic!("expected StartClip, got {:?}", other),
    }

    for _ in 0..5 {
        assert!(coordinator.on_resolved(Some(&segment), OPEN).is_empty(), "no restart while still active");
    }
    assert_eq!(coordinator.last_played_index(), Some(2));
}

#[test]
fn test_new_segment_stops_previous_clip_first() {
    let mut coordinator = AudioCoordinator::new(1.0);
    let first = coordinator.on_resolved(Some(&voiced(0, 0.0, 2.0)), OPEN);
    let first_clip = started(&first)[0];

    let effects = coordinator.on_resolved(Some(&voiced(1, 2.0, 4.0)), OPEN);
    assert!(matches!(effects[0], SideEffect::StopClip(c) if c == first_clip), "stop precedes start");
    assert!(matches!(effects[1], SideEffect::StartClip { .. }));
    assert_eq!(coordinator.current().map(|h| h.segment_index), Some(1));
}

#[test]
fn test_closed_gates_suppress_start() {
    let mut coordinator = AudioCoordinator::new(1.0);
    let segment = voiced(0, 0.0, 2.0);

    for gates in [
        PlaybackGates { playing: false, ..OPEN },
        PlaybackGates { seeking: true, ..OPEN },
        PlaybackGates { ready: false, ..OPEN },
    ] {
        assert!(coordinator.on_resolved(Some(&segment), gates).is_empty(), "{:?}", gates);
    }
    assert_eq!(coordinator.last_played_index(), None, "suppressed start is not remembered");
    assert_eq!(started(&coordinator.on_resolved(Some(&segment), OPEN)).len(), 1);
}

#[test]
fn test_no_resolution_lets_clip_finish() {
    let mut coordinator = AudioCoordinator::new(1.0);
    coordinator.on_resolved(Some(&voiced(0, 0.0, 2.0)), OPEN);

    assert!(coordinator.on_resolved(None, OPEN).is_empty());
    assert!(coordinator.on_resolved(Some(&Segment::new(1, 2.0, 3.0, "silent")), OPEN).is_empty());
    assert!(coordinator.current().is_some());
}

#[test]
fn test_halt_allows_replay_of_same_segment() {
    let mut coordinator = AudioCoordinator::new(1.0);
    let segment = voiced(2, 10.0, 12.0);
    let clip = started(&coordinator.on_resolved(Some(&segment), OPEN))[0];

    let halted = coordinator.halt();
    assert_eq!(stopped(&halted), vec![clip]);
    assert_eq!(coordinator.last_played_index(), None);
    assert!(coordinator.halt().is_empty(), "nothing left to stop");

    let replay = started(&coordinator.on_resolved(Some(&segment), OPEN));
    assert_eq!(replay.len(), 1);
    assert_ne!(replay[0], clip, "clip ids are never reused");
}

#[test]
fn test_finished_clip_is_not_restarted() {
    let mut coordinator = AudioCoordinator::new(1.0);
    let segment = voiced(0, 0.0, 2.0);
    let clip = started(&coordinator.on_resolved(Some(&segment), OPEN))[0];

    assert!(coordinator.on_clip_finished(clip));
    assert!(coordinator.current().is_none());
    assert!(coordinator.on_resolved(Some(&segment), OPEN).is_empty());
    assert!(!coordinator.on_clip_finished(ClipId(999)), "unknown clip is ignored");
}

#[test]
fn test_failed_clip_is_isolated() {
    let mut coordinator = AudioCoordinator::new(1.0);
    let clip = started(&coordinator.on_resolved(Some(&voiced(0, 0.0, 2.0)), OPEN))[0];

    let error = AudioPlaybackError::Exited {
        audio_ref: "clip-0.mp3".to_string(),
        code: Some(1),
    };
    assert!(coordinator.on_clip_failed(clip, error.clone()));
    assert_eq!(coordinator.failures(), 1);
    assert_eq!(coordinator.last_failure(), Some(&error));
    assert!(coordinator.current().is_none());

    // Coordinator keeps working for the next segment.
    assert_eq!(started(&coordinator.on_resolved(Some(&voiced(1, 2.0, 4.0)), OPEN)).len(), 1);
}
