use triage_core::model::{format_choice, Criticality, LabelCandidate, CLEARED_CHOICE, NO_CHOICE};
use triage_core::version;

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

#[test]
fn candidate_formats_as_score_pipe_label() {
    let candidate = LabelCandidate::new(87, "memcpy").with_contributor("alice", "2024-01-01");
    assert_eq!(candidate.formatted(), "87|memcpy");
    assert_eq!(format_choice(100, "a|b"), "100|a|b");
}

#[test]
fn sentinels_are_distinct() {
    assert_ne!(NO_CHOICE, CLEARED_CHOICE);
    assert_eq!(CLEARED_CHOICE, "-|-");
}

#[test]
fn criticality_levels_round_trip_and_saturate() {
    for level in 0..=5u8 {
        assert_eq!(Criticality::from_level(level).level(), level);
    }
    assert_eq!(Criticality::from_level(9), Criticality::Conflict);
    assert_eq!(Criticality::Conflict.escalate(), Criticality::Conflict);
    assert!(Criticality::Disagreement > Criticality::Resolved);
}

#[test]
fn criticality_serializes_as_integer() {
    let json = serde_json::to_string(&Criticality::Disagreement).expect("serialize");
    assert_eq!(json, "4");
    let back: Criticality = serde_json::from_str("2").expect("deserialize");
    assert_eq!(back, Criticality::Resolved);
    assert!(serde_json::from_str::<Criticality>("6").is_err());
}
