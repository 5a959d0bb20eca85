use triage_core::model::{CLEARED_CHOICE, NO_CHOICE};
use triage_core::services::selection::{
    choice_score, parse_choice, SelectionParseError, SelectionState, ToggleOutcome,
};

#[test]
fn first_reconcile_adopts_displayed_value() {
    let mut state = SelectionState::new();
    assert_eq!(state.reconcile_row(0x10, NO_CHOICE, 50), NO_CHOICE);
    assert_eq!(state.reconcile_row(0x20, "80|foo", 50), "80|foo");
    assert_eq!(state.get(0x20), Some("80|foo"));
}

#[test]
fn prior_choice_survives_default_redisplay_until_threshold_passes_it() {
    let mut state: SelectionState = [(0x10, "70|foo".to_string())].into_iter().collect();

    assert_eq!(state.reconcile_row(0x10, NO_CHOICE, 60), "70|foo");
    assert_eq!(state.get(0x10), Some("70|foo"));

    assert_eq!(state.reconcile_row(0x10, NO_CHOICE, 80), CLEARED_CHOICE);
    assert_eq!(state.get(0x10), Some(CLEARED_CHOICE));
}

#[test]
fn changed_display_replaces_prior_choice() {
    let mut state: SelectionState = [(0x10, "70|foo".to_string())].into_iter().collect();
    assert_eq!(state.reconcile_row(0x10, "90|bar", 50), "90|bar");
    assert_eq!(state.reconcile_row(0x10, "90|bar", 50), "90|bar");
    assert_eq!(state.reconcile_row(0x10, CLEARED_CHOICE, 50), CLEARED_CHOICE);
}

#[test]
fn sentinels_are_never_cleared_by_threshold() {
    let mut state = SelectionState::new();
    assert_eq!(state.reconcile_row(0x10, CLEARED_CHOICE, 100), CLEARED_CHOICE);
    assert_eq!(state.reconcile_row(0x20, NO_CHOICE, 100), NO_CHOICE);
}

#[test]
fn toggle_deselects_mixed_rows_then_resets() {
    let mut state: SelectionState =
        [(1, CLEARED_CHOICE.to_string()), (2, "80|bar".to_string()), (9, "60|x".to_string())]
            .into_iter()
            .collect();
    let visible = [1, 2, 3];

    assert_eq!(state.toggle_all(&visible), ToggleOutcome::Deselected(3));
    for offset in visible {
        assert_eq!(state.get(offset), Some(CLEARED_CHOICE));
    }
    assert_eq!(state.get(9), Some("60|x"));

    assert_eq!(state.toggle_all(&visible), ToggleOutcome::Reset(3));
    assert!(state.is_empty());
}

#[test]
fn invalidate_missing_clears_only_vanished_candidates() {
    let mut state: SelectionState = [
        (1, "80|gone".to_string()),
        (2, "80|kept".to_string()),
        (3, CLEARED_CHOICE.to_string()),
        (4, NO_CHOICE.to_string()),
    ]
    .into_iter()
    .collect();
    let offered = vec!["80|kept".to_string()];

    assert!(state.invalidate_missing(1, &offered));
    assert!(!state.invalidate_missing(2, &offered));
    assert!(!state.invalidate_missing(3, &offered));
    assert!(!state.invalidate_missing(4, &offered));
    assert!(!state.invalidate_missing(5, &offered));

    assert_eq!(state.get(1), Some(CLEARED_CHOICE));
    assert_eq!(state.get(2), Some("80|kept"));
    assert_eq!(state.get(4), Some(NO_CHOICE));
}

#[test]
fn parse_choice_splits_on_first_separator() {
    let parsed = parse_choice("95|ns::op|helper").expect("parse");
    assert_eq!(parsed.score, 95);
    assert_eq!(parsed.label, "ns::op|helper");

    assert_eq!(
        parse_choice("plain_name"),
        Err(SelectionParseError::MissingSeparator("plain_name".into()))
    );
    assert_eq!(parse_choice("-|-"), Err(SelectionParseError::InvalidScore("-|-".into())));
    assert_eq!(choice_score("101|special"), Some(101));
    assert_eq!(choice_score(NO_CHOICE), None);
}
