use triage_core::model::{Criticality, FunctionLabelRecord, FunctionMatchRecord, CLEARED_CHOICE};
use triage_core::services::filter::FilterMode;
use triage_core::services::host::{DefaultNamePattern, FunctionHost, InMemoryHost};
use triage_core::services::session::{OverviewCommand, OverviewSession, OverviewSettings};
use triage_core::services::selection::ToggleOutcome;
use triage_core::services::source::{LabelSource, SourceError, StaticLabelSource};

fn match_record(fid: u64, offset: u64, remote: u64, score: f64) -> FunctionMatchRecord {
    FunctionMatchRecord {
        local_function_id: fid,
        local_offset: offset,
        matched_family_id: 1,
        matched_sample_id: remote,
        matched_function_id: remote,
        matched_score: score,
        is_library_match: false,
    }
}

fn label(function_id: u64, text: &str) -> FunctionLabelRecord {
    FunctionLabelRecord {
        function_id,
        label_text: text.to_string(),
        username: "analyst".to_string(),
        timestamp: String::new(),
    }
}

fn labels() -> Vec<FunctionLabelRecord> {
    vec![label(101, "alpha"), label(102, "beta"), label(103, "alpha"), label(201, "gamma")]
}

fn host() -> InMemoryHost {
    InMemoryHost::new(DefaultNamePattern::default())
        .with_names([(0x1000, "sub_1000"), (0x2000, "SUB_2000"), (0x3000, "init_tables")])
}

/// 0x1000: alpha/beta tie at 95 plus alpha at 70; 0x2000: gamma at 60;
/// 0x3000: custom-named, no labels.
fn session(host: &mut InMemoryHost) -> OverviewSession {
    let mut session = OverviewSession::new(OverviewSettings::new(50, FilterMode::None));
    session.load_matches(
        vec![
            match_record(1, 0x1000, 101, 95.0),
            match_record(1, 0x1000, 102, 95.0),
            match_record(1, 0x1000, 103, 70.0),
            match_record(2, 0x2000, 201, 60.0),
            match_record(3, 0x3000, 301, 88.0),
        ],
        &*host,
    );
    session.handle(OverviewCommand::LabelsFetched { labels: labels() }, host);
    session
}

struct FailingSource;

impl LabelSource for FailingSource {
    fn fetch_labels(&self, _ids: &[u64]) -> Result<Vec<FunctionLabelRecord>, SourceError> {
        Err(SourceError::Unavailable("connection refused".into()))
    }
}

#[test]
fn loading_matches_sets_threshold_to_range_floor() {
    let mut host = host();
    let session = session(&mut host);
    assert_eq!(session.settings().threshold, 60);
    assert_eq!(session.threshold_range().upper, 95);
    assert_eq!(session.rows().len(), 3);
}

#[test]
fn rows_preselect_first_ranked_candidate() {
    let mut host = host();
    let session = session(&mut host);
    let row = session.row(0x1000).expect("row");
    assert_eq!(row.criticality, Criticality::Conflict);
    assert_eq!(row.choices, vec!["95|beta", "95|alpha", "70|alpha", CLEARED_CHOICE]);
    assert_eq!(row.preselected, "95|beta");

    let bare = session.row(0x3000).expect("row");
    assert_eq!(bare.choices, vec![CLEARED_CHOICE]);
    assert_eq!(bare.preselected, CLEARED_CHOICE);
    assert_eq!(bare.criticality, Criticality::NoSignal);
}

#[test]
fn chosen_value_sticks_across_recomputation_and_threshold_clears_it() {
    let mut host = host();
    let mut session = session(&mut host);

    let outcome = session.handle(
        OverviewCommand::Choose { offset: 0x1000, choice: "70|alpha".into() },
        &mut host,
    );
    assert!(!outcome.recomputed);
    assert!(outcome.diagnostics.is_empty());

    session.handle(OverviewCommand::SetFilter { filter: FilterMode::Labels }, &mut host);
    assert_eq!(session.selection().get(0x1000), Some("70|alpha"));
    assert_eq!(session.row(0x1000).expect("row").preselected, "70|alpha");

    session.handle(OverviewCommand::SetThreshold { threshold: 80 }, &mut host);
    assert_eq!(session.selection().get(0x1000), Some(CLEARED_CHOICE));
    assert_eq!(session.row(0x1000).expect("row").preselected, CLEARED_CHOICE);
}

#[test]
fn choose_rejects_values_that_are_not_offered() {
    let mut host = host();
    let mut session = session(&mut host);

    let outcome = session.handle(
        OverviewCommand::Choose { offset: 0x1000, choice: "99|invented".into() },
        &mut host,
    );
    assert_eq!(outcome.diagnostics.len(), 1);

    let outcome = session
        .handle(OverviewCommand::Choose { offset: 0x9999, choice: "95|beta".into() }, &mut host);
    assert_eq!(outcome.diagnostics[0].offset, 0x9999);
    assert_eq!(session.row(0x1000).expect("row").displayed, "-");
}

#[test]
fn toggle_all_deselects_then_restores_defaults() {
    let mut host = host();
    let mut session = session(&mut host);

    let outcome = session.handle(OverviewCommand::ToggleAll, &mut host);
    assert_eq!(outcome.toggle, Some(ToggleOutcome::Deselected(3)));
    assert!(session.rows().iter().all(|row| row.preselected == CLEARED_CHOICE));

    // Cleared values survive an ordinary recomputation.
    session.handle(OverviewCommand::Refresh, &mut host);
    assert!(session.rows().iter().all(|row| row.preselected == CLEARED_CHOICE));

    let outcome = session.handle(OverviewCommand::ToggleAll, &mut host);
    assert_eq!(outcome.toggle, Some(ToggleOutcome::Reset(3)));
    assert_eq!(session.row(0x1000).expect("row").preselected, "95|beta");
    assert_eq!(session.row(0x2000).expect("row").preselected, "60|gamma");
}

#[test]
fn resolve_pins_current_selection_and_unresolve_restores_criticality() {
    let mut host = host();
    let mut session = session(&mut host);

    session.handle(
        OverviewCommand::Choose { offset: 0x1000, choice: "95|alpha".into() },
        &mut host,
    );
    session.handle(OverviewCommand::ToggleResolution { offset: 0x1000 }, &mut host);
    assert_eq!(session.resolutions().resolved_label(0x1000), Some("95|alpha"));
    let row = session.row(0x1000).expect("row");
    assert!(row.resolved);
    assert_eq!(row.criticality, Criticality::Resolved);
    assert_eq!(row.preselected, "95|alpha");

    session.handle(OverviewCommand::SetFilter { filter: FilterMode::Conflicted }, &mut host);
    assert!(session.row(0x1000).is_none());

    session.handle(OverviewCommand::ToggleResolution { offset: 0x1000 }, &mut host);
    assert!(session.resolutions().is_empty());
    assert_eq!(session.row(0x1000).expect("row").criticality, Criticality::Conflict);
}

#[test]
fn resolution_survives_while_function_is_filtered_out() {
    let mut host = host();
    let mut session = session(&mut host);

    session.handle(OverviewCommand::Resolve { offset: 0x2000, label: None }, &mut host);
    session.handle(OverviewCommand::SetThreshold { threshold: 90 }, &mut host);
    assert!(session.row(0x2000).is_none());
    assert!(session.resolutions().is_resolved(0x2000));

    session.handle(OverviewCommand::SetThreshold { threshold: 60 }, &mut host);
    let row = session.row(0x2000).expect("row");
    assert_eq!(row.criticality, Criticality::Resolved);
    assert_eq!(row.preselected, "60|gamma");
}

#[test]
fn resolve_and_unresolve_report_missing_rows() {
    let mut host = host();
    let mut session = session(&mut host);

    let outcome =
        session.handle(OverviewCommand::Resolve { offset: 0x4242, label: None }, &mut host);
    assert!(!outcome.recomputed);
    assert_eq!(outcome.diagnostics.len(), 1);

    let outcome = session.handle(OverviewCommand::Unresolve { offset: 0x1000 }, &mut host);
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn explicit_resolve_requires_a_displayed_row_and_an_offered_label() {
    let mut host = host();
    let mut session = session(&mut host);

    let outcome = session.handle(
        OverviewCommand::Resolve { offset: 0x1000, label: Some("7|bogus".into()) },
        &mut host,
    );
    assert!(!outcome.recomputed);
    assert!(outcome.diagnostics[0].message.contains("not offered"));
    assert!(!session.resolutions().is_resolved(0x1000));

    let outcome = session.handle(
        OverviewCommand::Resolve { offset: 0x4242, label: Some("95|alpha".into()) },
        &mut host,
    );
    assert_eq!(outcome.diagnostics[0].message, "function is not displayed");
    assert!(session.resolutions().is_empty());

    let outcome = session.handle(
        OverviewCommand::Resolve { offset: 0x1000, label: Some("70|alpha".into()) },
        &mut host,
    );
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(session.row(0x1000).expect("row").preselected, "70|alpha");
    let report = session.apply_selected_labels(&mut host, true);
    assert!(report.applied.contains(&(0x1000, "alpha".to_string())));
}

#[test]
fn resolved_label_no_longer_offered_is_not_replaced_by_another_candidate() {
    let mut host = host();
    let mut session = session(&mut host);

    session.handle(
        OverviewCommand::Choose { offset: 0x1000, choice: "70|alpha".into() },
        &mut host,
    );
    session.handle(OverviewCommand::ToggleResolution { offset: 0x1000 }, &mut host);
    session.handle(OverviewCommand::SetThreshold { threshold: 80 }, &mut host);

    let row = session.row(0x1000).expect("row");
    assert!(row.resolved);
    assert_eq!(row.criticality, Criticality::Resolved);
    assert_eq!(row.preselected, CLEARED_CHOICE);
    let report = session.apply_selected_labels(&mut host, true);
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, 2);

    session.handle(OverviewCommand::SetThreshold { threshold: 60 }, &mut host);
    assert_eq!(session.row(0x1000).expect("row").preselected, "70|alpha");

    // Retracting the pinned label behaves the same way.
    let without_carol: Vec<_> = labels().into_iter().filter(|l| l.function_id != 103).collect();
    session.handle(OverviewCommand::LabelsFetched { labels: without_carol }, &mut host);
    assert_eq!(session.row(0x1000).expect("row").preselected, CLEARED_CHOICE);
    assert_eq!(session.resolutions().resolved_label(0x1000), Some("70|alpha"));
}

#[test]
fn retracted_label_clears_stale_selection() {
    let mut host = host();
    let mut session = session(&mut host);

    session.handle(OverviewCommand::Choose { offset: 0x2000, choice: "60|gamma".into() }, &mut host);
    session.handle(OverviewCommand::Refresh, &mut host);
    assert_eq!(session.selection().get(0x2000), Some("60|gamma"));

    let without_gamma: Vec<_> = labels().into_iter().filter(|l| l.label_text != "gamma").collect();
    session.handle(OverviewCommand::LabelsFetched { labels: without_gamma }, &mut host);
    assert_eq!(session.selection().get(0x2000), Some(CLEARED_CHOICE));
}

#[test]
fn apply_renames_only_default_named_functions() {
    let mut host = host();
    let mut session = session(&mut host);
    session.handle(OverviewCommand::Choose { offset: 0x2000, choice: CLEARED_CHOICE.into() }, &mut host);

    let report = session.apply_selected_labels(&mut host, false);
    assert_eq!(report.applied, vec![(0x1000, "beta".to_string())]);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.kept_custom, 0);
    assert!(report.diagnostics.is_empty());
    assert_eq!(host.function_name(0x1000).as_deref(), Some("beta"));

    // The renamed function now counts as named.
    assert_eq!(session.row(0x1000).expect("row").criticality, Criticality::Named);
}

#[test]
fn apply_dry_run_leaves_host_untouched() {
    let mut host = host();
    let mut session = session(&mut host);

    let report = session.apply_selected_labels(&mut host, true);
    assert_eq!(report.applied.len(), 2);
    assert!(host.renamed().is_empty());
    assert_eq!(host.function_name(0x2000).as_deref(), Some("SUB_2000"));
}

#[test]
fn apply_reports_custom_names_and_unknown_functions() {
    let mut host = InMemoryHost::new(DefaultNamePattern::default())
        .with_names([(0x2000, "checksum"), (0x3000, "init_tables")]);
    let mut session = session(&mut host);
    assert_eq!(session.row(0x2000).expect("row").criticality, Criticality::Named);

    let report = session.apply_selected_labels(&mut host, false);
    assert!(report.applied.is_empty());
    assert_eq!(report.kept_custom, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].offset, 0x1000);
    assert!(host.renamed().is_empty());
}

#[test]
fn fetch_labels_failure_keeps_previous_state() {
    let mut host = host();
    let mut session = session(&mut host);
    let before = session.rows().to_vec();

    let err = session.fetch_labels(&FailingSource, &mut host).expect_err("fetch fails");
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(session.rows(), before.as_slice());

    let source = StaticLabelSource::new(vec![label(201, "gamma"), label(999, "unrelated")]);
    let outcome = session.fetch_labels(&source, &mut host).expect("fetch");
    assert!(outcome.recomputed);
    assert_eq!(session.labels().len(), 1);
    assert_eq!(session.row(0x1000).expect("row").criticality, Criticality::NoSignal);
}

#[test]
fn jump_forwards_to_host() {
    let mut host = host();
    let mut session = session(&mut host);
    let outcome = session.handle(OverviewCommand::Jump { offset: 0x2000 }, &mut host);
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(host.cursor(), Some(0x2000));

    let outcome = session.handle(OverviewCommand::Jump { offset: 0x5 }, &mut host);
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn recomputation_is_idempotent() {
    let mut host = host();
    let mut session = session(&mut host);
    let first = serde_json::to_string(session.rows()).expect("serialize");
    session.handle(OverviewCommand::Refresh, &mut host);
    session.handle(OverviewCommand::Refresh, &mut host);
    assert_eq!(serde_json::to_string(session.rows()).expect("serialize"), first);
}
