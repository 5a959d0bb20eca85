//! Overview session: the single owner of match data and analyst state.
//!
//! Every input change arrives as an [`OverviewCommand`] and runs a full,
//! blocking recomputation before returning. Because the session is driven
//! through `&mut self`, recomputations are serialized by construction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{
    AggregatedFunctionSummary, Criticality, FunctionLabelRecord, FunctionMatchRecord,
    CLEARED_CHOICE, NO_CHOICE,
};
use crate::services::aggregator::{
    aggregate, AggregateCounters, Aggregation, AggregationRequest, ThresholdRange,
};
use crate::services::filter::FilterMode;
use crate::services::host::FunctionHost;
use crate::services::resolution::ResolutionStore;
use crate::services::selection::{parse_choice, SelectionState, ToggleOutcome};
use crate::services::source::{index_labels, LabelIndex, LabelSource, SourceError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Fetching labels failed: {0}")]
    Source(#[from] SourceError),
}

/// Non-fatal problem attached to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDiagnostic {
    pub offset: u64,
    pub message: String,
}

impl RowDiagnostic {
    pub fn new(offset: u64, message: impl Into<String>) -> Self {
        Self { offset, message: message.into() }
    }
}

/// Threshold and filter currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewSettings {
    /// Configured floor for the threshold range.
    pub min_score: i64,
    pub threshold: i64,
    pub filter: FilterMode,
}

impl OverviewSettings {
    pub fn new(min_score: i64, filter: FilterMode) -> Self {
        Self { min_score, threshold: min_score, filter }
    }
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self::new(50, FilterMode::None)
    }
}

/// One displayed row of the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub local_function_id: u64,
    pub offset: u64,
    pub criticality: Criticality,
    pub families: usize,
    pub samples: usize,
    pub functions: usize,
    pub is_library: bool,
    /// Ranked candidate strings followed by the cleared sentinel.
    pub choices: Vec<String>,
    /// Choice the presentation layer should preselect.
    pub preselected: String,
    /// Value reported back by the presentation layer; `"-"` until the analyst changes it.
    pub displayed: String,
    pub resolved: bool,
}

impl OverviewRow {
    fn from_summary(
        summary: &AggregatedFunctionSummary,
        choices: Vec<String>,
        preselected: String,
        resolved: bool,
    ) -> Self {
        Self {
            local_function_id: summary.local_function_id,
            offset: summary.offset,
            criticality: summary.criticality,
            families: summary.families.len(),
            samples: summary.samples.len(),
            functions: summary.functions.len(),
            is_library: summary.is_library(),
            choices,
            preselected,
            displayed: NO_CHOICE.to_string(),
            resolved,
        }
    }

    /// What the analyst currently sees selected for this row.
    pub fn effective_selection(&self) -> &str {
        if self.displayed == NO_CHOICE {
            &self.preselected
        } else {
            &self.displayed
        }
    }
}

/// Closed set of inputs the presentation layer can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OverviewCommand {
    SetThreshold { threshold: i64 },
    SetFilter { filter: FilterMode },
    /// New label records arrived from the label source.
    LabelsFetched { labels: Vec<FunctionLabelRecord> },
    /// The analyst changed the displayed choice of a row; no recomputation.
    Choose { offset: u64, choice: String },
    SelectAll,
    DeselectAll,
    /// Deselect or reset depending on the visible rows.
    ToggleAll,
    /// Pin `label`, or the row's current selection when `label` is absent.
    /// The row must be displayed and `label` must be one of its choices.
    Resolve { offset: u64, label: Option<String> },
    Unresolve { offset: u64 },
    ToggleResolution { offset: u64 },
    Jump { offset: u64 },
    Refresh,
}

/// What a command did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub recomputed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<ToggleOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<RowDiagnostic>,
}

impl CommandOutcome {
    fn recomputed() -> Self {
        Self { recomputed: true, ..Self::default() }
    }

    fn diagnostic(offset: u64, message: impl Into<String>) -> Self {
        Self { diagnostics: vec![RowDiagnostic::new(offset, message)], ..Self::default() }
    }
}

/// Result of importing selected labels into the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Functions renamed (or that would be, on a dry run).
    pub applied: Vec<(u64, String)>,
    /// Rows explicitly cleared by the analyst.
    pub skipped: usize,
    /// Rows whose function already carries a custom name.
    pub kept_custom: usize,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Owner of match data, labels, selection and resolution state.
#[derive(Debug, Clone, Default)]
pub struct OverviewSession {
    settings: OverviewSettings,
    range: ThresholdRange,
    matches: Vec<FunctionMatchRecord>,
    labels: LabelIndex,
    selection: SelectionState,
    resolutions: ResolutionStore,
    aggregation: Aggregation,
    rows: Vec<OverviewRow>,
}

impl OverviewSession {
    pub fn new(settings: OverviewSettings) -> Self {
        Self {
            settings,
            range: ThresholdRange { lower: settings.min_score, upper: settings.min_score },
            ..Self::default()
        }
    }

    /// Builder-style helper to restore persisted analyst state.
    pub fn with_state(mut self, selection: SelectionState, resolutions: ResolutionStore) -> Self {
        self.selection = selection;
        self.resolutions = resolutions;
        self
    }

    pub fn settings(&self) -> OverviewSettings {
        self.settings
    }

    pub fn threshold_range(&self) -> ThresholdRange {
        self.range
    }

    pub fn rows(&self) -> &[OverviewRow] {
        &self.rows
    }

    pub fn row(&self, offset: u64) -> Option<&OverviewRow> {
        self.rows.iter().find(|row| row.offset == offset)
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn counters(&self) -> &AggregateCounters {
        &self.aggregation.counters
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn resolutions(&self) -> &ResolutionStore {
        &self.resolutions
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Distinct remote function ids across the loaded matches.
    pub fn matched_function_ids(&self) -> Vec<u64> {
        let ids: BTreeSet<u64> = self.matches.iter().map(|m| m.matched_function_id).collect();
        ids.into_iter().collect()
    }

    /// Replace the match set, derive its threshold range and recompute.
    ///
    /// The threshold is reset to the lower end of the new range.
    pub fn load_matches(&mut self, matches: Vec<FunctionMatchRecord>, host: &dyn FunctionHost) {
        self.range = ThresholdRange::from_matches(&matches, self.settings.min_score);
        self.settings.threshold = self.range.lower;
        self.matches = matches;
        self.recompute(host, true);
    }

    /// Ask `source` for labels of every matched function, then recompute.
    ///
    /// On failure nothing is recomputed and the previous labels stay in place.
    pub fn fetch_labels(
        &mut self,
        source: &dyn LabelSource,
        host: &mut dyn FunctionHost,
    ) -> Result<CommandOutcome, SessionError> {
        let ids = self.matched_function_ids();
        let labels = source.fetch_labels(&ids)?;
        info!(functions = ids.len(), labels = labels.len(), "fetched function labels");
        Ok(self.handle(OverviewCommand::LabelsFetched { labels }, host))
    }

    /// Apply one command.
    pub fn handle(
        &mut self,
        command: OverviewCommand,
        host: &mut dyn FunctionHost,
    ) -> CommandOutcome {
        let outcome = match command {
            OverviewCommand::SetThreshold { threshold } => {
                self.settings.threshold = self.range.clamp(threshold);
                self.recompute(&*host, true);
                CommandOutcome::recomputed()
            }
            OverviewCommand::SetFilter { filter } => {
                self.settings.filter = filter;
                self.recompute(&*host, true);
                CommandOutcome::recomputed()
            }
            OverviewCommand::LabelsFetched { labels } => {
                self.labels = index_labels(labels);
                self.recompute(&*host, true);
                CommandOutcome::recomputed()
            }
            OverviewCommand::Choose { offset, choice } => self.choose(offset, choice),
            OverviewCommand::SelectAll => {
                self.selection.select_all();
                self.recompute(&*host, false);
                CommandOutcome {
                    toggle: Some(ToggleOutcome::Reset(self.rows.len())),
                    ..CommandOutcome::recomputed()
                }
            }
            OverviewCommand::DeselectAll => {
                let visible = self.aggregation.offsets();
                self.selection.deselect_all(&visible);
                self.recompute(&*host, false);
                CommandOutcome {
                    toggle: Some(ToggleOutcome::Deselected(visible.len())),
                    ..CommandOutcome::recomputed()
                }
            }
            OverviewCommand::ToggleAll => {
                let toggle = self.selection.toggle_all(&self.aggregation.offsets());
                info!(?toggle, "toggled label selection");
                self.recompute(&*host, false);
                CommandOutcome { toggle: Some(toggle), ..CommandOutcome::recomputed() }
            }
            OverviewCommand::Resolve { offset, label } => self.resolve(offset, label, &*host),
            OverviewCommand::Unresolve { offset } => self.unresolve(offset, &*host),
            OverviewCommand::ToggleResolution { offset } => {
                if self.resolutions.is_resolved(offset) {
                    self.unresolve(offset, &*host)
                } else {
                    self.resolve(offset, None, &*host)
                }
            }
            OverviewCommand::Jump { offset } => match host.jump_to(offset) {
                Ok(()) => CommandOutcome::default(),
                Err(err) => CommandOutcome::diagnostic(offset, err.to_string()),
            },
            OverviewCommand::Refresh => {
                self.recompute(&*host, true);
                CommandOutcome::recomputed()
            }
        };
        for diagnostic in &outcome.diagnostics {
            warn!(offset = diagnostic.offset, "{}", diagnostic.message);
        }
        outcome
    }

    fn choose(&mut self, offset: u64, choice: String) -> CommandOutcome {
        let Some(row) = self.rows.iter_mut().find(|row| row.offset == offset) else {
            return CommandOutcome::diagnostic(offset, "function is not displayed");
        };
        if choice != NO_CHOICE && !row.choices.contains(&choice) {
            return CommandOutcome::diagnostic(offset, format!("'{choice}' is not offered"));
        }
        row.displayed = choice;
        CommandOutcome::default()
    }

    fn resolve(
        &mut self,
        offset: u64,
        label: Option<String>,
        host: &dyn FunctionHost,
    ) -> CommandOutcome {
        let Some(row) = self.row(offset) else {
            return CommandOutcome::diagnostic(offset, "function is not displayed");
        };
        let label = match label {
            Some(label) if row.choices.contains(&label) => label,
            Some(label) => {
                return CommandOutcome::diagnostic(offset, format!("'{label}' is not offered"));
            }
            None => row.effective_selection().to_string(),
        };
        info!(offset, label = %label, "resolved function label");
        self.resolutions.resolve(offset, label);
        self.recompute(host, true);
        CommandOutcome::recomputed()
    }

    fn unresolve(&mut self, offset: u64, host: &dyn FunctionHost) -> CommandOutcome {
        if self.resolutions.unresolve(offset).is_none() {
            return CommandOutcome::diagnostic(offset, "function is not resolved");
        }
        info!(offset, "unresolved function label");
        self.recompute(host, true);
        CommandOutcome::recomputed()
    }

    /// Rename every visible default-named function to its selected label.
    ///
    /// Cleared rows are skipped; malformed selections are reported per row.
    /// When anything was renamed, the overview is recomputed since names feed
    /// into criticality.
    pub fn apply_selected_labels(
        &mut self,
        host: &mut dyn FunctionHost,
        dry_run: bool,
    ) -> ImportReport {
        let mut report = ImportReport::default();
        for row in &self.rows {
            let selection = row.effective_selection();
            if selection == NO_CHOICE {
                continue;
            }
            if selection == CLEARED_CHOICE {
                report.skipped += 1;
                continue;
            }
            let parsed = match parse_choice(selection) {
                Ok(parsed) => parsed,
                Err(err) => {
                    report.diagnostics.push(RowDiagnostic::new(row.offset, err.to_string()));
                    continue;
                }
            };
            let Some(current) = host.function_name(row.offset) else {
                report
                    .diagnostics
                    .push(RowDiagnostic::new(row.offset, "host has no function at this offset"));
                continue;
            };
            if !host.is_default_name(&current) {
                report.kept_custom += 1;
                continue;
            }
            if !dry_run {
                if let Err(err) = host.rename_function(row.offset, parsed.label) {
                    report.diagnostics.push(RowDiagnostic::new(row.offset, err.to_string()));
                    continue;
                }
            }
            report.applied.push((row.offset, parsed.label.to_string()));
        }
        for diagnostic in &report.diagnostics {
            warn!(offset = diagnostic.offset, "{}", diagnostic.message);
        }
        info!(
            applied = report.applied.len(),
            skipped = report.skipped,
            dry_run,
            "imported selected labels"
        );
        if !dry_run && !report.applied.is_empty() {
            self.recompute(&*host, true);
        }
        report
    }

    /// Full recomputation: reconcile displayed rows, aggregate, rebuild rows.
    fn recompute(&mut self, host: &dyn FunctionHost, track_selection: bool) {
        let threshold = self.settings.threshold;
        if track_selection {
            for row in &self.rows {
                self.selection.reconcile_row(row.offset, &row.displayed, threshold);
            }
        }

        let request = AggregationRequest {
            matches: &self.matches,
            labels: &self.labels,
            threshold,
            filter: self.settings.filter,
        };
        let aggregation = aggregate(&request, host, &self.resolutions);

        let labels_known = !self.labels.is_empty();
        let mut rows = Vec::with_capacity(aggregation.summaries.len());
        for summary in &aggregation.summaries {
            let mut choices = summary.ranked_choices();
            if labels_known && self.selection.invalidate_missing(summary.offset, &choices) {
                debug!(offset = summary.offset, "cleared selection no longer offered");
            }
            choices.push(CLEARED_CHOICE.to_string());

            // A resolution never falls back to another candidate.
            let preselected = match self.resolutions.resolved_label(summary.offset) {
                Some(pinned) if choices.iter().any(|c| c == pinned) => pinned.to_string(),
                Some(pinned) => {
                    debug!(offset = summary.offset, pinned, "resolved label not offered");
                    CLEARED_CHOICE.to_string()
                }
                None => match self.selection.get(summary.offset) {
                    Some(value) if choices.iter().any(|c| c == value) => value.to_string(),
                    _ => choices[0].clone(),
                },
            };
            let resolved = self.resolutions.is_resolved(summary.offset);
            rows.push(OverviewRow::from_summary(summary, choices, preselected, resolved));
        }

        self.aggregation = aggregation;
        self.rows = rows;
    }
}
