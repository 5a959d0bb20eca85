//! Match aggregation: raw match records -> per-local-function summaries.
//!
//! Grouping runs in two passes. The first folds every record that clears the
//! score threshold (and the label pre-filter) into a summary keyed by local
//! function id. The second classifies each summary and, for the
//! criticality-driven filter modes, drops summaries below the mode's floor.
//! Output is ordered by ascending local function id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{AggregatedFunctionSummary, FunctionMatchRecord, LabelCandidate};
use crate::services::criticality::classify;
use crate::services::filter::{passes_record, passes_summary, FilterMode};
use crate::services::host::FunctionHost;
use crate::services::resolution::ResolutionStore;
use crate::services::source::LabelIndex;

/// Inputs of one recomputation.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRequest<'a> {
    pub matches: &'a [FunctionMatchRecord],
    pub labels: &'a LabelIndex,
    pub threshold: i64,
    pub filter: FilterMode,
}

/// Before/after counters shown next to the overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounters {
    /// Distinct local functions over all match records.
    pub functions_total: usize,
    /// Distinct remote functions over all match records.
    pub remote_functions_total: usize,
    pub matches_total: usize,
    pub functions_shown: usize,
    pub matches_shown: usize,
    pub labels_shown: usize,
}

impl AggregateCounters {
    pub fn functions_filtered(&self) -> usize {
        self.functions_total.saturating_sub(self.functions_shown)
    }

    pub fn matches_filtered(&self) -> usize {
        self.matches_total.saturating_sub(self.matches_shown)
    }

    /// One-line human summary.
    pub fn summary_line(&self) -> String {
        format!(
            "Showing {} functions with {} matches and {} labels ({} functions and {} matches filtered)",
            self.functions_shown,
            self.matches_shown,
            self.labels_shown,
            self.functions_filtered(),
            self.matches_filtered()
        )
    }
}

/// Output of one recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub summaries: Vec<AggregatedFunctionSummary>,
    pub counters: AggregateCounters,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn find_by_offset(&self, offset: u64) -> Option<&AggregatedFunctionSummary> {
        self.summaries.iter().find(|s| s.offset == offset)
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.summaries.iter().map(|s| s.offset).collect()
    }
}

/// Valid score threshold interval for a loaded match set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub lower: i64,
    pub upper: i64,
}

impl ThresholdRange {
    /// Derive the range from the observed scores, raising the floor to `min_score`.
    ///
    /// Scores are truncated to integers; the upper bound never drops below
    /// the lower one.
    pub fn from_matches(matches: &[FunctionMatchRecord], min_score: i64) -> Self {
        if matches.is_empty() {
            return Self { lower: min_score, upper: min_score };
        }
        let mut observed_min = 100_i64;
        let mut observed_max = 0_i64;
        for record in matches {
            let score = record.matched_score.trunc() as i64;
            observed_min = observed_min.min(score);
            observed_max = observed_max.max(score);
        }
        let lower = min_score.max(observed_min);
        Self { lower, upper: observed_max.max(lower) }
    }

    pub fn clamp(&self, threshold: i64) -> i64 {
        threshold.clamp(self.lower, self.upper)
    }

    pub fn contains(&self, threshold: i64) -> bool {
        (self.lower..=self.upper).contains(&threshold)
    }
}

/// Group, classify and filter match records.
///
/// Reads the resolution store and the host's naming facts; mutates nothing.
/// Criticality-0 summaries are dropped only by `applicable` and `conflicted`,
/// so `none` (and `labels`) keep bare matches.
pub fn aggregate(
    request: &AggregationRequest<'_>,
    host: &dyn FunctionHost,
    resolutions: &ResolutionStore,
) -> Aggregation {
    let matches = request.matches;
    if matches.is_empty() {
        return Aggregation::default();
    }

    let mut remote_per_local: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
    let mut remote_functions: BTreeSet<u64> = BTreeSet::new();
    let mut grouped: BTreeMap<u64, AggregatedFunctionSummary> = BTreeMap::new();
    let mut matches_shown = 0usize;

    for record in matches {
        remote_per_local
            .entry(record.local_function_id)
            .or_default()
            .insert(record.matched_function_id);
        remote_functions.insert(record.matched_function_id);

        let labels = request.labels.get(&record.matched_function_id).filter(|l| !l.is_empty());
        if !passes_record(request.filter, request.threshold, record, labels.is_some()) {
            continue;
        }
        matches_shown += 1;

        let summary = grouped
            .entry(record.local_function_id)
            .or_insert_with(|| {
                AggregatedFunctionSummary::new(record.local_function_id, record.local_offset)
            });
        summary.families.insert(record.matched_family_id);
        summary.samples.insert(record.matched_sample_id);
        summary.functions.insert(record.matched_function_id);
        if record.is_library_match {
            summary.library_matches.insert(record.matched_function_id);
        }
        let score = record.matched_score.trunc() as i64;
        for label in labels.into_iter().flatten() {
            summary.labels.insert(
                LabelCandidate::new(score, label.label_text.clone())
                    .with_contributor(label.username.clone(), label.timestamp.clone()),
            );
        }
    }

    let mut counters = AggregateCounters {
        functions_total: remote_per_local.len(),
        remote_functions_total: remote_functions.len(),
        matches_total: matches.len(),
        functions_shown: grouped.len(),
        matches_shown,
        labels_shown: request.labels.values().map(Vec::len).sum(),
    };

    let mut summaries = Vec::with_capacity(grouped.len());
    for (_, mut summary) in grouped {
        summary.criticality = classify(
            summary.ranked_labels(),
            host.has_custom_name(summary.offset),
            resolutions.is_resolved(summary.offset),
        );
        if request.filter.is_post_filter()
            && (summary.criticality.level() == 0 || !passes_summary(request.filter, &summary))
        {
            continue;
        }
        summaries.push(summary);
    }

    if request.filter.is_post_filter() {
        counters.functions_shown = summaries.len();
        counters.matches_shown = summaries.iter().map(|s| s.functions.len()).sum();
        counters.labels_shown = summaries.iter().map(|s| s.labels.len()).sum();
    }

    debug!(
        threshold = request.threshold,
        filter = %request.filter,
        shown = counters.functions_shown,
        total = counters.functions_total,
        "aggregated function matches"
    );

    Aggregation { summaries, counters }
}
