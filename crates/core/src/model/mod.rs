//! Core data model for match triage.
//!
//! This module contains:
//! - Raw records supplied by the remote matching service (matches, labels)
//! - Derived label candidates and per-function aggregated summaries
//! - The criticality scale used to rank naming suggestions

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Selection sentinel meaning "no explicit choice yet, use the default".
pub const NO_CHOICE: &str = "-";

/// Selection sentinel meaning "explicitly cleared by the analyst".
pub const CLEARED_CHOICE: &str = "-|-";

/// One observed similarity link between a local function and a remote function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMatchRecord {
    pub local_function_id: u64,
    /// Address of the local function in the analyzed binary.
    pub local_offset: u64,
    pub matched_family_id: u64,
    pub matched_sample_id: u64,
    pub matched_function_id: u64,
    /// Similarity score, usually 0..=100; values above 100 mark special matches.
    pub matched_score: f64,
    #[serde(default)]
    pub is_library_match: bool,
}

/// A human-contributed name suggestion attached to a remote function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionLabelRecord {
    /// Remote function id; joins against `FunctionMatchRecord::matched_function_id`.
    pub function_id: u64,
    pub label_text: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub timestamp: String,
}

/// A label suggestion as seen from one local function.
///
/// Field order matters: the derived ordering sorts by score, then label text,
/// then contributor, which is what ranking relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelCandidate {
    /// Match score truncated to an integer.
    pub score: i64,
    pub label_text: String,
    pub username: String,
    pub timestamp: String,
}

impl LabelCandidate {
    pub fn new(score: i64, label_text: impl Into<String>) -> Self {
        Self { score, label_text: label_text.into(), username: String::new(), timestamp: String::new() }
    }

    /// Builder-style helper to attach contributor details.
    pub fn with_contributor(mut self, username: impl Into<String>, timestamp: impl Into<String>) -> Self {
        self.username = username.into();
        self.timestamp = timestamp.into();
        self
    }

    /// Candidate string as offered to the analyst: `"{score}|{label_text}"`.
    pub fn formatted(&self) -> String {
        format_choice(self.score, &self.label_text)
    }
}

/// Format a `score|label` choice string.
pub fn format_choice(score: i64, label_text: &str) -> String {
    format!("{score}|{label_text}")
}

/// How urgently a local function's naming suggestion needs analyst attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Criticality {
    /// No label candidates at all.
    NoSignal,
    /// The local function already carries a custom name.
    Named,
    /// The analyst pinned a label manually.
    Resolved,
    /// Candidates exist and agree.
    Unresolved,
    /// Candidates disagree on the label text.
    Disagreement,
    /// Candidates sharing the top score disagree.
    Conflict,
}

impl Criticality {
    /// Numeric level in `0..=5`.
    pub fn level(self) -> u8 {
        match self {
            Criticality::NoSignal => 0,
            Criticality::Named => 1,
            Criticality::Resolved => 2,
            Criticality::Unresolved => 3,
            Criticality::Disagreement => 4,
            Criticality::Conflict => 5,
        }
    }

    /// Decode a numeric level; anything above 5 saturates to `Conflict`.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Criticality::NoSignal,
            1 => Criticality::Named,
            2 => Criticality::Resolved,
            3 => Criticality::Unresolved,
            4 => Criticality::Disagreement,
            _ => Criticality::Conflict,
        }
    }

    /// Raise the level by one step, saturating at `Conflict`.
    pub fn escalate(self) -> Self {
        Criticality::from_level(self.level().saturating_add(1))
    }
}

impl From<Criticality> for u8 {
    fn from(value: Criticality) -> Self {
        value.level()
    }
}

impl TryFrom<u8> for Criticality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 5 {
            return Err(format!("criticality level {value} out of range 0..=5"));
        }
        Ok(Criticality::from_level(value))
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Per-local-function view over all matches that survived filtering.
///
/// Rebuilt from scratch on every recomputation; sets are ordered so the
/// serialized form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedFunctionSummary {
    pub local_function_id: u64,
    pub offset: u64,
    pub families: BTreeSet<u64>,
    pub samples: BTreeSet<u64>,
    pub functions: BTreeSet<u64>,
    pub library_matches: BTreeSet<u64>,
    pub labels: BTreeSet<LabelCandidate>,
    pub criticality: Criticality,
}

impl AggregatedFunctionSummary {
    pub fn new(local_function_id: u64, offset: u64) -> Self {
        Self {
            local_function_id,
            offset,
            families: BTreeSet::new(),
            samples: BTreeSet::new(),
            functions: BTreeSet::new(),
            library_matches: BTreeSet::new(),
            labels: BTreeSet::new(),
            criticality: Criticality::NoSignal,
        }
    }

    /// Candidates ordered by score descending, then label text descending.
    pub fn ranked_labels(&self) -> Vec<&LabelCandidate> {
        self.labels.iter().rev().collect()
    }

    /// Distinct `score|label` strings in rank order.
    ///
    /// The same pair from several contributors is offered once.
    pub fn ranked_choices(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for candidate in self.ranked_labels() {
            let choice = candidate.formatted();
            if out.last() != Some(&choice) {
                out.push(choice);
            }
        }
        out
    }

    pub fn is_library(&self) -> bool {
        !self.library_matches.is_empty()
    }
}
