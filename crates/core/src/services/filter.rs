//! Score-threshold and categorical filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AggregatedFunctionSummary, Criticality, FunctionMatchRecord};

/// Categorical filter applied to the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Show every match above the threshold.
    #[default]
    None,
    /// Only matches whose remote function carries at least one label.
    Labels,
    /// Only functions with criticality >= 2.
    Applicable,
    /// Only functions with criticality >= 4.
    Conflicted,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown filter mode '{0}' (expected none, labels, applicable, conflicted)")]
pub struct UnknownFilterMode(pub String);

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::None => "none",
            FilterMode::Labels => "labels",
            FilterMode::Applicable => "applicable",
            FilterMode::Conflicted => "conflicted",
        }
    }

    /// Whether raw records without labels are dropped while grouping.
    pub fn requires_labels(&self) -> bool {
        !matches!(self, FilterMode::None)
    }

    /// Whether the mode is decided on the aggregate rather than the raw record.
    pub fn is_post_filter(&self) -> bool {
        matches!(self, FilterMode::Applicable | FilterMode::Conflicted)
    }

    /// Minimum criticality a summary needs under this mode.
    pub fn min_criticality(&self) -> Criticality {
        match self {
            FilterMode::None | FilterMode::Labels => Criticality::NoSignal,
            FilterMode::Applicable => Criticality::Resolved,
            FilterMode::Conflicted => Criticality::Disagreement,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = UnknownFilterMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FilterMode::None),
            "labels" => Ok(FilterMode::Labels),
            "applicable" => Ok(FilterMode::Applicable),
            "conflicted" => Ok(FilterMode::Conflicted),
            other => Err(UnknownFilterMode(other.to_string())),
        }
    }
}

/// Pre-filter for a raw record: score threshold plus the label requirement.
pub fn passes_record(
    mode: FilterMode,
    threshold: i64,
    record: &FunctionMatchRecord,
    has_labels: bool,
) -> bool {
    if record.matched_score < threshold as f64 {
        return false;
    }
    !(mode.requires_labels() && !has_labels)
}

/// Post-filter for an aggregated summary.
pub fn passes_summary(mode: FilterMode, summary: &AggregatedFunctionSummary) -> bool {
    summary.criticality >= mode.min_criticality()
}
