use serde::{Deserialize, Serialize};

use crate::services::filter::FilterMode;
use crate::services::host::DEFAULT_NAME_PATTERN;
use crate::services::session::OverviewSettings;

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Overview defaults applied when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// Floor of the score threshold range.
    pub min_score: i64,
    /// Start with the `labels` filter.
    pub filter_to_labels: bool,
    /// Start with the `conflicted` filter; wins over `filter_to_labels`.
    pub filter_to_conflicts: bool,
    /// Host pattern for auto-generated function names.
    pub default_name_pattern: String,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            min_score: 50,
            filter_to_labels: false,
            filter_to_conflicts: false,
            default_name_pattern: DEFAULT_NAME_PATTERN.to_string(),
        }
    }
}

impl OverviewConfig {
    pub fn initial_filter(&self) -> FilterMode {
        if self.filter_to_conflicts {
            FilterMode::Conflicted
        } else if self.filter_to_labels {
            FilterMode::Labels
        } else {
            FilterMode::None
        }
    }

    pub fn initial_settings(&self) -> OverviewSettings {
        OverviewSettings::new(self.min_score, self.initial_filter())
    }
}

/// Serializable configuration describing a triage project.
///
/// This lives at `.triage/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not binary version.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            overview: OverviewConfig::default(),
        }
    }
}
