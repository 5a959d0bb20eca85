use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{ProjectConfig, ProjectLayout};
use crate::services::host::DefaultNamePattern;

/// Read `.triage/project.json` and check the overview settings it carries.
///
/// An unusable `default_name_pattern` is rejected here rather than on first use.
pub fn load_project_config(
    layout: &ProjectLayout,
) -> Result<(ProjectConfig, DefaultNamePattern)> {
    let raw = std::fs::read_to_string(&layout.project_config_path).with_context(|| {
        format!("Failed to read project config at {}", layout.project_config_path.display())
    })?;
    let config: ProjectConfig =
        serde_json::from_str(&raw).context("Failed to parse project config JSON")?;
    let pattern = DefaultNamePattern::new(&config.overview.default_name_pattern)
        .context("Invalid default_name_pattern in project config")?;
    Ok((config, pattern))
}

/// Database location named by `config`; relative paths hang off the project root.
pub fn resolve_db_path(layout: &ProjectLayout, config: &ProjectConfig) -> PathBuf {
    let configured = Path::new(&config.db.path);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        layout.root.join(configured)
    }
}
