use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{load_project_config, resolve_db_path, ProjectConfig, ProjectDb, ProjectLayout};
use crate::services::host::{DefaultNamePattern, InMemoryHost};
use crate::services::session::{OverviewCommand, OverviewSession};

/// An opened triage project: validated config plus its database.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub name_pattern: DefaultNamePattern,
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    /// Load and validate the project config, then open its database.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, name_pattern) = load_project_config(&layout)?;
        let db_path = resolve_db_path(&layout, &config);
        let db = ProjectDb::open(&db_path)
            .with_context(|| format!("Failed to open project database at {}", db_path.display()))?;
        Ok(Self { layout, config, name_pattern, db_path, db })
    }

    /// Host over the stored function name snapshot, using the configured
    /// default-name pattern.
    pub fn load_host(&self) -> Result<InMemoryHost> {
        let names = self.db.list_function_names().context("Failed to load function names")?;
        let host = InMemoryHost::new(self.name_pattern.clone());
        Ok(host.with_names(names.into_iter().map(|n| (n.offset, n.name))))
    }

    /// Rebuild the overview session from stored data and analyst state.
    ///
    /// Replays the same inputs a live session would have seen: matches, then
    /// labels, then the last threshold.
    pub fn load_session(&self, host: &mut InMemoryHost) -> Result<OverviewSession> {
        let stored = self.db.load_settings().context("Failed to load session settings")?;
        let mut settings = self.config.overview.initial_settings();
        if let Some(filter) = stored.filter {
            settings.filter = filter;
        }
        let selection = self.db.load_selection().context("Failed to load selections")?;
        let resolutions = self.db.load_resolutions().context("Failed to load resolutions")?;
        let mut session = OverviewSession::new(settings).with_state(selection, resolutions);

        let matches = self.db.list_matches().context("Failed to load match records")?;
        session.load_matches(matches, &*host);
        let labels = self.db.list_labels().context("Failed to load label records")?;
        if !labels.is_empty() {
            session.handle(OverviewCommand::LabelsFetched { labels }, &mut *host);
        }
        if let Some(threshold) = stored.threshold {
            session.handle(OverviewCommand::SetThreshold { threshold }, &mut *host);
        }
        Ok(session)
    }

    /// Persist threshold, filter, selections and resolutions of `session`.
    pub fn save_session(&mut self, session: &OverviewSession) -> Result<()> {
        let settings = session.settings();
        self.db
            .save_settings(settings.threshold, settings.filter)
            .context("Failed to save session settings")?;
        self.db.save_selection(session.selection()).context("Failed to save selections")?;
        self.db.save_resolutions(session.resolutions()).context("Failed to save resolutions")?;
        Ok(())
    }

    /// Write renamed functions from `host` back into the name snapshot.
    pub fn save_renames(&self, host: &InMemoryHost) -> Result<()> {
        for (offset, name) in host.renamed() {
            self.db
                .set_function_name(*offset, name)
                .with_context(|| format!("Failed to store new name for 0x{offset:x}"))?;
        }
        Ok(())
    }
}
