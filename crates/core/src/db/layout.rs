use std::path::{Path, PathBuf};

/// Where a triage project keeps its files, relative to one root directory.
///
/// Pure path arithmetic; `init-project` creates what this describes.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    /// `.triage/`, holding config and database.
    pub meta_dir: PathBuf,
    /// `.triage/project.json`
    pub project_config_path: PathBuf,
    /// `.triage/project.db`: matches, labels, names and analyst state.
    pub db_path: PathBuf,
    /// `reports/`: exported overview snapshots.
    pub reports_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".triage");
        let project_config_path = meta_dir.join("project.json");
        let db_path = meta_dir.join("project.db");
        let reports_dir = root.join("reports");

        Self { root, meta_dir, project_config_path, db_path, reports_dir }
    }

    /// Database path as written into `project.json`: root-relative when possible.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// Path of a timestamped report file under `reports/`.
    pub fn report_path(&self, stem: &str, stamp: &str) -> PathBuf {
        self.reports_dir.join(format!("{stem}-{stamp}.json"))
    }
}
