//! Project database integration and project layout definitions.
//!
//! A triage project keeps, under `.triage/`:
//! - `project.json`: `ProjectConfig`, including overview defaults.
//! - `project.db`: imported matches, labels and host function names, plus the
//!   analyst's session state (threshold, filter, selections, resolutions).

mod config;
mod context;
mod layout;
mod models;
mod project_db;
mod util;

pub use config::{DbConfig, OverviewConfig, ProjectConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{FunctionNameRecord, ImportKind, ImportRecord};
pub use project_db::{DbError, DbResult, ProjectDb, StoredSettings, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, resolve_db_path};
