use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use triage_core::db::{ImportKind, ImportRecord, ProjectContext};
use triage_core::services::session::RowDiagnostic;

use crate::{canonicalize_or_current, format_offset, sha256_file};

/// Resolve `root` and open its project (config + database).
pub fn open_context(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(&root_path)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Resolve an input file relative to the project root and make sure it exists.
pub fn resolve_input_path(root: &Path, path: &str) -> Result<PathBuf> {
    let input_path = Path::new(path);
    let abs_path =
        if input_path.is_absolute() { input_path.to_path_buf() } else { root.join(input_path) };
    if !abs_path.is_file() {
        return Err(anyhow!("Input file does not exist: {}", abs_path.display()));
    }
    Ok(abs_path)
}

/// Read a JSON array of records from disk.
pub fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse JSON records in {}", path.display()))
}

/// Record an import (hash + timestamp) in the project database.
pub fn record_import(
    ctx: &ProjectContext,
    kind: ImportKind,
    source: &Path,
    records: usize,
) -> Result<ImportRecord> {
    let record = ImportRecord {
        kind,
        source_path: source.display().to_string(),
        source_hash: Some(sha256_file(source)?),
        records,
        imported_at: Utc::now().to_rfc3339(),
    };
    ctx.db.insert_import(&record).context("Failed to record import")?;
    Ok(record)
}

/// Print per-row diagnostics to stderr.
pub fn print_diagnostics(diagnostics: &[RowDiagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("warning: {}: {}", format_offset(diagnostic.offset), diagnostic.message);
    }
}
