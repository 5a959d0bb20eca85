use anyhow::{Context, Result};
use tracing::info;
use triage_core::db::{FunctionNameRecord, ImportKind};
use triage_core::model::{FunctionLabelRecord, FunctionMatchRecord};
use triage_core::services::source::StaticLabelSource;

use crate::commands::{
    open_context, print_diagnostics, read_json_records, record_import, resolve_input_path,
};

/// Replace the stored match records with the contents of a JSON file.
///
/// Selections and resolutions are kept; the next overview reconciles them.
pub fn import_matches_command(root: &str, path: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let source = resolve_input_path(&ctx.layout.root, path)?;
    let matches: Vec<FunctionMatchRecord> = read_json_records(&source)?;

    let count = ctx.db.replace_matches(&matches).context("Failed to store match records")?;
    record_import(&ctx, ImportKind::Matches, &source, count)?;
    info!(records = count, path = %source.display(), "imported match records");

    println!("Imported {count} match records from {}", source.display());
    Ok(())
}

/// Load label records for the matched functions from a JSON file.
///
/// Only labels attached to a matched remote function are kept. Selections
/// whose candidate disappears with the new labels are cleared.
pub fn import_labels_command(root: &str, path: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let source_path = resolve_input_path(&ctx.layout.root, path)?;
    let records: Vec<FunctionLabelRecord> = read_json_records(&source_path)?;
    let offered = records.len();

    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;
    let outcome = session
        .fetch_labels(&StaticLabelSource::new(records), &mut host)
        .context("Failed to load labels")?;
    print_diagnostics(&outcome.diagnostics);

    let kept: Vec<FunctionLabelRecord> = session.labels().values().flatten().cloned().collect();
    let count = ctx.db.replace_labels(&kept).context("Failed to store label records")?;
    ctx.save_session(&session)?;
    record_import(&ctx, ImportKind::Labels, &source_path, count)?;

    println!(
        "Imported {count} label records from {} ({} not attached to a matched function)",
        source_path.display(),
        offered.saturating_sub(count)
    );
    Ok(())
}

/// Replace the host function name snapshot with the contents of a JSON file.
pub fn import_names_command(root: &str, path: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let source = resolve_input_path(&ctx.layout.root, path)?;
    let names: Vec<FunctionNameRecord> = read_json_records(&source)?;

    let count = ctx.db.replace_function_names(&names).context("Failed to store function names")?;
    record_import(&ctx, ImportKind::Names, &source, count)?;
    info!(records = count, path = %source.display(), "imported function names");

    println!("Imported {count} function names from {}", source.display());
    Ok(())
}
