use anyhow::{bail, Result};
use serde::Serialize;
use triage_core::services::selection::ToggleOutcome;
use triage_core::services::session::{ImportReport, OverviewCommand};

use crate::commands::{open_context, print_diagnostics};
use crate::format_offset;

/// Pick one of a row's offered choices (or `-|-` to clear it).
pub fn choose_command(root: &str, offset: u64, choice: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;

    let outcome = session
        .handle(OverviewCommand::Choose { offset, choice: choice.to_string() }, &mut host);
    if let Some(diagnostic) = outcome.diagnostics.first() {
        bail!("Cannot choose for {}: {}", format_offset(offset), diagnostic.message);
    }
    // Recompute so the displayed choice is folded into the stored selection.
    session.handle(OverviewCommand::Refresh, &mut host);
    ctx.save_session(&session)?;

    println!("Selected {choice} for {}", format_offset(offset));
    Ok(())
}

/// Deselect every visible row, or restore defaults when all are already cleared.
pub fn toggle_all_command(root: &str) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;

    let outcome = session.handle(OverviewCommand::ToggleAll, &mut host);
    ctx.save_session(&session)?;

    match outcome.toggle {
        Some(ToggleOutcome::Deselected(count)) => println!("Deselected {count} functions"),
        Some(ToggleOutcome::Reset(count)) => {
            println!("Restored default selection for {count} functions")
        }
        None => println!("Nothing to toggle"),
    }
    Ok(())
}

/// Toggle the resolution of a row, or pin an explicit label.
pub fn resolve_command(root: &str, offset: u64, label: Option<String>) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;

    let command = match label {
        Some(label) => OverviewCommand::Resolve { offset, label: Some(label) },
        None => OverviewCommand::ToggleResolution { offset },
    };
    let outcome = session.handle(command, &mut host);
    if let Some(diagnostic) = outcome.diagnostics.first() {
        bail!("Cannot resolve {}: {}", format_offset(offset), diagnostic.message);
    }
    ctx.save_session(&session)?;

    match session.resolutions().resolved_label(offset) {
        Some(label) => println!("Resolved {} as {label}", format_offset(offset)),
        None => println!("Unresolved {}", format_offset(offset)),
    }
    Ok(())
}

#[derive(Serialize)]
struct ApplySummary<'a> {
    dry_run: bool,
    #[serde(flatten)]
    report: &'a ImportReport,
}

/// Rename default-named functions to their selected labels.
pub fn apply_command(root: &str, dry_run: bool, json: bool) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;

    let report = session.apply_selected_labels(&mut host, dry_run);
    if !dry_run {
        ctx.save_renames(&host)?;
        ctx.save_session(&session)?;
    }

    if json {
        let summary = ApplySummary { dry_run, report: &report };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_diagnostics(&report.diagnostics);
    let verb = if dry_run { "Would rename" } else { "Renamed" };
    for (offset, name) in &report.applied {
        println!("{verb} {} -> {name}", format_offset(*offset));
    }
    println!(
        "{} applied, {} skipped, {} kept custom names, {} errors",
        report.applied.len(),
        report.skipped,
        report.kept_custom,
        report.diagnostics.len()
    );
    Ok(())
}
