use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use triage_core::services::aggregator::{AggregateCounters, ThresholdRange};
use triage_core::services::filter::FilterMode;
use triage_core::services::session::{OverviewCommand, OverviewRow, OverviewSession};

use crate::commands::{open_context, print_diagnostics};
use crate::format_offset;

/// Machine-readable overview, as printed by `overview --json`.
#[derive(Serialize)]
pub struct OverviewSnapshot<'a> {
    pub threshold: i64,
    pub threshold_range: ThresholdRange,
    pub filter: FilterMode,
    pub summary: String,
    pub counters: &'a AggregateCounters,
    pub rows: &'a [OverviewRow],
}

impl<'a> OverviewSnapshot<'a> {
    pub fn from_session(session: &'a OverviewSession) -> Self {
        let settings = session.settings();
        Self {
            threshold: settings.threshold,
            threshold_range: session.threshold_range(),
            filter: settings.filter,
            summary: session.counters().summary_line(),
            counters: session.counters(),
            rows: session.rows(),
        }
    }
}

/// Show the aggregated overview, optionally changing threshold and filter first.
///
/// The resulting threshold and filter are remembered for the next command.
pub fn overview_command(
    root: &str,
    threshold: Option<i64>,
    filter: Option<FilterMode>,
    json: bool,
    report: bool,
) -> Result<()> {
    let mut ctx = open_context(root)?;
    let mut host = ctx.load_host()?;
    let mut session = ctx.load_session(&mut host)?;

    if let Some(filter) = filter {
        let outcome = session.handle(OverviewCommand::SetFilter { filter }, &mut host);
        print_diagnostics(&outcome.diagnostics);
    }
    if let Some(threshold) = threshold {
        let range = session.threshold_range();
        if !range.contains(threshold) {
            eprintln!(
                "warning: threshold {threshold} outside {}..={}, clamped",
                range.lower, range.upper
            );
        }
        let outcome = session.handle(OverviewCommand::SetThreshold { threshold }, &mut host);
        print_diagnostics(&outcome.diagnostics);
    }
    ctx.save_session(&session)?;

    let snapshot = OverviewSnapshot::from_session(&session);
    if report {
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let path = ctx.layout.report_path("overview", &stamp);
        fs::create_dir_all(&ctx.layout.reports_dir).with_context(|| {
            format!("Failed to create reports dir: {}", ctx.layout.reports_dir.display())
        })?;
        fs::write(&path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("Failed to write overview report {}", path.display()))?;
        eprintln!("Wrote overview report to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "Threshold: {} (range {}..={}), filter: {}",
        snapshot.threshold, snapshot.threshold_range.lower, snapshot.threshold_range.upper,
        snapshot.filter
    );
    println!("{}", snapshot.summary);
    if snapshot.rows.is_empty() {
        println!("  (no functions)");
        return Ok(());
    }
    for row in snapshot.rows {
        print_row(row);
    }

    Ok(())
}

fn print_row(row: &OverviewRow) {
    let mut flags = Vec::new();
    if row.is_library {
        flags.push("library");
    }
    if row.resolved {
        flags.push("resolved");
    }
    let flags = if flags.is_empty() { String::new() } else { format!(" [{}]", flags.join(", ")) };
    println!(
        "  {} crit={} families={} samples={} functions={} selected={}{}",
        format_offset(row.offset),
        row.criticality.level(),
        row.families,
        row.samples,
        row.functions,
        row.preselected,
        flags
    );
    let alternatives: Vec<&str> =
        row.choices.iter().map(String::as_str).filter(|c| *c != row.preselected).collect();
    if !alternatives.is_empty() {
        println!("      choices: {}", alternatives.join(", "));
    }
}
