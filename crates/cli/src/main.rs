use anyhow::Result;
use clap::{Parser, Subcommand};
use label_triage::commands::{
    apply_command, choose_command, import_labels_command, import_matches_command,
    import_names_command, init_project_command, overview_command, project_info_command,
    resolve_command, toggle_all_command,
};
use label_triage::{init_tracing, parse_filter, parse_offset};
use triage_core::services::filter::FilterMode;

/// Triage assistant for function-name suggestions from a similarity service.
///
/// This CLI is a thin wrapper around `triage-core` (exposed in code as `triage_core`).
/// Aggregation, classification and selection rules live in the library so they
/// can be tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "label-triage",
    version,
    about = "Aggregate function matches and triage their label suggestions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new project at the given root.
    ///
    /// Creates `.triage/project.json`, the project database and `reports/`.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show configuration, stored data counts and import history.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Replace stored match records with a JSON array of match records.
    ImportMatches {
        #[arg(long, default_value = ".")]
        root: String,

        /// JSON file (relative to the project root unless absolute).
        #[arg(long)]
        path: String,
    },

    /// Load labels for the matched functions from a JSON array of label records.
    ImportLabels {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        path: String,
    },

    /// Replace the host function name snapshot with a JSON array of `{offset, name}`.
    ImportNames {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        path: String,
    },

    /// Show aggregated functions with their criticality and label choices.
    Overview {
        #[arg(long, default_value = ".")]
        root: String,

        /// Minimum match score; clamped into the range observed in the data.
        #[arg(long)]
        threshold: Option<i64>,

        /// One of none, labels, applicable, conflicted.
        #[arg(long, value_parser = parse_filter)]
        filter: Option<FilterMode>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the JSON overview under `reports/`.
        #[arg(long, default_value_t = false)]
        report: bool,
    },

    /// Select one of the offered `score|label` choices for a function.
    Choose {
        #[arg(long, default_value = ".")]
        root: String,

        /// Function offset (0x-prefixed hex or decimal).
        #[arg(long, value_parser = parse_offset)]
        offset: u64,

        /// Choice string as listed by `overview`, or `-|-` to clear.
        #[arg(long)]
        choice: String,
    },

    /// Deselect all visible functions, or restore defaults if all are deselected.
    ToggleAll {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Toggle the manual resolution of a function.
    Resolve {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, value_parser = parse_offset)]
        offset: u64,

        /// Pin this `score|label` string instead of the current selection.
        #[arg(long)]
        label: Option<String>,
    },

    /// Rename default-named functions to their selected labels.
    Apply {
        #[arg(long, default_value = ".")]
        root: String,

        /// Report what would be renamed without changing anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::ImportMatches { root, path } => import_matches_command(&root, &path)?,
        Command::ImportLabels { root, path } => import_labels_command(&root, &path)?,
        Command::ImportNames { root, path } => import_names_command(&root, &path)?,
        Command::Overview { root, threshold, filter, json, report } => {
            overview_command(&root, threshold, filter, json, report)?
        }
        Command::Choose { root, offset, choice } => choose_command(&root, offset, &choice)?,
        Command::ToggleAll { root } => toggle_all_command(&root)?,
        Command::Resolve { root, offset, label } => resolve_command(&root, offset, label)?,
        Command::Apply { root, dry_run, json } => apply_command(&root, dry_run, json)?,
    }

    Ok(())
}
