use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;
use triage_core::db::{ImportRecord, OverviewConfig, ProjectConfig, ProjectDb, ProjectLayout};

use crate::commands::{open_context, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub overview: OverviewConfig,
    pub layout: ProjectInfoLayout,
    pub counts: ProjectCounts,
    pub imports: Vec<ImportRecord>,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub reports_dir: String,
}

#[derive(Serialize)]
pub struct ProjectCounts {
    pub matches: usize,
    pub labels: usize,
    pub function_names: usize,
    pub selections: usize,
    pub resolutions: usize,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the database right away so later commands can rely on it.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized label triage project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let counts = ProjectCounts {
        matches: ctx.db.list_matches().context("Failed to list matches")?.len(),
        labels: ctx.db.list_labels().context("Failed to list labels")?.len(),
        function_names: ctx.db.list_function_names().context("Failed to list names")?.len(),
        selections: ctx.db.load_selection().context("Failed to load selections")?.len(),
        resolutions: ctx.db.load_resolutions().context("Failed to load resolutions")?.len(),
    };
    let imports = ctx.db.list_imports(None).context("Failed to list imports")?;
    let layout = &ctx.layout;
    let config = &ctx.config;

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: config.name.clone(),
            root: layout.root.display().to_string(),
            config_file: layout.project_config_path.display().to_string(),
            config_version: config.config_version.clone(),
            db_path: config.db.path.clone(),
            overview: config.overview.clone(),
            layout: ProjectInfoLayout {
                meta_dir: layout.meta_dir.display().to_string(),
                reports_dir: layout.reports_dir.display().to_string(),
            },
            counts,
            imports,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Label Triage Project Info");
    println!("=========================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    println!("Config file: {}", layout.project_config_path.display());
    println!("Config version: {}", config.config_version);
    println!("DB path (config): {}", config.db.path);
    println!("Minimum score: {}", config.overview.min_score);
    println!("Initial filter: {}", config.overview.initial_filter());
    println!("Default name pattern: {}", config.overview.default_name_pattern);
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.triage)", &layout.meta_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();

    println!("Matches: {}", counts.matches);
    println!("Labels: {}", counts.labels);
    println!("Function names: {}", counts.function_names);
    println!("Selections: {}", counts.selections);
    println!("Resolutions: {}", counts.resolutions);
    if !imports.is_empty() {
        println!("\nImports:");
        for import in imports {
            println!(
                "- {} [{}] {} records at {}",
                import.source_path,
                import.kind.as_str(),
                import.records,
                import.imported_at
            );
        }
    }

    Ok(())
}
