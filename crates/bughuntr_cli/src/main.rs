use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bughuntr_api::AppContext;
use bughuntr_core::{
    configured_log_level, init_logging, AppPaths, DataSet, ImportExportGateway, MigrationError,
    MigrationOutcome, MigrationSkipReason, StorageError,
};
use clap::{Parser, Subcommand};

/// bughuntr - maintenance tool for the BugHuntr note store
#[derive(Parser)]
#[command(name = "bughuntr")]
#[command(about = "Inspect, migrate, import and export a BugHuntr data directory")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to BUGHUNTR_DATA_DIR or the platform data dir)
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the legacy JSON migration and report its outcome
    Migrate,
    /// Print row counts per table
    Stats,
    /// Print every known tag name
    Tags,
    /// Write the complete dataset to a JSON file
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace the complete dataset with a JSON file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let paths = resolve_paths(cli.data_dir.as_deref())?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(configured_log_level);
    init_logging(&level, &paths.log_dir).context("Failed to initialize logging")?;

    let (context, report) = AppContext::start(paths).context("Failed to open store")?;
    if let Some(notice) = &report.dev_notice {
        eprintln!("[dev] {notice}");
    }

    match &cli.command {
        Commands::Migrate => print_migration(report.outcome),
        Commands::Stats => {
            let stats = context.store().stats().context("Failed to read stats")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Tags => {
            for tag in context
                .store()
                .list_distinct_tag_names()
                .context("Failed to list tags")?
            {
                println!("{tag}");
            }
            Ok(())
        }
        Commands::Export { file } => export_to(&context, file),
        Commands::Import { file } => import_from(&context, file),
    }
}

/// Builds the profile layout from `--data-dir` or the environment.
fn resolve_paths(data_dir: Option<&Path>) -> Result<AppPaths> {
    let paths = match data_dir {
        Some(dir) => AppPaths::from_data_dir(dir),
        None => AppPaths::resolve()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?,
    };
    if paths.data_dir.is_absolute() {
        return Ok(paths);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(AppPaths::from_data_dir(cwd.join(&paths.data_dir)))
}

fn print_migration(outcome: std::result::Result<MigrationOutcome, MigrationError>) -> Result<()> {
    match outcome.context("Legacy migration failed")? {
        MigrationOutcome::Skipped(MigrationSkipReason::NoLegacyData) => {
            println!("Nothing to migrate: no legacy data file");
        }
        MigrationOutcome::Skipped(MigrationSkipReason::EmptyLegacyData) => {
            println!("Nothing to migrate: legacy data file has no projects or notes");
        }
        MigrationOutcome::Skipped(MigrationSkipReason::AlreadyMigrated {
            notes,
            projects,
            templates,
        }) => {
            println!(
                "Already migrated ({notes} notes, {projects} projects, {templates} templates in store)"
            );
        }
        MigrationOutcome::Migrated {
            summary,
            backup_path,
        } => {
            println!(
                "Migrated {} projects, {} notes, {} tags",
                summary.projects, summary.notes, summary.tags
            );
            if summary.detached_notes > 0 {
                println!(
                    "{} notes referenced unknown projects and were detached",
                    summary.detached_notes
                );
            }
            match backup_path {
                Some(path) => println!("Backup written to {}", path.display()),
                None => println!("Warning: backup copy could not be written"),
            }
        }
    }
    Ok(())
}

fn export_to(context: &AppContext, file: &Path) -> Result<()> {
    let data = ImportExportGateway::new(context.store())
        .export_dataset()
        .context("Failed to export dataset")?;
    let json = serde_json::to_string_pretty(&data)?;
    std::fs::write(file, json)
        .with_context(|| format!("Failed to write export file: {}", file.display()))?;
    println!(
        "Exported {} projects, {} notes, {} templates to {}",
        data.projects.len(),
        data.notes.len(),
        data.templates.len(),
        file.display()
    );
    Ok(())
}

fn import_from(context: &AppContext, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let data: DataSet = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid import document: {}", file.display()))?;
    let summary = ImportExportGateway::new(context.store())
        .bulk_replace(&data)
        .context("Import failed; existing data was kept")?;
    println!(
        "Imported {} projects, {} notes, {} tags, {} templates",
        summary.projects, summary.notes, summary.tags, summary.templates
    );
    Ok(())
}

/// User errors are bad input files and rejected payloads; everything else
/// (store unavailable, I/O, SQLite) is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(err) = cause.downcast_ref::<StorageError>() {
            return matches!(err, StorageError::Validation(_) | StorageError::Constraint(_));
        }
        if let Some(err) = cause.downcast_ref::<std::io::Error>() {
            return err.kind() == std::io::ErrorKind::NotFound;
        }
        cause.is::<serde_json::Error>()
    })
}
