//! One-shot conversion of the legacy flat JSON document into the store.
//!
//! # Responsibility
//! - Detect whether a legacy `{projects, notes}` document still needs to be
//!   imported and import it through `ImportExportGateway::bulk_replace`.
//! - Keep the legacy file untouched and leave a timestamped copy next to it.
//!
//! # Invariants
//! - Safe to run on every startup: once the store holds notes, projects or
//!   templates the legacy file is never read again.
//! - A legacy document without projects and notes never reaches
//!   `bulk_replace`.
//! - A parse failure never modifies the store or the legacy file.
//! - Templates are not recoverable from the legacy document and are always
//!   imported as an empty list.
//! - `run_startup_migration` never fails; callers continue regardless.

use crate::model::dataset::{DataSet, ImportSummary, ImportedNote, ImportedProject};
use crate::model::note::null_as_default;
use crate::model::timestamp::now_epoch_ms;
use crate::repo::count_rows;
use crate::service::error::StorageError;
use crate::service::storage_engine::Store;
use crate::service::transfer_service::ImportExportGateway;
use log::{error, info, warn};
use serde::Deserialize;
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Legacy document shape. Unknown top-level keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct LegacyDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    projects: Vec<ImportedProject>,
    #[serde(default, deserialize_with = "null_as_default")]
    notes: Vec<ImportedNote>,
}

/// Why a migration run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationSkipReason {
    /// The store already holds data; migration happened before.
    AlreadyMigrated {
        notes: i64,
        projects: i64,
        templates: i64,
    },
    /// No legacy document exists (fresh install).
    NoLegacyData,
    /// The legacy document holds no projects and no notes.
    EmptyLegacyData,
}

/// Result of one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Skipped(MigrationSkipReason),
    Migrated {
        summary: ImportSummary,
        /// `None` when the import succeeded but the backup copy failed.
        backup_path: Option<PathBuf>,
    },
}

/// Migration failure. Logged and non-fatal.
#[derive(Debug)]
pub enum MigrationError {
    Storage(StorageError),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "legacy import failed: {err}"),
            Self::Io { path, source } => {
                write!(f, "cannot read legacy data `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse legacy data `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl From<StorageError> for MigrationError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Migrates a legacy document at a fixed path into a store.
pub struct MigrationService<'store> {
    store: &'store Store,
    legacy_path: PathBuf,
}

impl<'store> MigrationService<'store> {
    pub fn new(store: &'store Store, legacy_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            legacy_path: legacy_path.into(),
        }
    }

    /// Runs the migration once.
    ///
    /// # Errors
    /// - `Io` / `Parse` when the legacy file exists but cannot be read; the
    ///   store is untouched.
    /// - `Storage` when schema setup or the bulk import fails; the import is
    ///   rolled back.
    pub fn run(&self) -> Result<MigrationOutcome, MigrationError> {
        self.store.initialize()?;

        let (notes, projects, templates) = self.store.with_connection(|conn| {
            Ok((
                count_rows(conn, "notes")?,
                count_rows(conn, "projects")?,
                count_rows(conn, "templates")?,
            ))
        })?;
        if notes > 0 || projects > 0 || templates > 0 {
            info!(
                "event=legacy_migration module=migration status=skip reason=already_migrated notes={} projects={} templates={}",
                notes, projects, templates
            );
            return Ok(MigrationOutcome::Skipped(
                MigrationSkipReason::AlreadyMigrated {
                    notes,
                    projects,
                    templates,
                },
            ));
        }

        if !self.legacy_path.exists() {
            info!("event=legacy_migration module=migration status=skip reason=no_legacy_data");
            return Ok(MigrationOutcome::Skipped(MigrationSkipReason::NoLegacyData));
        }

        let document = self.read_legacy_document()?;
        if document.projects.is_empty() && document.notes.is_empty() {
            info!("event=legacy_migration module=migration status=skip reason=empty_legacy_data");
            return Ok(MigrationOutcome::Skipped(
                MigrationSkipReason::EmptyLegacyData,
            ));
        }
        info!(
            "event=legacy_migration module=migration status=start projects={} notes={}",
            document.projects.len(),
            document.notes.len()
        );

        let payload = DataSet {
            projects: document.projects,
            notes: document.notes,
            templates: Vec::new(),
        };
        let summary = ImportExportGateway::new(self.store).bulk_replace(&payload)?;

        let backup_path = backup_path_for(&self.legacy_path, now_epoch_ms());
        let backup_path = match std::fs::copy(&self.legacy_path, &backup_path) {
            Ok(_) => {
                info!(
                    "event=legacy_backup module=migration status=ok path={}",
                    backup_path.display()
                );
                Some(backup_path)
            }
            Err(err) => {
                warn!(
                    "event=legacy_backup module=migration status=error path={} error={}",
                    backup_path.display(),
                    err
                );
                None
            }
        };

        Ok(MigrationOutcome::Migrated {
            summary,
            backup_path,
        })
    }

    fn read_legacy_document(&self) -> Result<LegacyDocument, MigrationError> {
        let raw = std::fs::read_to_string(&self.legacy_path).map_err(|source| {
            MigrationError::Io {
                path: self.legacy_path.clone(),
                source,
            }
        })?;
        serde_json::from_str(&raw).map_err(|source| MigrationError::Parse {
            path: self.legacy_path.clone(),
            source,
        })
    }
}

/// Startup migration result handed to the UI layer.
#[derive(Debug)]
pub struct StartupMigrationReport {
    pub outcome: Result<MigrationOutcome, MigrationError>,
    /// Blocking notice to show the developer; only set in debug builds when
    /// the migration failed.
    pub dev_notice: Option<String>,
}

/// Runs the migration as a best-effort startup step.
///
/// Never fails: errors are logged and returned inside the report so the
/// application can continue with whatever the store holds.
pub fn run_startup_migration(store: &Store, legacy_path: &Path) -> StartupMigrationReport {
    let started_at = Instant::now();
    let outcome = MigrationService::new(store, legacy_path).run();

    let dev_notice = match &outcome {
        Ok(_) => None,
        Err(err) => {
            error!(
                "event=legacy_migration module=migration status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            if cfg!(debug_assertions) {
                Some(format!("Data migration failed: {err}"))
            } else {
                None
            }
        }
    };

    StartupMigrationReport {
        outcome,
        dev_notice,
    }
}

/// Returns `<legacy-path>.backup-<epoch-millis>`.
pub fn backup_path_for(legacy_path: &Path, epoch_ms: i64) -> PathBuf {
    let mut raw = OsString::from(legacy_path.as_os_str());
    raw.push(format!(".backup-{epoch_ms}"));
    PathBuf::from(raw)
}
