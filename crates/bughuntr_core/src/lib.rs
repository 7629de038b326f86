//! Core storage engine for BugHuntr.
//! This crate is the single source of truth for persistence invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{configured_log_level, AppPaths};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::dataset::{DataSet, ImportSummary, ImportedNote, ImportedProject, ImportedTemplate};
pub use model::note::{Note, NoteDraft, NoteId, UNTITLED_NOTE_TITLE};
pub use model::project::{Project, ProjectDraft, ProjectId};
pub use model::template::{Template, TemplateDraft, DEFAULT_TEMPLATE_CATEGORY};
pub use model::validation::ValidationError;
pub use service::error::{StorageError, StorageResult};
pub use service::migration_service::{
    run_startup_migration, MigrationError, MigrationOutcome, MigrationService,
    MigrationSkipReason, StartupMigrationReport,
};
pub use service::storage_engine::{Store, StoreStats};
pub use service::transfer_service::ImportExportGateway;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
