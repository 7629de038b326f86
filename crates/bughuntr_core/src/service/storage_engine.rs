//! Storage engine: the single entry point for reads and writes.
//!
//! # Responsibility
//! - Own the one SQLite connection of the process behind a mutex.
//! - Install the schema exactly once per handle before any other statement.
//! - Run every multi-row write inside a scoped transaction that commits only
//!   on success.
//!
//! # Invariants
//! - At most one transaction is open at a time: every operation, read or
//!   write, holds the connection lock for its whole duration. Reads therefore
//!   only ever observe committed state.
//! - A `save_note` replaces the complete tag set of the note atomically.
//! - Timestamps are stamped here, never taken from callers.
//! - Deleting a project detaches its notes (`project_id` becomes `NULL`).

use crate::db::schema::{apply_schema, TABLES};
use crate::db::{open_connection, open_connection_in_memory};
use crate::model::note::{Note, NoteDraft};
use crate::model::project::{Project, ProjectDraft};
use crate::model::template::{Template, TemplateDraft};
use crate::model::timestamp::{now_epoch_ms, EpochMillis};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::tag_repo::{normalize_tags, SqliteTagRepository, TagRepository};
use crate::repo::template_repo::{SqliteTemplateRepository, TemplateRepository};
use crate::repo::count_rows;
use crate::service::error::{StorageError, StorageResult};
use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

/// Row counts per engine-owned table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub projects: i64,
    pub notes: i64,
    pub tags: i64,
    pub note_tags: i64,
    pub templates: i64,
}

/// Shared storage handle. Construct once at startup and share via `Arc`.
pub struct Store {
    conn: Mutex<Connection>,
    schema_ready: OnceCell<()>,
}

impl Store {
    /// Opens (or creates) the store file. The schema is installed lazily by
    /// `initialize`, which every operation calls first.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = open_connection(path).map_err(StorageError::Connection)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = open_connection_in_memory().map_err(StorageError::Connection)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            schema_ready: OnceCell::new(),
        }
    }

    /// Ensures the relational schema exists.
    ///
    /// Safe to call any number of times from any number of threads: the
    /// installer runs at most once successfully per handle, concurrent callers
    /// wait for it, and a failed attempt is retried by the next caller.
    pub fn initialize(&self) -> StorageResult<()> {
        self.schema_ready.get_or_try_init(|| {
            let started_at = Instant::now();
            let mut conn = self.lock()?;
            match apply_schema(&mut conn) {
                Ok(created) => {
                    info!(
                        "event=schema_init module=storage status=ok created={} duration_ms={}",
                        created,
                        started_at.elapsed().as_millis()
                    );
                    Ok(())
                }
                Err(err) => {
                    error!(
                        "event=schema_init module=storage status=error duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                    Err(StorageError::Connection(err))
                }
            }
        })?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Runs `f` against the connection without opening a transaction.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        self.initialize()?;
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside an IMMEDIATE transaction.
    ///
    /// Commits only when `f` returns `Ok`; any error (or panic) drops the
    /// transaction, which rolls it back.
    pub(crate) fn write_transaction<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Transaction<'_>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        self.initialize()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                drop(tx);
                warn!(
                    "event=tx_rollback module=storage status=error operation={} error_code={} error={}",
                    operation,
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Lists projects, most recently updated first.
    pub fn list_projects(&self) -> StorageResult<Vec<Project>> {
        self.with_connection(|conn| Ok(SqliteProjectRepository::new(conn).list_projects()?))
    }

    /// Gets one project by id.
    pub fn get_project(&self, id: &str) -> StorageResult<Option<Project>> {
        self.with_connection(|conn| Ok(SqliteProjectRepository::new(conn).get_project(id)?))
    }

    /// Creates or updates one project.
    ///
    /// # Errors
    /// - `Validation` when the name is blank; storage is not touched.
    pub fn save_project(&self, draft: ProjectDraft) -> StorageResult<Project> {
        draft.validate()?;
        let now = now_epoch_ms();
        let id = draft.existing_id().unwrap_or_else(new_entity_id);

        let project = self.write_transaction("save_project", |tx| {
            let repo = SqliteProjectRepository::new(tx);
            repo.upsert_project(&Project {
                id: id.clone(),
                name: draft.name.trim().to_string(),
                url: crate::model::non_blank(draft.url.as_deref()),
                scope: crate::model::non_blank(draft.scope.as_deref()),
                created_at: now,
                updated_at: now,
            })?;
            repo.get_project(&id)?.ok_or_else(|| {
                StorageError::InvalidData(format!("project {id} missing after save"))
            })
        })?;

        debug!(
            "event=project_save module=storage status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Deletes one project and detaches its notes.
    ///
    /// Returns `false` when no project had this id.
    pub fn delete_project(&self, id: &str) -> StorageResult<bool> {
        let removed = self.write_transaction("delete_project", |tx| {
            Ok(SqliteProjectRepository::new(tx).delete_project(id)?)
        })?;
        info!(
            "event=project_delete module=storage status=ok project_id={} removed={}",
            id, removed
        );
        Ok(removed)
    }

    /// Lists notes with their tags, most recently updated first.
    pub fn list_notes(&self) -> StorageResult<Vec<Note>> {
        self.with_connection(|conn| Ok(SqliteNoteRepository::new(conn).list_notes()?))
    }

    /// Gets one note with its tags.
    pub fn get_note(&self, id: &str) -> StorageResult<Option<Note>> {
        self.with_connection(|conn| Ok(SqliteNoteRepository::new(conn).get_note(id)?))
    }

    /// Creates or updates one note and replaces its full tag set atomically.
    ///
    /// # Errors
    /// - `Constraint` when `project_id` names no existing project. The prior
    ///   note and tag state is left untouched.
    pub fn save_note(&self, draft: NoteDraft) -> StorageResult<Note> {
        let now = now_epoch_ms();
        let note = self.write_transaction("save_note", |tx| save_note_in_tx(tx, &draft, now))?;
        debug!(
            "event=note_save module=storage status=ok note_id={} tag_count={}",
            note.id,
            note.tags.len()
        );
        Ok(note)
    }

    /// Saves several notes in one transaction: all of them or none.
    pub fn save_notes(&self, drafts: Vec<NoteDraft>) -> StorageResult<Vec<Note>> {
        let now = now_epoch_ms();
        let notes = self.write_transaction("save_notes", |tx| {
            drafts
                .iter()
                .map(|draft| save_note_in_tx(tx, draft, now))
                .collect::<StorageResult<Vec<_>>>()
        })?;
        info!(
            "event=notes_save_all module=storage status=ok count={}",
            notes.len()
        );
        Ok(notes)
    }

    /// Deletes one note; its tag links cascade, its tags stay.
    pub fn delete_note(&self, id: &str) -> StorageResult<bool> {
        let removed = self.write_transaction("delete_note", |tx| {
            Ok(SqliteNoteRepository::new(tx).delete_note(id)?)
        })?;
        debug!(
            "event=note_delete module=storage status=ok note_id={} removed={}",
            id, removed
        );
        Ok(removed)
    }

    /// Every known tag name, including tags no note references anymore.
    pub fn list_distinct_tag_names(&self) -> StorageResult<Vec<String>> {
        self.with_connection(|conn| Ok(SqliteTagRepository::new(conn).list_tag_names()?))
    }

    /// Lists templates ordered by category, then name.
    pub fn list_templates(&self) -> StorageResult<Vec<Template>> {
        self.with_connection(|conn| Ok(SqliteTemplateRepository::new(conn).list_templates()?))
    }

    /// Creates or fully overwrites one template.
    pub fn save_template(&self, draft: TemplateDraft) -> StorageResult<Template> {
        draft.validate()?;
        let template = draft.into_template();
        self.with_connection(|conn| {
            SqliteTemplateRepository::new(conn).upsert_template(&template)?;
            Ok(())
        })?;
        Ok(template)
    }

    /// Deletes one template; `false` when no template had this id.
    pub fn delete_template(&self, id: &str) -> StorageResult<bool> {
        self.with_connection(|conn| Ok(SqliteTemplateRepository::new(conn).delete_template(id)?))
    }

    /// Row counts per table.
    pub fn stats(&self) -> StorageResult<StoreStats> {
        self.with_connection(|conn| {
            let [projects, notes, tags, note_tags, templates] = TABLES;
            Ok(StoreStats {
                projects: count_rows(conn, projects)?,
                notes: count_rows(conn, notes)?,
                tags: count_rows(conn, tags)?,
                note_tags: count_rows(conn, note_tags)?,
                templates: count_rows(conn, templates)?,
            })
        })
    }
}

fn save_note_in_tx(conn: &Connection, draft: &NoteDraft, now: EpochMillis) -> StorageResult<Note> {
    let note_repo = SqliteNoteRepository::new(conn);
    let tag_repo = SqliteTagRepository::new(conn);
    let id = draft.existing_id().unwrap_or_else(new_entity_id);

    note_repo.upsert_note(&Note {
        id: id.clone(),
        title: draft.effective_title(),
        content: draft.content.clone(),
        project_id: draft.effective_project_id(),
        created_at: now,
        updated_at: now,
        tags: Vec::new(),
    })?;
    tag_repo.replace_note_tags(&id, &normalize_tags(&draft.tags))?;

    note_repo
        .get_note(&id)?
        .ok_or_else(|| StorageError::InvalidData(format!("note {id} missing after save")))
}

/// Generates an opaque unique id for projects and notes.
pub(crate) fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}
