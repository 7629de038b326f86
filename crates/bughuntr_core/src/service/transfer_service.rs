//! Import/export gateway: atomic whole-dataset replace and export.
//!
//! # Responsibility
//! - Destroy and rebuild every table from one payload in a single
//!   transaction (`bulk_replace`), used by "Import Data" and legacy migration.
//! - Produce a dataset snapshot that `bulk_replace` accepts back.
//!
//! # Invariants
//! - `bulk_replace` is all-or-nothing: any failure leaves the previous dataset
//!   exactly as it was.
//! - Tables are cleared child-first (`note_tags`, `tags`, `notes`,
//!   `projects`, `templates`) and filled parent-first.
//! - Duplicate ids inside one payload are constraint violations, not merges.

use crate::model::dataset::{DataSet, ImportSummary, ImportedNote, ImportedProject};
use crate::model::non_blank;
use crate::model::note::{effective_title, Note};
use crate::model::project::Project;
use crate::model::template::{effective_category, generate_template_id, Template};
use crate::model::timestamp::{now_epoch_ms, EpochMillis};
use crate::model::validation::ValidationError;
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::tag_repo::{normalize_tags, SqliteTagRepository, TagRepository};
use crate::repo::template_repo::{SqliteTemplateRepository, TemplateRepository};
use crate::service::error::{StorageError, StorageResult};
use crate::service::storage_engine::{new_entity_id, Store};
use log::{error, info, warn};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

/// Whole-dataset import/export over a shared store handle.
pub struct ImportExportGateway<'store> {
    store: &'store Store,
}

impl<'store> ImportExportGateway<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self { store }
    }

    /// Replaces every project, note, tag and template with `data`.
    ///
    /// Missing ids, titles, categories and timestamps are defaulted. A note
    /// whose `projectId` names no project of the payload is imported detached.
    ///
    /// # Errors
    /// - `Validation` when a project or template has a blank name; storage is
    ///   not touched.
    /// - `Constraint` / `Sqlite` when any insert fails; the transaction is
    ///   rolled back and the previous dataset is intact.
    pub fn bulk_replace(&self, data: &DataSet) -> StorageResult<ImportSummary> {
        validate_dataset(data)?;

        let started_at = Instant::now();
        info!(
            "event=bulk_replace module=transfer status=start projects={} notes={} templates={}",
            data.projects.len(),
            data.notes.len(),
            data.templates.len()
        );

        let now = now_epoch_ms();
        let result = self
            .store
            .write_transaction("bulk_replace", |tx| replace_all(tx, data, now));

        match &result {
            Ok(summary) => info!(
                "event=bulk_replace module=transfer status=ok duration_ms={} projects={} notes={} tags={} note_tags={} templates={} detached_notes={}",
                started_at.elapsed().as_millis(),
                summary.projects,
                summary.notes,
                summary.tags,
                summary.note_tags,
                summary.templates,
                summary.detached_notes
            ),
            Err(err) => error!(
                "event=bulk_replace module=transfer status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }

        result
    }

    /// Reads the complete dataset in the import document shape.
    pub fn export_dataset(&self) -> StorageResult<DataSet> {
        self.store.with_connection(|conn| {
            let projects = SqliteProjectRepository::new(conn).list_projects()?;
            let notes = SqliteNoteRepository::new(conn).list_notes()?;
            let templates = SqliteTemplateRepository::new(conn).list_templates()?;
            Ok(DataSet {
                projects: projects.into_iter().map(Into::into).collect(),
                notes: notes.into_iter().map(Into::into).collect(),
                templates: templates.into_iter().map(Into::into).collect(),
            })
        })
    }
}

fn validate_dataset(data: &DataSet) -> Result<(), ValidationError> {
    for (index, project) in data.projects.iter().enumerate() {
        if project.name.trim().is_empty() {
            return Err(ValidationError::ImportRecord {
                collection: "projects",
                index,
                reason: Box::new(ValidationError::EmptyProjectName),
            });
        }
    }
    for (index, template) in data.templates.iter().enumerate() {
        if template.name.trim().is_empty() {
            return Err(ValidationError::ImportRecord {
                collection: "templates",
                index,
                reason: Box::new(ValidationError::EmptyTemplateName),
            });
        }
    }
    Ok(())
}

fn replace_all(conn: &Connection, data: &DataSet, now: EpochMillis) -> StorageResult<ImportSummary> {
    let project_repo = SqliteProjectRepository::new(conn);
    let note_repo = SqliteNoteRepository::new(conn);
    let tag_repo = SqliteTagRepository::new(conn);
    let template_repo = SqliteTemplateRepository::new(conn);

    tag_repo.delete_all_links()?;
    tag_repo.delete_all_tags()?;
    note_repo.delete_all_notes()?;
    project_repo.delete_all_projects()?;
    template_repo.delete_all_templates()?;

    let mut summary = ImportSummary::default();

    let mut project_ids = HashSet::with_capacity(data.projects.len());
    for imported in &data.projects {
        let project = project_from_import(imported, now);
        project_repo.insert_project(&project)?;
        project_ids.insert(project.id);
        summary.projects += 1;
    }

    let all_tags: BTreeSet<String> = data
        .notes
        .iter()
        .flat_map(|note| normalize_tags(&note.tags))
        .collect();
    let tag_ids = tag_repo.insert_tags(&all_tags)?;
    summary.tags = tag_ids.len();

    for imported in &data.notes {
        let mut note = note_from_import(imported, now);
        if let Some(project_id) = note.project_id.as_deref() {
            if !project_ids.contains(project_id) {
                warn!(
                    "event=bulk_replace_detach module=transfer status=skip note_id={} project_id={}",
                    note.id, project_id
                );
                note.project_id = None;
                summary.detached_notes += 1;
            }
        }
        note_repo.insert_note(&note)?;
        summary.notes += 1;

        for tag in normalize_tags(&imported.tags) {
            let tag_id = tag_ids.get(&tag).copied().ok_or_else(|| {
                StorageError::InvalidData(format!("tag `{tag}` missing from import tag map"))
            })?;
            tag_repo.link_note_tag(&note.id, tag_id)?;
            summary.note_tags += 1;
        }
    }

    for imported in &data.templates {
        let template = Template {
            id: non_blank(imported.id.as_deref()).unwrap_or_else(generate_template_id),
            name: imported.name.trim().to_string(),
            category: effective_category(imported.category.as_deref()),
            content: imported.content.clone(),
        };
        template_repo.insert_template(&template)?;
        summary.templates += 1;
    }

    Ok(summary)
}

fn project_from_import(imported: &ImportedProject, now: EpochMillis) -> Project {
    Project {
        id: non_blank(imported.id.as_deref()).unwrap_or_else(new_entity_id),
        name: imported.name.trim().to_string(),
        url: non_blank(imported.url.as_deref()),
        scope: non_blank(imported.scope.as_deref()),
        created_at: imported.created_at.unwrap_or(now),
        updated_at: imported.updated_at.unwrap_or(now),
    }
}

fn note_from_import(imported: &ImportedNote, now: EpochMillis) -> Note {
    Note {
        id: non_blank(imported.id.as_deref()).unwrap_or_else(new_entity_id),
        title: effective_title(imported.title.as_deref()),
        content: imported.content.clone().unwrap_or_default(),
        project_id: non_blank(imported.project_id.as_deref()),
        created_at: imported.created_at.unwrap_or(now),
        updated_at: imported.updated_at.unwrap_or(now),
        tags: Vec::new(),
    }
}
