//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist note rows and read them back together with their tag names.
//! - Resolve tags for a whole listing with one association query instead of
//!   one query per note.
//!
//! # Invariants
//! - Listing is sorted by `updated_at DESC, id ASC`.
//! - Tag names on read models are sorted by name (BINARY order).
//! - Upserts never overwrite `created_at` of an existing row.

use crate::model::note::Note;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    project_id,
    created_at,
    updated_at
FROM notes";

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Lists all notes with resolved tags.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Gets one note with resolved tags.
    fn get_note(&self, id: &str) -> RepoResult<Option<Note>>;
    /// Inserts or updates the note row. `note.tags` is not written here; tag
    /// links are owned by `TagRepository::replace_note_tags`.
    fn upsert_note(&self, note: &Note) -> RepoResult<()>;
    /// Plain insert; an existing id is a constraint violation.
    fn insert_note(&self, note: &Note) -> RepoResult<()>;
    /// Returns whether a row was removed. Tag links cascade.
    fn delete_note(&self, id: &str) -> RepoResult<bool>;
    fn delete_all_notes(&self) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut tags_by_note = load_all_note_tags(self.conn)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.tags = tags_by_note.remove(&note.id).unwrap_or_default();
            notes.push(note);
        }
        Ok(notes)
    }

    fn get_note(&self, id: &str) -> RepoResult<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_note_row,
            )
            .optional()?;

        match note {
            Some(mut note) => {
                note.tags = load_tags_for_note(self.conn, id)?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    fn upsert_note(&self, note: &Note) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notes (id, title, content, project_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                project_id = excluded.project_id,
                updated_at = excluded.updated_at;",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.project_id.as_deref(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    fn insert_note(&self, note: &Note) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notes (id, title, content, project_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.project_id.as_deref(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    fn delete_note(&self, id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_all_notes(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM notes;", [])?)
    }
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        project_id: row.get("project_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: Vec::new(),
    })
}

fn load_all_note_tags(conn: &Connection) -> RepoResult<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT nt.note_id, t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         ORDER BY nt.note_id ASC, t.name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tags_by_note: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let note_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        tags_by_note.entry(note_id).or_default().push(name);
    }
    Ok(tags_by_note)
}

fn load_tags_for_note(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}
