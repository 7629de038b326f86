//! Tag index: resolves free-text tag strings to stable tag ids.
//!
//! # Responsibility
//! - Resolve-or-create tag rows on demand.
//! - Own full replacement of a note's tag links.
//!
//! # Invariants
//! - Tag names are trimmed but never case-folded: `Web` and `web` are two tags.
//! - Tag rows are never deleted here, even when no note references them
//!   anymore (autocomplete keeps the history). Only a whole-dataset replace
//!   clears them.

use crate::repo::RepoResult;
use rusqlite::{params, Connection};
use std::collections::{BTreeSet, HashMap};

/// Engine-assigned sequential tag identifier.
pub type TagId = i64;

/// Repository interface for tags and note/tag links.
pub trait TagRepository {
    /// Returns the id of the tag named `name`, creating it when missing.
    fn resolve_or_create(&self, name: &str) -> RepoResult<TagId>;
    /// Replaces every link of `note_id` with links to `tags`.
    ///
    /// `tags` must already be normalized (see `normalize_tags`).
    fn replace_note_tags(&self, note_id: &str, tags: &[String]) -> RepoResult<usize>;
    /// Inserts new tag rows and returns the name to id map.
    fn insert_tags(&self, names: &BTreeSet<String>) -> RepoResult<HashMap<String, TagId>>;
    fn link_note_tag(&self, note_id: &str, tag_id: TagId) -> RepoResult<()>;
    /// Lists every known tag name, referenced or not, in BINARY order.
    fn list_tag_names(&self) -> RepoResult<Vec<String>>;
    fn delete_all_links(&self) -> RepoResult<usize>;
    fn delete_all_tags(&self) -> RepoResult<usize>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn resolve_or_create(&self, name: &str) -> RepoResult<TagId> {
        self.conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
        let id = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    fn replace_note_tags(&self, note_id: &str, tags: &[String]) -> RepoResult<usize> {
        self.conn
            .execute("DELETE FROM note_tags WHERE note_id = ?1;", [note_id])?;

        for tag in tags {
            let tag_id = self.resolve_or_create(tag)?;
            self.link_note_tag(note_id, tag_id)?;
        }

        Ok(tags.len())
    }

    fn insert_tags(&self, names: &BTreeSet<String>) -> RepoResult<HashMap<String, TagId>> {
        let mut stmt = self.conn.prepare("INSERT INTO tags (name) VALUES (?1);")?;
        let mut ids = HashMap::with_capacity(names.len());
        for name in names {
            let id = stmt.insert([name.as_str()])?;
            ids.insert(name.clone(), id);
        }
        Ok(ids)
    }

    fn link_note_tag(&self, note_id: &str, tag_id: TagId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO note_tags (note_id, tag_id) VALUES (?1, ?2);",
            params![note_id, tag_id],
        )?;
        Ok(())
    }

    fn list_tag_names(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT name FROM tags ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    fn delete_all_links(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM note_tags;", [])?)
    }

    fn delete_all_tags(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM tags;", [])?)
    }
}

/// Normalizes one tag value: trimmed, `None` when blank. Case is preserved.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes and deduplicates tag values, sorted by name.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}
