//! Template repository contracts and SQLite implementation.
//!
//! Templates are single-row records without relations; every write is a
//! full overwrite by id.

use crate::model::template::Template;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};

/// Repository interface for template persistence.
pub trait TemplateRepository {
    fn list_templates(&self) -> RepoResult<Vec<Template>>;
    fn upsert_template(&self, template: &Template) -> RepoResult<()>;
    /// Plain insert; an existing id is a constraint violation.
    fn insert_template(&self, template: &Template) -> RepoResult<()>;
    fn delete_template(&self, id: &str) -> RepoResult<bool>;
    fn delete_all_templates(&self) -> RepoResult<usize>;
}

/// SQLite-backed template repository.
pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TemplateRepository for SqliteTemplateRepository<'_> {
    fn list_templates(&self) -> RepoResult<Vec<Template>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, content
             FROM templates
             ORDER BY category ASC, name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next()? {
            templates.push(parse_template_row(row)?);
        }
        Ok(templates)
    }

    fn upsert_template(&self, template: &Template) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO templates (id, name, category, content)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                content = excluded.content;",
            params![
                template.id.as_str(),
                template.name.as_str(),
                template.category.as_str(),
                template.content.as_str(),
            ],
        )?;
        Ok(())
    }

    fn insert_template(&self, template: &Template) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO templates (id, name, category, content) VALUES (?1, ?2, ?3, ?4);",
            params![
                template.id.as_str(),
                template.name.as_str(),
                template.category.as_str(),
                template.content.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete_template(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM templates WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_all_templates(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM templates;", [])?)
    }
}

fn parse_template_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get("id")?,
        name: row.get("name")?,
        category: row.get("category")?,
        content: row.get("content")?,
    })
}
