//! Project repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is sorted by `updated_at DESC, id ASC`.
//! - Upserts never overwrite `created_at` of an existing row.
//! - Deleting a project detaches its notes (`ON DELETE SET NULL`).

use crate::model::project::Project;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    url,
    scope,
    created_at,
    updated_at
FROM projects";

/// Repository interface for project persistence.
pub trait ProjectRepository {
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn get_project(&self, id: &str) -> RepoResult<Option<Project>>;
    /// Inserts the row, or updates name/url/scope/updated_at when the id exists.
    fn upsert_project(&self, project: &Project) -> RepoResult<()>;
    /// Plain insert; an existing id is a constraint violation.
    fn insert_project(&self, project: &Project) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete_project(&self, id: &str) -> RepoResult<bool>;
    fn delete_all_projects(&self) -> RepoResult<usize>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY updated_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn get_project(&self, id: &str) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_project_row,
            )
            .optional()?;
        Ok(project)
    }

    fn upsert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (id, name, url, scope, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                url = excluded.url,
                scope = excluded.scope,
                updated_at = excluded.updated_at;",
            params![
                project.id.as_str(),
                project.name.as_str(),
                project.url.as_deref(),
                project.scope.as_deref(),
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn insert_project(&self, project: &Project) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO projects (id, name, url, scope, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.id.as_str(),
                project.name.as_str(),
                project.url.as_deref(),
                project.scope.as_deref(),
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn delete_project(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_all_projects(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM projects;", [])?)
    }
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        url: row.get("url")?,
        scope: row.get("scope")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
