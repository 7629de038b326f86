//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQL details from the storage engine and gateway services.
//!
//! # Invariants
//! - Repositories never open or commit transactions themselves; callers pass
//!   a connection that may be a `rusqlite::Transaction` (it derefs to one).

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;
pub mod project_repo;
pub mod tag_repo;
pub mod template_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Counts rows of one of the engine-owned tables.
pub(crate) fn count_rows(conn: &rusqlite::Connection, table: &'static str) -> RepoResult<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}
