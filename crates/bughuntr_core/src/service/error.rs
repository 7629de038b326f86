//! Storage engine error taxonomy.
//!
//! # Invariants
//! - Constraint violations raised inside a transaction are reported as
//!   `Constraint` after the transaction has been rolled back.
//! - Validation failures are raised before any storage access.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Error surfaced by every storage engine operation.
#[derive(Debug)]
pub enum StorageError {
    /// Store could not be opened or its schema could not be installed.
    Connection(DbError),
    /// Referential, uniqueness or trigger violation; the transaction was
    /// rolled back.
    Constraint(rusqlite::Error),
    /// Caller payload rejected before touching storage.
    Validation(ValidationError),
    /// Any other statement failure.
    Sqlite(rusqlite::Error),
    /// Persisted state does not match the expected shape.
    InvalidData(String),
    /// A previous holder of the store lock panicked.
    LockPoisoned,
}

impl StorageError {
    /// Stable machine-readable label for response envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Constraint(_) => "constraint",
            Self::Validation(_) => "validation",
            Self::Sqlite(_) | Self::InvalidData(_) | Self::LockPoisoned => "storage",
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "store unavailable: {err}"),
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned => write!(f, "store lock poisoned by a panicked writer"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Constraint(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::LockPoisoned => None,
        }
    }
}

impl From<ValidationError> for StorageError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        if is_constraint_violation(&value) {
            Self::Constraint(value)
        } else {
            Self::Sqlite(value)
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Connection(other),
        }
    }
}

impl From<RepoError> for StorageError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => err.into(),
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
