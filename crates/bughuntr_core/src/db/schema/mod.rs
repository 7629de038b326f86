//! Fixed relational schema and its idempotent installer.
//!
//! # Responsibility
//! - Create `projects`, `notes`, `tags`, `note_tags` and `templates` with
//!   their referential constraints.
//! - Mirror the installed version to `PRAGMA user_version`.
//!
//! # Invariants
//! - Every statement is `IF NOT EXISTS`; re-running is a no-op.
//! - A database stamped with a newer version is rejected, never downgraded.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Version stamped into `PRAGMA user_version` once the schema is installed.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("0001_init.sql");

/// Logical tables owned by the storage engine, parent tables first.
pub const TABLES: [&str; 5] = ["projects", "notes", "tags", "note_tags", "templates"];

/// Installs the schema on the provided connection when it is missing.
///
/// Returns `true` when statements were executed, `false` when the connection
/// already carried the current version.
pub fn apply_schema(conn: &mut Connection) -> DbResult<bool> {
    let current_version = current_user_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    if current_version == SCHEMA_VERSION {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(true)
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_schema, current_user_version, SCHEMA_VERSION, TABLES};
    use rusqlite::Connection;

    #[test]
    fn apply_schema_twice_is_a_noop_the_second_time() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(apply_schema(&mut conn).unwrap());
        assert!(!apply_schema(&mut conn).unwrap());
        assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);

        for table in TABLES {
            let exists: i64 = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "table {table} does not exist");
        }
    }
}
