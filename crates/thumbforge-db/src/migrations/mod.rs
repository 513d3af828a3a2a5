//! Schema upgrades embedded in the binary.
//!
//! The schema version lives in SQLite's `user_version` header field. Each
//! step of `STEPS` moves the schema from version `n` to `n + 1` and is
//! applied together with the version bump in one transaction.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema step {version} ({name}) failed: {source}")]
    Step {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },

    #[error("Database schema version {found} is newer than this build ({known})")]
    TooNew { found: u32, known: u32 },
}

/// Ordered schema steps as `(name, sql)`. Step `i` yields version `i + 1`.
const STEPS: &[(&str, &str)] = &[("records", include_str!("001_initial.sql"))];

/// Schema version currently recorded in the database, 0 when fresh.
pub fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the schema up to date and return the number of steps applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    upgrade(conn, STEPS)
}

fn upgrade(conn: &Connection, steps: &[(&'static str, &str)]) -> Result<usize, MigrationError> {
    let known = steps.len() as u32;
    let found = current_version(conn)?;
    if found > known {
        return Err(MigrationError::TooNew { found, known });
    }

    for (version, &(name, sql)) in (1..).zip(steps).skip(found as usize) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .and_then(|_| tx.pragma_update(None, "user_version", version))
            .map_err(|source| MigrationError::Step {
                version,
                name,
                source,
            })?;
        tx.commit()?;
        tracing::debug!(version, name, "Applied schema step");
    }

    Ok((known - found) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_fresh_database_is_upgraded_once() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);

        assert_eq!(run_migrations(&conn).unwrap(), STEPS.len());
        assert_eq!(current_version(&conn).unwrap(), STEPS.len() as u32);
        assert!(table_exists(&conn, "records"));

        assert_eq!(run_migrations(&conn).unwrap(), 0);
    }

    #[test]
    fn test_failed_step_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let steps = [
            ("first", "CREATE TABLE first (id INTEGER);"),
            ("broken", "CREATE TABLE second (id INTEGER); NOT SQL;"),
        ];

        let err = upgrade(&conn, &steps).unwrap_err();
        assert!(matches!(err, MigrationError::Step { version: 2, .. }));
        assert_eq!(current_version(&conn).unwrap(), 1);
        assert!(table_exists(&conn, "first"));
        assert!(!table_exists(&conn, "second"));
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 7).unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, MigrationError::TooNew { found: 7, .. }));
    }
}
