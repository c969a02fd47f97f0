//! Database schema migrations
//!
//! These version the storage tables, not the state tree stored in them.

use crate::{Error, Result};
use rusqlite::Connection;

/// Current storage schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::debug!(
        "Running storage migrations: current_version={}, target_version={}",
        current_version,
        SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version != SCHEMA_VERSION {
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Storage schema version recorded in the database, 0 when none
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result = conn.query_row(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(v) => Ok(v),
        Err(_) => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    // INSERT OR IGNORE keeps reruns idempotent
    let rows = conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    if rows > 0 {
        tracing::debug!("Inserted storage schema version {}", version);
    }
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One serialized state tree per persist key
        CREATE TABLE snapshots (
            persist_key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            checksum TEXT NOT NULL,
            state_version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| Error::Storage(format!("storage migration v1 failed: {e}")))?;

    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Snapshots set aside before a reset
        CREATE TABLE snapshot_backups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            persist_key TEXT NOT NULL,
            payload TEXT NOT NULL,
            checksum TEXT NOT NULL,
            state_version INTEGER NOT NULL,
            reason TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX idx_snapshot_backups_key ON snapshot_backups(persist_key, created_at);
        "#,
    )
    .map_err(|e| Error::Storage(format!("storage migration v2 failed: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_v1_database_upgrades() {
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
        let backups: i64 = conn
            .query_row("SELECT COUNT(*) FROM snapshot_backups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(backups, 0);
    }
}
