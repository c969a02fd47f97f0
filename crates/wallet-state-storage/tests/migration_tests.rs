//! Storage schema migration tests

use rusqlite::Connection;
use tempfile::NamedTempFile;
use wallet_state_storage::migrations;

#[test]
fn test_fresh_migration() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();

    verify_schema(&conn);
}

#[test]
fn test_migration_idempotency() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();
    migrations::run_migrations(&conn).unwrap();

    verify_schema(&conn);
    let versions: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(versions, 1);
}

#[test]
fn test_schema_version_tracking() {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();

    migrations::run_migrations(&conn).unwrap();

    assert_eq!(
        migrations::get_schema_version(&conn).unwrap(),
        migrations::SCHEMA_VERSION
    );
}

#[test]
fn test_snapshot_key_is_unique() {
    let conn = Connection::open_in_memory().unwrap();
    migrations::run_migrations(&conn).unwrap();

    conn.execute(
        "INSERT INTO snapshots (persist_key, payload, checksum, state_version, updated_at)
         VALUES ('root', '{}', 'a', 51, 'now')",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO snapshots (persist_key, payload, checksum, state_version, updated_at)
         VALUES ('root', '{}', 'b', 51, 'now')",
        [],
    );
    assert!(duplicate.is_err());
}

#[test]
fn test_backups_allow_many_per_key() {
    let conn = Connection::open_in_memory().unwrap();
    migrations::run_migrations(&conn).unwrap();

    for reason in ["first", "second"] {
        conn.execute(
            "INSERT INTO snapshot_backups (persist_key, payload, checksum, state_version, reason, created_at)
             VALUES ('root', '{}', 'a', 8, ?1, 'now')",
            [reason],
        )
        .unwrap();
    }
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM snapshot_backups", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

fn verify_schema(conn: &Connection) {
    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap();

    for table in ["schema_version", "snapshot_backups", "snapshots"] {
        assert!(tables.iter().any(|t| t == table), "missing table {table}");
    }
}
