//! Startup sequence against real stores and the canonical snapshots

use proptest::prelude::*;
use tempfile::TempDir;
use wallet_state_core::schemas::{fixture_context, latest, schema};
use wallet_state_core::{PersistedState, LATEST_VERSION, UNVERSIONED};
use wallet_state_storage::{
    open_store, Backend, Bootstrap, BootstrapOutcome, FileSnapshotStore, PersistConfig,
    RecoveryPolicy, SnapshotStore, SqliteSnapshotStore,
};

#[test]
fn test_sqlite_store_migrates_on_startup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.db");
    {
        let store = SqliteSnapshotStore::open(&path, "root").unwrap();
        store.save(&schema(8).unwrap()).unwrap();
    }

    let store = SqliteSnapshotStore::open(&path, "root").unwrap();
    let result = Bootstrap::new().run(&store, &fixture_context()).unwrap();
    assert_eq!(result.state, Some(latest()));
    assert!(matches!(
        result.outcome,
        BootstrapOutcome::Migrated { ref report } if report.steps_applied() == 43
    ));

    // Second start finds the migrated snapshot
    let row = store.load_row().unwrap().unwrap();
    assert_eq!(row.state_version, LATEST_VERSION);
    let again = Bootstrap::new().run(&store, &fixture_context()).unwrap();
    assert_eq!(again.outcome, BootstrapOutcome::Current { version: LATEST_VERSION });
}

#[test]
fn test_file_store_migrates_on_startup() {
    let dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("root.json"));
    store.save(&schema(UNVERSIONED).unwrap()).unwrap();

    let result = Bootstrap::new().run(&store, &fixture_context()).unwrap();
    assert_eq!(result.state, Some(latest()));
    assert_eq!(store.load().unwrap(), Some(latest()));
}

#[test]
fn test_corrupt_sqlite_snapshot_reset_from_config() {
    let dir = TempDir::new().unwrap();
    let config = PersistConfig {
        backend: Backend::Sqlite,
        path: Some(dir.path().join("state.db")),
        recovery: RecoveryPolicy::ResetToDefault,
        ..Default::default()
    };
    let store = open_store(&config).unwrap();
    store.save(&schema(30).unwrap()).unwrap();
    drop(store);

    let conn = rusqlite::Connection::open(dir.path().join("state.db")).unwrap();
    conn.execute("UPDATE snapshots SET checksum = 'deadbeef'", []).unwrap();
    drop(conn);

    let store = open_store(&config).unwrap();
    let result = Bootstrap::from_config(&config)
        .run(store.as_ref(), &fixture_context())
        .unwrap();
    assert!(result.state.is_none());
    assert!(matches!(result.outcome, BootstrapOutcome::Reset { backed_up: true, .. }));
    assert!(store.load().unwrap().is_none());

    // The stored row survives as a backup
    let sqlite = SqliteSnapshotStore::open(dir.path().join("state.db"), "root").unwrap();
    let backups = sqlite.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0].state_version, 30);
    assert_eq!(backups[0].checksum, "deadbeef");
    assert_eq!(
        PersistedState::from_json_str(&backups[0].payload).unwrap(),
        schema(30).unwrap()
    );
}

#[test]
fn test_corrupt_snapshot_propagates_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("root.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileSnapshotStore::new(&path);
    assert!(Bootstrap::new().run(&store, &fixture_context()).is_err());
    assert!(path.exists());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: a snapshot of any version comes back from SQLite at the latest version
    #[test]
    fn prop_sqlite_bootstrap_reaches_latest(version in UNVERSIONED..=LATEST_VERSION) {
        let dir = TempDir::new().unwrap();
        let store = SqliteSnapshotStore::open(dir.path().join("state.db"), "root").unwrap();
        store.save(&schema(version).unwrap()).unwrap();

        let result = Bootstrap::new().run(&store, &fixture_context()).unwrap();
        prop_assert_eq!(result.state, Some(latest()));
        prop_assert_eq!(store.load().unwrap(), Some(latest()));
    }
}
