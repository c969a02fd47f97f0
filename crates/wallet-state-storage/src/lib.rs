//! Snapshot storage for persisted wallet state
//!
//! Provides the stores a persisted state tree is loaded from and saved to
//! (in-memory, JSON file, SQLite with WAL mode and checksums), and the
//! startup bootstrap that migrates the stored snapshot before anything
//! reads it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod migrations;
pub mod models;
pub mod sqlite_store;
pub mod store;

pub use bootstrap::{
    open_store, Bootstrap, BootstrapOutcome, BootstrapResult, DowngradePolicy, RecoveryPolicy,
};
pub use config::{Backend, PersistConfig};
pub use database::Database;
pub use error::{Error, Result};
pub use models::{payload_checksum, BackupRow, SnapshotRow};
pub use sqlite_store::{SqliteSnapshotStore, DEFAULT_PERSIST_KEY};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
