//! SQLite snapshot store with retry/backoff for SQLITE_BUSY
//!
//! Snapshots are stored as JSON text next to their SHA-256 checksum, one row
//! per persist key. A row whose payload no longer matches its checksum is
//! reported as [`Error::Corrupt`] instead of being handed to the migrations.

use crate::models::{payload_checksum, BackupRow, SnapshotRow};
use crate::store::SnapshotStore;
use crate::{Database, Error, Result};
use parking_lot::Mutex;
use rusqlite::{params, ErrorCode, OptionalExtension};
use std::path::Path;
use std::thread;
use std::time::Duration;
use wallet_state_core::PersistedState;

/// Persist key used when none is configured
pub const DEFAULT_PERSIST_KEY: &str = "root";

/// Maximum retry attempts for SQLITE_BUSY
pub const MAX_BUSY_RETRIES: u32 = 5;

/// Base backoff duration in milliseconds
pub const BASE_BACKOFF_MS: u64 = 50;

/// Maximum backoff duration in milliseconds
pub const MAX_BACKOFF_MS: u64 = 1000;

/// Store backed by a SQLite database
pub struct SqliteSnapshotStore {
    db: Mutex<Database>,
    key: String,
}

impl SqliteSnapshotStore {
    /// Open the database at `path` and use `key` as the persist key
    pub fn open<P: AsRef<Path>>(path: P, key: impl Into<String>) -> Result<Self> {
        Ok(Self::from_database(Database::open(path)?, key))
    }

    /// Wrap an already opened database
    pub fn from_database(db: Database, key: impl Into<String>) -> Self {
        Self {
            db: Mutex::new(db),
            key: key.into(),
        }
    }

    /// Persist key of this store
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw row of this store's key
    pub fn load_row(&self) -> Result<Option<SnapshotRow>> {
        self.with_retry(|db| {
            let row = db
                .conn()
                .query_row(
                    r#"
                    SELECT persist_key, payload, checksum, state_version, updated_at
                    FROM snapshots
                    WHERE persist_key = ?1
                    "#,
                    [&self.key],
                    |row| {
                        Ok(SnapshotRow {
                            persist_key: row.get(0)?,
                            payload: row.get(1)?,
                            checksum: row.get(2)?,
                            state_version: row.get(3)?,
                            updated_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Backups of this store's key, newest first
    pub fn list_backups(&self) -> Result<Vec<BackupRow>> {
        self.with_retry(|db| {
            let mut stmt = db.conn().prepare(
                r#"
                SELECT id, persist_key, payload, checksum, state_version, reason, created_at
                FROM snapshot_backups
                WHERE persist_key = ?1
                ORDER BY id DESC
                "#,
            )?;
            let rows = stmt
                .query_map([&self.key], |row| {
                    Ok(BackupRow {
                        id: row.get(0)?,
                        persist_key: row.get(1)?,
                        payload: row.get(2)?,
                        checksum: row.get(3)?,
                        state_version: row.get(4)?,
                        reason: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Restore a backup as the current snapshot
    pub fn restore_backup(&self, id: i64) -> Result<PersistedState> {
        let backup = self
            .list_backups()?
            .into_iter()
            .find(|backup| backup.id == id)
            .ok_or_else(|| Error::Storage(format!("no backup {id} for key {}", self.key)))?;
        if payload_checksum(&backup.payload) != backup.checksum {
            return Err(Error::Corrupt(format!("backup {id} checksum mismatch")));
        }
        let state = PersistedState::from_json_str(&backup.payload)?;
        self.save(&state)?;
        tracing::info!("Restored backup {} for key {}", id, self.key);
        Ok(state)
    }

    /// Delete all but the `keep_count` most recent backups of this key
    pub fn prune_backups(&self, keep_count: usize) -> Result<usize> {
        let count = self.with_retry(|db| {
            Ok(db.conn().execute(
                r#"
                DELETE FROM snapshot_backups
                WHERE persist_key = ?1 AND id NOT IN (
                    SELECT id FROM snapshot_backups
                    WHERE persist_key = ?1
                    ORDER BY id DESC
                    LIMIT ?2
                )
                "#,
                params![self.key, keep_count as i64],
            )?)
        })?;

        if count > 0 {
            tracing::info!("Pruned {} old snapshot backups, kept {}", count, keep_count);
        }
        Ok(count)
    }

    /// Run `f` against the database, retrying while it reports SQLITE_BUSY
    fn with_retry<F, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&Database) -> Result<T>,
    {
        let mut attempts = 0;

        loop {
            let result = f(&self.db.lock());
            match result {
                Ok(value) => return Ok(value),
                Err(Error::Database(ref e)) if is_busy_error(e) && attempts < MAX_BUSY_RETRIES => {
                    attempts += 1;
                    let backoff = calculate_backoff(attempts);
                    tracing::debug!(
                        "SQLITE_BUSY (attempt {}/{}), retrying in {}ms",
                        attempts,
                        MAX_BUSY_RETRIES,
                        backoff
                    );
                    thread::sleep(Duration::from_millis(backoff));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        let Some(row) = self.load_row()? else {
            return Ok(None);
        };
        if !row.is_intact() {
            return Err(Error::Corrupt(format!(
                "checksum mismatch for key {} (stored {}, computed {})",
                row.persist_key,
                row.checksum,
                payload_checksum(&row.payload)
            )));
        }
        Ok(Some(PersistedState::from_json_str(&row.payload)?))
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let payload = state.to_json()?;
        let checksum = payload_checksum(&payload);
        let version = state.version()?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.with_retry(|db| {
            db.conn().execute(
                r#"
                INSERT OR REPLACE INTO snapshots (persist_key, payload, checksum, state_version, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![self.key, payload, checksum, version, updated_at],
            )?;
            Ok(())
        })?;

        tracing::debug!("Saved snapshot for key {} at version {}", self.key, version);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.with_retry(|db| {
            db.conn()
                .execute("DELETE FROM snapshots WHERE persist_key = ?1", [&self.key])?;
            Ok(())
        })
    }

    fn backup(&self, state: &PersistedState, reason: &str) -> Result<bool> {
        let payload = state.to_json()?;
        let checksum = payload_checksum(&payload);
        // A snapshot with an unreadable tag is still worth keeping
        let version = state.version().unwrap_or(wallet_state_core::UNVERSIONED);
        let created_at = chrono::Utc::now().to_rfc3339();

        self.with_retry(|db| {
            db.conn().execute(
                r#"
                INSERT INTO snapshot_backups (persist_key, payload, checksum, state_version, reason, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![self.key, payload, checksum, version, reason, created_at],
            )?;
            Ok(())
        })?;

        tracing::warn!(
            "Backed up snapshot for key {} at version {}: {}",
            self.key,
            version,
            reason
        );
        Ok(true)
    }

    fn backup_stored(&self, reason: &str) -> Result<bool> {
        let created_at = chrono::Utc::now().to_rfc3339();

        // Row is copied as stored, checksum included, so a mismatch stays visible
        let copied = self.with_retry(|db| {
            Ok(db.conn().execute(
                r#"
                INSERT INTO snapshot_backups (persist_key, payload, checksum, state_version, reason, created_at)
                SELECT persist_key, payload, checksum, state_version, ?2, ?3
                FROM snapshots
                WHERE persist_key = ?1
                "#,
                params![self.key, reason, created_at],
            )?)
        })?;

        if copied > 0 {
            tracing::warn!("Backed up stored row for key {}: {}", self.key, reason);
        }
        Ok(copied > 0)
    }

    fn describe(&self) -> String {
        format!("sqlite key {}", self.key)
    }
}

/// Check if error is SQLITE_BUSY
fn is_busy_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: ErrorCode::DatabaseBusy,
                ..
            },
            _
        )
    )
}

/// Calculate exponential backoff with jitter
fn calculate_backoff(attempt: u32) -> u64 {
    let base = BASE_BACKOFF_MS * (1 << attempt.min(6));
    let jitter = rand::random::<u64>() % (base / 4 + 1);
    (base + jitter).min(MAX_BACKOFF_MS)
}
