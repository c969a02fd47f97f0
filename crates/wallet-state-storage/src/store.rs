//! Snapshot stores
//!
//! A store holds at most one serialized state tree. `load` returns `None` when
//! nothing has been persisted yet.

use crate::Result;
use parking_lot::Mutex;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use wallet_state_core::PersistedState;

/// Storage collaborator of the bootstrap
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot
    fn load(&self) -> Result<Option<PersistedState>>;

    /// Replace the stored snapshot
    fn save(&self, state: &PersistedState) -> Result<()>;

    /// Forget the stored snapshot
    fn clear(&self) -> Result<()>;

    /// Set a snapshot aside before it is discarded
    ///
    /// Returns whether a backup was written. Stores without backup support
    /// return `false`.
    fn backup(&self, _state: &PersistedState, _reason: &str) -> Result<bool> {
        Ok(false)
    }

    /// Set the stored bytes aside when they could not be loaded
    ///
    /// Same contract as [`SnapshotStore::backup`], for snapshots that never
    /// made it into a [`PersistedState`].
    fn backup_stored(&self, _reason: &str) -> Result<bool> {
        Ok(false)
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<Value>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a snapshot
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            slot: Mutex::new(Some(state.into_value())),
        }
    }

    /// Raw stored value
    pub fn raw(&self) -> Option<Value> {
        self.slot.lock().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        let value = self.slot.lock().clone();
        Ok(value.map(PersistedState::from_value).transpose()?)
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        *self.slot.lock() = Some(state.clone().into_value());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Store backed by one JSON file
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous snapshot in place.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store for `path`; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(PersistedState::from_json_str(&contents)?))
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = state.to_json_pretty()?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        tracing::debug!("Wrote snapshot to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
