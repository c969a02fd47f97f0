//! Database models

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stored snapshot record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Persist key
    pub persist_key: String,
    /// Serialized state tree (JSON)
    pub payload: String,
    /// Hex SHA-256 of `payload`
    pub checksum: String,
    /// `_persist.version` at the time of the write
    pub state_version: i64,
    /// Last write timestamp (RFC 3339)
    pub updated_at: String,
}

impl SnapshotRow {
    /// Whether the payload still matches its checksum
    pub fn is_intact(&self) -> bool {
        payload_checksum(&self.payload) == self.checksum
    }
}

/// Backup of a snapshot taken before a reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRow {
    /// Backup ID
    pub id: i64,
    /// Persist key the snapshot belonged to
    pub persist_key: String,
    /// Serialized state tree (JSON)
    pub payload: String,
    /// Hex SHA-256 of `payload`
    pub checksum: String,
    /// `_persist.version` of the backed up snapshot
    pub state_version: i64,
    /// Why the snapshot was set aside
    pub reason: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Hex-encoded SHA-256 of a payload
pub fn payload_checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}
