//! Error types

use wallet_state_core::MigrationError;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// State migration error
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Stored payload does not match its checksum
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error (generic)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether discarding the stored snapshot would get past this error
    pub fn is_recoverable_by_reset(&self) -> bool {
        match self {
            Error::Corrupt(_) | Error::Serialization(_) => true,
            Error::Migration(e) => e.is_recoverable_by_reset(),
            _ => false,
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
