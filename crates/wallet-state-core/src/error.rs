//! Error types for the migration chain
//!
//! Every failure of a migration run is one of these variants. The runner never
//! recovers from them; the caller (usually the bootstrap) decides what to do.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Migration errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// No step is registered for a version the run needs
    #[error("No migration registered for version {version}")]
    MissingMigration {
        /// Version that has no step
        version: i64,
    },

    /// A custom registry skips a version
    #[error("Migration registry gap: expected version {expected}, found {found}")]
    RegistryGap {
        /// Version expected at this position
        expected: i64,
        /// Version actually registered there
        found: i64,
    },

    /// A step found a required field absent or of the wrong shape
    #[error("Malformed input for migration {version}: `{path}` is missing or has the wrong shape")]
    MalformedInput {
        /// Version of the failing step
        version: i64,
        /// Dotted path of the offending field
        path: String,
    },

    /// The snapshot was written by a newer build
    #[error("Persisted version {found} is newer than the latest known version {latest}")]
    VersionAhead {
        /// Version found in the snapshot
        found: i64,
        /// Latest version this build knows
        latest: i64,
    },

    /// The snapshot is not a state tree
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrationError {
    /// Shorthand for [`MigrationError::MalformedInput`]
    pub fn malformed(version: i64, path: impl Into<String>) -> Self {
        MigrationError::MalformedInput {
            version,
            path: path.into(),
        }
    }

    /// Version of the step that failed, if the error is tied to one
    pub fn failed_version(&self) -> Option<i64> {
        match self {
            MigrationError::MissingMigration { version }
            | MigrationError::MalformedInput { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Whether discarding the snapshot and starting from defaults would get
    /// past this error
    pub fn is_recoverable_by_reset(&self) -> bool {
        matches!(
            self,
            MigrationError::MalformedInput { .. }
                | MigrationError::VersionAhead { .. }
                | MigrationError::InvalidSnapshot(_)
                | MigrationError::Serialization(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrationError::MissingMigration { .. } | MigrationError::RegistryGap { .. } => {
                ErrorCategory::Registry
            }
            MigrationError::MalformedInput { .. } | MigrationError::InvalidSnapshot(_) => {
                ErrorCategory::Input
            }
            MigrationError::VersionAhead { .. } => ErrorCategory::Version,
            MigrationError::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The step table itself is broken
    Registry,
    /// The persisted tree does not have the expected shape
    Input,
    /// Version tag cannot be handled by this build
    Version,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Registry => write!(f, "Registry"),
            ErrorCategory::Input => write!(f, "Input"),
            ErrorCategory::Version => write!(f, "Version"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}
