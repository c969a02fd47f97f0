//! Persistence configuration

use crate::bootstrap::{DowngradePolicy, RecoveryPolicy};
use crate::sqlite_store::DEFAULT_PERSIST_KEY;
use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wallet_state_core::LATEST_VERSION;

/// Where snapshots are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process memory, lost on exit
    Memory,
    /// One JSON file per persist key
    File,
    /// SQLite database
    #[default]
    Sqlite,
}

/// Persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Persist key
    pub key: String,
    /// Storage backend
    pub backend: Backend,
    /// Storage location, the platform data directory when unset
    pub path: Option<PathBuf>,
    /// Version snapshots are migrated to
    pub version: i64,
    /// What to do when a snapshot cannot be loaded or migrated
    pub recovery: RecoveryPolicy,
    /// What to do with a snapshot written by a newer build
    pub downgrade: DowngradePolicy,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_PERSIST_KEY.to_string(),
            backend: Backend::default(),
            path: None,
            version: LATEST_VERSION,
            recovery: RecoveryPolicy::default(),
            downgrade: DowngradePolicy::default(),
        }
    }
}

impl PersistConfig {
    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings against this build
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::Config("persist key must not be empty".to_string()));
        }
        if !self
            .key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Config(format!(
                "persist key {:?} may only contain letters, digits, '-' and '_'",
                self.key
            )));
        }
        if self.version < 0 || self.version > LATEST_VERSION {
            return Err(Error::Config(format!(
                "target version {} outside 0..={}",
                self.version, LATEST_VERSION
            )));
        }
        Ok(())
    }

    /// Storage location for the configured backend
    ///
    /// Without an explicit `path` this is `state/<key>.json` or
    /// `state/persist.db` under the platform data directory.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let base = ProjectDirs::from("org", "WalletState", "WalletState")
            .map(|dirs| dirs.data_local_dir().join("state"))
            .unwrap_or_else(|| PathBuf::from("."));
        match self.backend {
            Backend::File => base.join(format!("{}.json", self.key)),
            Backend::Sqlite | Backend::Memory => base.join("persist.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PersistConfig::default();
        assert_eq!(config.key, "root");
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.version, LATEST_VERSION);
        assert_eq!(config.recovery, RecoveryPolicy::Propagate);
        assert_eq!(config.downgrade, DowngradePolicy::KeepAsIs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.json");
        std::fs::write(
            &path,
            r#"{"backend": "file", "path": "/tmp/root.json", "recovery": "reset_to_default"}"#,
        )
        .unwrap();

        let config = PersistConfig::from_file(&path).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.recovery, RecoveryPolicy::ResetToDefault);
        assert_eq!(config.key, "root");
        assert_eq!(config.resolved_path(), PathBuf::from("/tmp/root.json"));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.json");
        std::fs::write(&path, r#"{"backend": "floppy"}"#).unwrap();
        assert!(matches!(PersistConfig::from_file(&path), Err(Error::Config(_))));
        assert!(matches!(
            PersistConfig::from_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = PersistConfig {
            version: LATEST_VERSION + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.version = 8;
        assert!(config.validate().is_ok());
        config.key = "../root".to_string();
        assert!(config.validate().is_err());
        config.key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_paths() {
        let file = PersistConfig {
            backend: Backend::File,
            ..Default::default()
        };
        assert!(file.resolved_path().ends_with("root.json"));
        assert!(PersistConfig::default().resolved_path().ends_with("persist.db"));
    }
}
