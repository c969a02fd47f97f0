//! Startup sequence: load the stored snapshot, migrate it, save it back
//!
//! The runner never recovers from a failed migration. Whether such a failure
//! aborts startup or discards the snapshot is decided here by the configured
//! [`RecoveryPolicy`]; snapshots written by a newer build are handled by the
//! [`DowngradePolicy`].

use crate::config::{Backend, PersistConfig};
use crate::sqlite_store::SqliteSnapshotStore;
use crate::store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use wallet_state_core::{
    MigrationContext, MigrationRegistry, MigrationReport, MigrationRunner, PersistedState,
};

/// What to do when the stored snapshot cannot be loaded or migrated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Back up and clear the snapshot, start from the application defaults
    ResetToDefault,
}

/// What to do with a snapshot written by a newer build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DowngradePolicy {
    /// Log an error and hand the snapshot through untouched
    #[default]
    KeepAsIs,
    /// Back up and clear the snapshot, start from the application defaults
    Reset,
}

/// How startup went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// Nothing was persisted
    Fresh,
    /// Snapshot already at the target version
    Current {
        /// Stored version
        version: i64,
    },
    /// Snapshot migrated and saved back
    Migrated {
        /// Steps applied
        report: MigrationReport,
    },
    /// Snapshot from a newer build, kept as is
    KeptNewer {
        /// Stored version
        found: i64,
        /// Target version of this build
        latest: i64,
    },
    /// Snapshot discarded
    Reset {
        /// Why it was discarded
        reason: String,
        /// Whether the store kept a backup
        backed_up: bool,
    },
}

/// Result of a startup run
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    /// State to rehydrate from, `None` for application defaults
    pub state: Option<PersistedState>,
    /// How it was obtained
    pub outcome: BootstrapOutcome,
}

/// Startup sequence over a snapshot store
#[derive(Debug, Clone, Copy)]
pub struct Bootstrap<'a> {
    runner: MigrationRunner<'a>,
    recovery: RecoveryPolicy,
    downgrade: DowngradePolicy,
}

impl Bootstrap<'static> {
    /// Built-in registry, latest version, default policies
    pub fn new() -> Self {
        Self::with_runner(MigrationRunner::new())
    }

    /// Settings taken from a config
    pub fn from_config(config: &PersistConfig) -> Self {
        let runner = MigrationRunner::with_registry(MigrationRegistry::builtin(), config.version);
        Self::with_runner(runner)
            .with_recovery(config.recovery)
            .with_downgrade(config.downgrade)
    }
}

impl Default for Bootstrap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Bootstrap<'a> {
    /// Use a custom runner
    pub fn with_runner(runner: MigrationRunner<'a>) -> Self {
        Self {
            runner,
            recovery: RecoveryPolicy::default(),
            downgrade: DowngradePolicy::default(),
        }
    }

    /// Set the recovery policy
    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    /// Set the downgrade policy
    pub fn with_downgrade(mut self, downgrade: DowngradePolicy) -> Self {
        self.downgrade = downgrade;
        self
    }

    /// Load, migrate and save back the snapshot of `store`
    pub fn run(
        &self,
        store: &dyn SnapshotStore,
        ctx: &MigrationContext,
    ) -> Result<BootstrapResult> {
        let loaded = match store.load() {
            Ok(loaded) => loaded,
            Err(e) => return self.recover(store, None, e),
        };
        let Some(state) = loaded else {
            tracing::info!("No persisted state in {}, starting fresh", store.describe());
            return Ok(BootstrapResult {
                state: None,
                outcome: BootstrapOutcome::Fresh,
            });
        };

        let version = match state.version() {
            Ok(version) => version,
            Err(e) => return self.recover(store, Some(&state), e.into()),
        };
        let target = self.runner.target_version();
        if version > target {
            tracing::error!(
                "Persisted state version {} is newer than this build ({}), downgrade policy {:?}",
                version,
                target,
                self.downgrade
            );
            return match self.downgrade {
                DowngradePolicy::KeepAsIs => Ok(BootstrapResult {
                    state: Some(state),
                    outcome: BootstrapOutcome::KeptNewer {
                        found: version,
                        latest: target,
                    },
                }),
                DowngradePolicy::Reset => {
                    let reason = format!("version {version} is newer than {target}");
                    self.reset(store, Some(&state), reason)
                }
            };
        }

        let backup = (self.recovery == RecoveryPolicy::ResetToDefault).then(|| state.clone());
        let (migrated, report) = match self.runner.migrate_state(state, ctx) {
            Ok(migrated) => migrated,
            Err(e) => return self.recover(store, backup.as_ref(), e.into()),
        };

        if report.is_noop() {
            return Ok(BootstrapResult {
                state: Some(migrated),
                outcome: BootstrapOutcome::Current { version },
            });
        }
        store.save(&migrated)?;
        tracing::info!(
            "Persisted state in {} migrated from {} to {}",
            store.describe(),
            report.from_version,
            report.to_version
        );
        Ok(BootstrapResult {
            state: Some(migrated),
            outcome: BootstrapOutcome::Migrated { report },
        })
    }

    fn recover(
        &self,
        store: &dyn SnapshotStore,
        state: Option<&PersistedState>,
        err: Error,
    ) -> Result<BootstrapResult> {
        match self.recovery {
            RecoveryPolicy::ResetToDefault if err.is_recoverable_by_reset() => {
                tracing::warn!("Discarding persisted state in {}: {}", store.describe(), err);
                self.reset(store, state, err.to_string())
            }
            _ => Err(err),
        }
    }

    fn reset(
        &self,
        store: &dyn SnapshotStore,
        state: Option<&PersistedState>,
        reason: String,
    ) -> Result<BootstrapResult> {
        let backed_up = match state {
            Some(state) => store.backup(state, &reason)?,
            None => store.backup_stored(&reason)?,
        };
        store.clear()?;
        Ok(BootstrapResult {
            state: None,
            outcome: BootstrapOutcome::Reset { reason, backed_up },
        })
    }
}

/// Open the store a config describes
pub fn open_store(config: &PersistConfig) -> Result<Box<dyn SnapshotStore>> {
    config.validate()?;
    let store: Box<dyn SnapshotStore> = match config.backend {
        Backend::Memory => Box::new(MemorySnapshotStore::new()),
        Backend::File => Box::new(FileSnapshotStore::new(config.resolved_path())),
        Backend::Sqlite => Box::new(SqliteSnapshotStore::open(
            config.resolved_path(),
            config.key.clone(),
        )?),
    };
    tracing::info!("Opened snapshot store: {}", store.describe());
    Ok(store)
}
