//! Migration runner
//!
//! Applies the pending steps of a registry to a snapshot, strictly in
//! ascending version order, each output feeding the next step.

use crate::{MigrationContext, MigrationError, MigrationRegistry, PersistedState, Result};
use crate::{LATEST_VERSION, UNVERSIONED};
use serde::Serialize;

/// What a migration run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Version of the inbound snapshot
    pub from_version: i64,
    /// Version of the outbound snapshot
    pub to_version: i64,
    /// Versions of the steps applied, in order
    pub applied: Vec<i64>,
}

impl MigrationReport {
    fn unchanged(version: i64) -> Self {
        Self {
            from_version: version,
            to_version: version,
            applied: Vec::new(),
        }
    }

    /// Whether no step ran
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    /// Number of steps applied
    pub fn steps_applied(&self) -> usize {
        self.applied.len()
    }
}

/// Runs a registry up to a target version
#[derive(Debug, Clone, Copy)]
pub struct MigrationRunner<'a> {
    registry: MigrationRegistry<'a>,
    target_version: i64,
}

impl MigrationRunner<'static> {
    /// Runner over the built-in registry, targeting [`LATEST_VERSION`]
    pub fn new() -> Self {
        Self {
            registry: MigrationRegistry::builtin(),
            target_version: LATEST_VERSION,
        }
    }
}

impl Default for MigrationRunner<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MigrationRunner<'a> {
    /// Runner over a custom registry and target
    ///
    /// A target past the registry is accepted here and reported as
    /// [`MigrationError::MissingMigration`] by the first run that needs it.
    pub fn with_registry(registry: MigrationRegistry<'a>, target_version: i64) -> Self {
        Self {
            registry,
            target_version,
        }
    }

    /// Version snapshots are migrated to
    pub fn target_version(&self) -> i64 {
        self.target_version
    }

    /// Registry in use
    pub fn registry(&self) -> &MigrationRegistry<'a> {
        &self.registry
    }

    /// Number of steps a snapshot of `version` needs
    pub fn pending_count(&self, version: i64) -> usize {
        let from = version.max(UNVERSIONED);
        usize::try_from(self.target_version.saturating_sub(from)).unwrap_or(0)
    }

    /// Migrate a snapshot loaded from storage
    ///
    /// `None` (nothing persisted) stays `None`.
    pub fn migrate(
        &self,
        state: Option<PersistedState>,
        ctx: &MigrationContext,
    ) -> Result<Option<(PersistedState, MigrationReport)>> {
        state.map(|state| self.migrate_state(state, ctx)).transpose()
    }

    /// Migrate a snapshot that is known to exist
    pub fn migrate_state(
        &self,
        state: PersistedState,
        ctx: &MigrationContext,
    ) -> Result<(PersistedState, MigrationReport)> {
        let from_version = state.version()?;
        let target = self.target_version;

        if from_version == target {
            tracing::debug!(version = from_version, "Snapshot already at target version");
            return Ok((state, MigrationReport::unchanged(from_version)));
        }
        if from_version > target {
            return Err(MigrationError::VersionAhead {
                found: from_version,
                latest: target,
            });
        }

        tracing::info!(from = from_version, to = target, "Migrating persisted state");
        let mut applied = Vec::new();
        let mut state = ((from_version + 1)..=target).try_fold(state, |state, version| {
            let migration = self
                .registry
                .get(version)
                .ok_or(MigrationError::MissingMigration { version })?;
            tracing::debug!(version, description = migration.description, "Applying migration");
            let next = (migration.up)(state, ctx).inspect_err(|e| {
                tracing::error!(version, error = %e, "Migration step failed");
            })?;
            applied.push(version);
            Ok::<_, MigrationError>(next)
        })?;
        state.set_version(target);

        tracing::info!(
            from = from_version,
            to = target,
            steps = applied.len(),
            "Persisted state migrated"
        );
        Ok((
            state,
            MigrationReport {
                from_version,
                to_version: target,
                applied,
            },
        ))
    }
}

/// Migrate a loaded snapshot with the built-in registry and the current time
pub fn migrate(state: Option<PersistedState>) -> Result<Option<PersistedState>> {
    let runner = MigrationRunner::new();
    let migrated = runner.migrate(state, &MigrationContext::now())?;
    Ok(migrated.map(|(state, _)| state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Migration;
    use crate::steps;
    use serde_json::json;

    fn state(value: serde_json::Value) -> PersistedState {
        PersistedState::from_value(value).unwrap()
    }

    fn ctx() -> MigrationContext {
        MigrationContext::at(0)
    }

    #[test]
    fn test_none_stays_none() {
        assert!(MigrationRunner::new().migrate(None, &ctx()).unwrap().is_none());
        assert!(migrate(None).unwrap().is_none());
    }

    #[test]
    fn test_current_snapshot_unchanged() {
        let input = state(json!({
            "app": {"x": 1},
            "_persist": {"version": 51, "rehydrated": true},
        }));
        let (out, report) = MigrationRunner::new().migrate_state(input.clone(), &ctx()).unwrap();
        assert_eq!(out, input);
        assert!(report.is_noop());
        assert_eq!(report.from_version, 51);
    }

    #[test]
    fn test_snapshot_ahead_is_rejected() {
        let input = state(json!({"_persist": {"version": 52}}));
        let err = MigrationRunner::new().migrate_state(input, &ctx()).unwrap_err();
        assert!(matches!(err, MigrationError::VersionAhead { found: 52, latest: 51 }));
    }

    #[test]
    fn test_version_below_unversioned_is_rejected() {
        let runner = MigrationRunner::new();
        for version in [-5, -(1_i64 << 62), i64::MIN] {
            let input = state(json!({"app": {}, "_persist": {"version": version}}));
            let err = runner.migrate_state(input, &ctx()).unwrap_err();
            assert!(matches!(err, MigrationError::InvalidSnapshot(_)), "version {version}: {err}");
            assert!(err.is_recoverable_by_reset());
        }
    }

    #[test]
    fn test_pending_count_saturates() {
        let runner = MigrationRunner::new();
        assert_eq!(runner.pending_count(UNVERSIONED), 52);
        assert_eq!(runner.pending_count(60), 0);
        assert_eq!(runner.pending_count(i64::MIN), 52);
    }

    #[test]
    fn test_daily_limit_scenario() {
        let input = state(json!({
            "account": {"dailyLimitCusd": 500},
            "app": {},
            "identity": {},
            "localCurrency": {},
            "stableToken": {},
            "web3": {},
            "exchange": {},
            "home": {},
            "_persist": {"version": 8},
        }));
        let (out, report) = MigrationRunner::new().migrate_state(input, &ctx()).unwrap();
        assert_eq!(out.get_path("account.dailyLimitCusd"), Some(&json!(1000)));
        assert_eq!(out.version().unwrap(), 51);
        assert_eq!(report.steps_applied(), 43);
        assert_eq!(report.applied.first(), Some(&9));
        assert_eq!(report.applied.last(), Some(&51));
    }

    #[test]
    fn test_rehydrated_flag_preserved() {
        let input = state(json!({"_persist": {"version": 50, "rehydrated": true}}));
        let (out, _) = MigrationRunner::new().migrate_state(input, &ctx()).unwrap();
        assert_eq!(out.slice("_persist"), Some(&json!({"version": 51, "rehydrated": true})));
    }

    #[test]
    fn test_malformed_input_names_step() {
        let input = state(json!({"app": {}, "_persist": {"version": 8}}));
        let err = MigrationRunner::new().migrate_state(input, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MalformedInput { version: 9, ref path } if path == "account"
        ));
    }

    #[test]
    fn test_custom_target() {
        let table: [Migration; 3] = [
            crate::registry::MIGRATIONS[0],
            crate::registry::MIGRATIONS[1],
            crate::registry::MIGRATIONS[2],
        ];
        let registry = MigrationRegistry::new(&table).unwrap();
        let runner = MigrationRunner::with_registry(registry, 1);
        let input = state(json!({
            "identity": {"e164NumberToAddress": {}},
            "invite": {"invitees": {}},
            "app": {"numberVerified": true},
        }));
        let (out, report) = runner.migrate_state(input, &ctx()).unwrap();
        assert_eq!(report.applied, vec![0, 1]);
        assert_eq!(out.get_path("app.numberVerified"), Some(&json!(true)));
        assert_eq!(out.version().unwrap(), 1);
    }

    #[test]
    fn test_target_past_registry() {
        let table = [crate::registry::MIGRATIONS[0]];
        let registry = MigrationRegistry::new(&table).unwrap();
        let runner = MigrationRunner::with_registry(registry, 1);
        let input = state(json!({"identity": {"e164NumberToAddress": {}}}));
        let err = runner.migrate_state(input, &ctx()).unwrap_err();
        assert!(matches!(err, MigrationError::MissingMigration { version: 1 }));

        let runner = MigrationRunner::with_registry(MigrationRegistry::builtin(), i64::MAX);
        let input = state(json!({"_persist": {"version": 51}}));
        let err = runner.migrate_state(input, &ctx()).unwrap_err();
        assert!(matches!(err, MigrationError::MissingMigration { version: 52 }));
    }

    #[test]
    fn test_identity_steps_only() {
        let table = [
            crate::registry::MIGRATIONS[0],
            Migration {
                version: 1,
                description: "No schema change",
                up: steps::keep_unchanged,
            },
        ];
        let registry = MigrationRegistry::new(&table).unwrap();
        let runner = MigrationRunner::with_registry(registry, 1);
        let input = state(json!({"app": {}, "_persist": {"version": 0}}));
        let (out, report) = runner.migrate_state(input, &ctx()).unwrap();
        assert_eq!(out.into_value(), json!({"app": {}, "_persist": {"version": 1}}));
        assert_eq!(report.applied, vec![1]);
    }
}
