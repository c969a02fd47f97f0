//! Migration registry
//!
//! The built-in table lists every step in version order. Position `i` holds
//! the step for version `i`, which upgrades a snapshot of version `i - 1`.
//! Density of the table is asserted at compile time, so a missing or
//! misplaced entry fails the build.

use crate::steps;
use crate::{MigrationContext, MigrationError, PersistedState, Result, UNVERSIONED};
use std::fmt;

/// Signature of a migration step
pub type MigrationFn = fn(PersistedState, &MigrationContext) -> Result<PersistedState>;

/// Migration definition
#[derive(Clone, Copy)]
pub struct Migration {
    /// Version this step produces
    pub version: i64,
    /// Human-readable description
    pub description: &'static str,
    /// Migration function
    pub up: MigrationFn,
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

const fn step(version: i64, description: &'static str, up: MigrationFn) -> Migration {
    Migration {
        version,
        description,
        up,
    }
}

/// Number of built-in steps
pub const MIGRATION_COUNT: usize = 52;

/// All built-in migrations in version order
pub const MIGRATIONS: [Migration; MIGRATION_COUNT] = [
    step(0, "Map each phone number to a list of addresses", steps::wrap_e164_addresses),
    step(1, "Expand invitees into invite records", steps::expand_invitees),
    step(2, "Reset phone number verification", steps::reset_number_verified),
    step(3, "Clear recent payments, flag BIP39 migration", steps::clear_recent_payments),
    step(4, "Clear accepted attestation codes", steps::clear_accepted_attestation_codes),
    step(5, "Split out payment requests, rename comment key", steps::split_payment_requests),
    step(6, "Derive invite redemption from the web3 account", steps::mark_invite_redeemed),
    step(7, "Expand display names into name/image records", steps::expand_display_names),
    step(8, "Store the last used provider by id", steps::last_used_provider_to_id),
    step(9, "Raise daily limits to the legacy default", steps::raise_daily_limit),
    step(10, "Remove feeless verification state", steps::drop_feeless_verification),
    step(11, "Remove retired cash-in provider flags", steps::drop_cash_in_flags),
    step(12, "Reset exchange rate history", steps::reset_exchange_history),
    step(13, "Move attestation state into verify", steps::move_attestations_to_verify),
    step(14, "Add user location data", steps::add_user_location),
    step(15, "Move attestation state back into identity", steps::move_attestations_to_identity),
    step(16, "Track rates and balances per currency, reset escrow", steps::per_currency_balances),
    step(17, "Forget the last used provider", steps::drop_last_used_provider),
    step(18, "Nest WalletConnect state under v2", steps::nest_wallet_connect_v2),
    step(19, "Repair empty WalletConnect v2 state", steps::repair_wallet_connect_v2),
    step(20, "No schema change", steps::keep_unchanged),
    step(21, "No schema change", steps::keep_unchanged),
    step(22, "Move language into i18n", steps::move_language_to_i18n),
    step(23, "No schema change", steps::keep_unchanged),
    step(24, "Remove invite state", steps::drop_invite),
    step(25, "Add Sentry trace sample rate", steps::add_sentry_sample_rate),
    step(26, "Add cash-in button experiment flag", steps::add_ramp_cash_in_flag),
    step(27, "Add supercharge button type", steps::add_supercharge_button_type),
    step(28, "Add dapp list URL", steps::add_dapp_list_url),
    step(29, "Force forno mode", steps::force_forno_mode),
    step(30, "Add Sentry network errors", steps::add_sentry_network_errors),
    step(31, "Add biometry settings", steps::add_biometry_settings),
    step(32, "Add linked bank account flag", steps::add_linked_bank_account),
    step(33, "Add verification migration marker", steps::add_verification_migration_marker),
    step(34, "Replace rewards settings with supercharge settings", steps::rewards_to_supercharge),
    step(35, "No schema change", steps::keep_unchanged),
    step(36, "Add KYC status and recent dapps", steps::add_kyc_and_recent_dapps),
    step(37, "Add price change indicator setting", steps::add_price_change_indicator),
    step(38, "Add skip verification flag", steps::add_skip_verification),
    step(39, "Add payment deep link handler", steps::add_payment_deep_link_handler),
    step(40, "Remove stale fields", steps::remove_stale_fields),
    step(41, "No schema change", steps::keep_unchanged),
    step(42, "Add skip profile picture setting", steps::add_skip_profile_picture),
    step(43, "No schema change", steps::keep_unchanged),
    step(44, "Add banking partner region support", steps::add_finclusive_region_support),
    step(45, "No schema change", steps::keep_unchanged),
    step(46, "Remove cloud functions state", steps::drop_cloud_functions_api),
    step(47, "Remove multi-token rollout flags", steps::drop_multi_token_flags),
    step(48, "Add available supercharge rewards", steps::add_available_rewards),
    step(49, "Add supercharge banner dismissals", steps::add_supercharge_dismissals),
    step(50, "Remove WalletConnect v2 state", steps::drop_wallet_connect_v2),
    step(51, "Add CELO withdrawal flag", steps::add_celo_withdrawal_flag),
];

/// Version every snapshot is migrated to
pub const LATEST_VERSION: i64 = MIGRATIONS[MIGRATION_COUNT - 1].version;

const _: () = assert!(is_dense(&MIGRATIONS), "migration table must be dense");

static BUILTIN: [Migration; MIGRATION_COUNT] = MIGRATIONS;

/// Whether entry `i` of `migrations` carries version `i` for every `i`
pub const fn is_dense(migrations: &[Migration]) -> bool {
    let mut i = 0;
    while i < migrations.len() {
        if migrations[i].version != i as i64 {
            return false;
        }
        i += 1;
    }
    true
}

/// Ordered, gap-free set of migration steps
#[derive(Debug, Clone, Copy)]
pub struct MigrationRegistry<'a> {
    migrations: &'a [Migration],
}

impl MigrationRegistry<'static> {
    /// The registry shipped with this build
    pub fn builtin() -> Self {
        Self {
            migrations: &BUILTIN,
        }
    }
}

impl Default for MigrationRegistry<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> MigrationRegistry<'a> {
    /// Create a registry from a custom table, rejecting gaps
    pub fn new(migrations: &'a [Migration]) -> Result<Self> {
        let registry = Self { migrations };
        registry.verify()?;
        Ok(registry)
    }

    /// Check that entry `i` carries version `i`
    pub fn verify(&self) -> Result<()> {
        for (expected, migration) in (0i64..).zip(self.migrations) {
            if migration.version != expected {
                return Err(MigrationError::RegistryGap {
                    expected,
                    found: migration.version,
                });
            }
        }
        Ok(())
    }

    /// Highest registered version ([`UNVERSIONED`] for an empty table)
    pub fn latest_version(&self) -> i64 {
        self.migrations
            .last()
            .map_or(UNVERSIONED, |migration| migration.version)
    }

    /// Step producing `version`
    pub fn get(&self, version: i64) -> Option<&'a Migration> {
        let index = usize::try_from(version).ok()?;
        self.migrations
            .get(index)
            .filter(|migration| migration.version == version)
    }

    /// Steps that take a snapshot of version `from` to version `to`
    ///
    /// Empty when `from >= to`. Fails with
    /// [`MigrationError::MissingMigration`] when `to` is past the table.
    pub fn pending(&self, from: i64, to: i64) -> Result<&'a [Migration]> {
        if from >= to {
            return Ok(&[]);
        }
        if to > self.latest_version() {
            return Err(MigrationError::MissingMigration {
                version: (self.latest_version() + 1).max(from + 1),
            });
        }
        let start = usize::try_from(from + 1).unwrap_or(0);
        let end = usize::try_from(to + 1).unwrap_or(0);
        Ok(&self.migrations[start..end])
    }

    /// Iterate over all steps in version order
    pub fn iter(&self) -> impl Iterator<Item = &'a Migration> {
        self.migrations.iter()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
