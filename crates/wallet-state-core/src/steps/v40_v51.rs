use super::v10_v19::has_wallet_connect_sessions;
use crate::state::omit;
use crate::{MigrationContext, PersistedState, Result};
use serde_json::{json, Map, Value};
use wallet_state_params::RemoteConfigDefaults;

/// Fields removed by the v40 cleanup, per slice
const STALE_FIELDS: [(&str, &[&str]); 10] = [
    (
        "account",
        &[
            "pincodeSet",
            "isSettingPin",
            "backupDelayedTime",
            "socialBackupCompleted",
            "incomingPaymentRequests",
            "outgoingPaymentRequests",
            "dismissedInviteFriends",
            "dismissedEarnRewards",
        ],
    ),
    (
        "app",
        &[
            "loading",
            "inviteCodeEntered",
            "error",
            "dismissErrorAfter",
            "language",
            "doingBackupFlow",
            "message",
            "dismissMessageAfter",
            "lockWithPinEnabled",
            "rewardsPercent",
            "rewardsStartDate",
            "rewardsMax",
            "rewardsMin",
            "rewardsABTestThreshold",
            "shortVerificationCodesEnabled",
            "walletConnectEnabled",
        ],
    ),
    ("escrow", &["suggestedFee"]),
    (
        "identity",
        &[
            "verificationFailed",
            "startedVerification",
            "isLoadingImportContacts",
            "contactMappingProgress",
            "attestationsCode",
        ],
    ),
    ("localCurrency", &["exchangeRate", "fetchRateFailed"]),
    ("recipients", &["recipientCache"]),
    ("send", &["recipientCache"]),
    ("stableToken", &["balance"]),
    ("tokens", &["lastSuccessfulFetch"]),
    ("web3", &["commentKey", "gasPriceLastUpdated", "contractKitReady"]),
];

const MULTI_TOKEN_FLAGS: [&str; 3] = [
    "multiTokenUseSendFlow",
    "multiTokenUseUpdatedFeed",
    "multiTokenShowHomeBalances",
];

/// v40: remove fields no reducer reads anymore
pub fn remove_stale_fields(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(40, "exchange")?;
    state.require_slice(40, "home")?;

    state.remove_slice("medianator");
    state.remove_slice("invite");
    for (slice, fields) in STALE_FIELDS {
        state.omit_fields(slice, fields);
    }

    state.with_slice("exchange", |exchange| {
        exchange.remove("exchangeRatePair");
        let mut history = match exchange.remove("history") {
            Some(Value::Object(history)) => history,
            _ => Map::new(),
        };
        history.remove("isLoading");
        exchange.insert("history".to_string(), Value::Object(history));
    });
    state.with_slice("home", |home| {
        if matches!(home.get("notifications"), Some(Value::Array(_))) {
            home.insert("notifications".to_string(), json!({}));
        }
    });

    if has_wallet_connect_sessions(&state) {
        state.with_slice("walletConnect", |_| ());
    } else {
        state.omit_fields("walletConnect", &["v2"]);
    }
    Ok(state)
}

/// v42: profile picture step, remote config default
pub fn add_skip_profile_picture(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let defaults = RemoteConfigDefaults::standard();
    state.set_field(
        "app",
        "skipProfilePicture",
        Value::Bool(defaults.skip_profile_picture),
    );
    Ok(state)
}

/// v44: banking partner region support
pub fn add_finclusive_region_support(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let defaults = RemoteConfigDefaults::standard();
    state.set_field("account", "finclusiveRegionSupported", Value::Bool(false));
    state.set_field(
        "app",
        "finclusiveUnsupportedStates",
        json!(defaults.finclusive_unsupported_states_list()),
    );
    Ok(state)
}

/// v46: the cloud functions slice is gone
pub fn drop_cloud_functions_api(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.remove_slice("cloudFunctionsApi");
    Ok(state)
}

/// v47: multi-token rollout flags are gone
pub fn drop_multi_token_flags(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.omit_fields("app", &MULTI_TOKEN_FLAGS);
    Ok(state)
}

/// v48: available supercharge rewards
pub fn add_available_rewards(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.remove_slice("cloudFunctionsApi");
    state.with_slice("supercharge", |supercharge| {
        supercharge.insert("fetchAvailableRewardsLoading".to_string(), Value::Bool(false));
        supercharge.insert("fetchAvailableRewardsError".to_string(), Value::Bool(false));
        supercharge.insert("availableRewards".to_string(), json!([]));
    });
    Ok(state)
}

/// v49: supercharge banners not dismissed
pub fn add_supercharge_dismissals(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("account", |account| {
        account.insert("dismissedKeepSupercharging".to_string(), Value::Bool(false));
        account.insert("dismissedStartSupercharging".to_string(), Value::Bool(false));
    });
    Ok(state)
}

/// v50: WalletConnect v2 state is dropped
pub fn drop_wallet_connect_v2(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("walletConnect", |wallet_connect| omit(wallet_connect, &["v2"]));
    Ok(state)
}

/// v51: CELO withdrawal from the exchange screen, remote config default
pub fn add_celo_withdrawal_flag(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let defaults = RemoteConfigDefaults::standard();
    state.set_field(
        "app",
        "celoWithdrawalEnabledInExchange",
        Value::Bool(defaults.celo_withdrawal_enabled_in_exchange),
    );
    Ok(state)
}
