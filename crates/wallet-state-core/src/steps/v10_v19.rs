use crate::state::{omit, set_opt};
use crate::{MigrationContext, PersistedState, Result};
use serde_json::{json, Map, Value};
use wallet_state_params::{exchange_initial_history, CodeInputStatus, Currency, VerificationStatus};

const FEELESS_IDENTITY_FIELDS: [&str; 8] = [
    "feelessAttestationCodes",
    "feelessProcessingInputCode",
    "feelessAcceptedAttestationCodes",
    "feelessNumCompleteAttestations",
    "feelessVerificationStatus",
    "verificationState",
    "feelessVerificationState",
    "feelessLastRevealAttempt",
];

const RETIRED_CASH_IN_FLAGS: [&str; 4] =
    ["pontoEnabled", "kotaniEnabled", "bitfyUrl", "flowBtcUrl"];

/// Attestation bookkeeping that moved from `identity` to `verify`
const IDENTITY_ATTESTATION_FIELDS: [&str; 7] = [
    "attestationCodes",
    "acceptedAttestationCodes",
    "attestationInputStatus",
    "numCompleteAttestations",
    "verificationStatus",
    "hasSeenVerificationNux",
    "lastRevealAttempt",
];

/// Attestation bookkeeping that moved back from `verify` to `identity`
const VERIFY_ATTESTATION_FIELDS: [&str; 6] = [
    "seenVerificationNux",
    "revealStatuses",
    "attestationCodes",
    "lastRevealAttempt",
    "acceptedAttestationCodes",
    "attestationInputStatus",
];

/// v10: remove the feeless verification experiment
pub fn drop_feeless_verification(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.omit_fields("identity", &FEELESS_IDENTITY_FIELDS);
    Ok(state)
}

/// v11: remove retired cash-in provider flags
pub fn drop_cash_in_flags(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.omit_fields("app", &RETIRED_CASH_IN_FLAGS);
    Ok(state)
}

/// v12: reset the exchange rate history, it tends to accumulate duplicates
pub fn reset_exchange_history(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("exchange", |exchange| {
        exchange.insert("history".to_string(), exchange_initial_history());
    });
    Ok(state)
}

/// v13: attestation state moves from `identity` into `verify`
pub fn move_attestations_to_verify(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let seen_nux = state
        .require_slice(13, "identity")?
        .get("hasSeenVerificationNux")
        .filter(|seen| !seen.is_null())
        .cloned()
        .unwrap_or(Value::Bool(false));

    state.omit_fields("identity", &IDENTITY_ATTESTATION_FIELDS);
    state.with_slice("verify", |verify| {
        omit(
            verify,
            &["TEMPORARY_override_withoutVerification", "withoutRevealing", "retries"],
        );
        verify.insert("seenVerificationNux".to_string(), seen_nux);
    });
    Ok(state)
}

/// v14: add the user location slot to network info
pub fn add_user_location(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("networkInfo", |network| {
        network.insert(
            "userLocationData".to_string(),
            json!({ "countryCodeAlpha2": null, "region": null, "ipAddress": null }),
        );
    });
    Ok(state)
}

/// v15: attestation state moves back into `identity`, reset to its initial values
pub fn move_attestations_to_identity(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let seen_nux = state
        .require_slice(15, "verify")?
        .get("seenVerificationNux")
        .cloned();

    state.with_slice("identity", |identity| {
        identity.insert("attestationsCode".to_string(), json!([]));
        identity.insert("acceptedAttestationCodes".to_string(), json!([]));
        identity.insert(
            "attestationInputStatus".to_string(),
            CodeInputStatus::initial_inputs(),
        );
        identity.insert("numCompleteAttestations".to_string(), json!(0));
        identity.insert(
            "verificationStatus".to_string(),
            Value::from(VerificationStatus::Stopped.as_i64()),
        );
        set_opt(identity, "hasSeenVerificationNux", seen_nux);
        identity.insert("lastRevealAttempt".to_string(), Value::Null);
    });
    state.with_slice("verify", |verify| {
        omit(verify, &VERIFY_ATTESTATION_FIELDS);
        verify.remove("TEMPORARY_override_withoutVerification");
        verify.insert("withoutRevealing".to_string(), Value::Bool(false));
        verify.insert("retries".to_string(), json!(0));
    });
    Ok(state)
}

/// v16: single-currency rate and balance become per-currency maps
pub fn per_currency_balances(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let rate = state
        .require_slice(16, "localCurrency")?
        .get("exchangeRate")
        .cloned();
    let balance = state
        .require_slice(16, "stableToken")?
        .get("balance")
        .cloned();

    state.with_slice("localCurrency", |local| {
        local.remove("exchangeRate");
        let mut rates = Map::new();
        set_opt(&mut rates, Currency::Dollar.code(), rate);
        rates.insert(Currency::Euro.code().to_string(), Value::Null);
        rates.insert(Currency::Celo.code().to_string(), Value::Null);
        local.insert("exchangeRates".to_string(), Value::Object(rates));
    });
    state.with_slice("stableToken", |token| {
        token.remove("balance");
        let mut balances = Map::new();
        set_opt(&mut balances, Currency::Dollar.code(), balance);
        balances.insert(Currency::Euro.code().to_string(), Value::Null);
        token.insert("balances".to_string(), Value::Object(balances));
    });
    state.set_slice(
        "escrow",
        json!({ "isReclaiming": false, "sentEscrowedPayments": [] }),
    );
    Ok(state)
}

/// v17: forget the last used provider
pub fn drop_last_used_provider(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.omit_fields("fiatExchanges", &["lastUsedProvider"]);
    Ok(state)
}

/// v18: WalletConnect state moves under `v2`, pairings are dropped
pub fn nest_wallet_connect_v2(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let mut v2 = match state.remove_slice("walletConnect") {
        Some(Value::Object(wallet_connect)) => wallet_connect,
        _ => Map::new(),
    };
    v2.remove("pairings");
    state.set_slice("walletConnect", json!({ "v2": v2 }));
    Ok(state)
}

/// v19: undo an empty `v2` left behind by v18 when WalletConnect was absent
pub fn repair_wallet_connect_v2(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    if !has_wallet_connect_sessions(&state) {
        state.omit_fields("walletConnect", &["v2"]);
    }
    Ok(state)
}

/// Whether `walletConnect.v2.sessions` is defined
pub(crate) fn has_wallet_connect_sessions(state: &PersistedState) -> bool {
    state
        .slice("walletConnect")
        .and_then(|wallet_connect| wallet_connect.get("v2"))
        .and_then(|v2| v2.get("sessions"))
        .is_some()
}
