use crate::state::{is_truthy, set_opt};
use crate::{MigrationContext, MigrationError, PersistedState, Result};
use serde_json::{json, Map, Value};
use wallet_state_params::{ProviderList, DEFAULT_DAILY_PAYMENT_LIMIT_CUSD_LEGACY};

/// Key/value pairs of a persisted map
///
/// Arrays count as maps keyed by index. Anything else is not a map.
fn map_entries(value: Value) -> Option<Vec<(String, Value)>> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect(),
        ),
        _ => None,
    }
}

/// v0: every phone number may map to several addresses
pub fn wrap_e164_addresses(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(0, "identity")?;
    state.with_slice("identity", |identity| {
        let entries = identity
            .remove("e164NumberToAddress")
            .and_then(map_entries)
            .ok_or_else(|| MigrationError::malformed(0, "identity.e164NumberToAddress"))?;
        let wrapped: Map<String, Value> = entries
            .into_iter()
            .map(|(e164, address)| (e164, Value::Array(vec![address])))
            .collect();
        identity.insert("e164NumberToAddress".to_string(), Value::Object(wrapped));
        Ok::<(), MigrationError>(())
    })?;
    Ok(state)
}

/// v1: invitees become full records instead of an address -> phone map
pub fn expand_invitees(
    mut state: PersistedState,
    ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(1, "invite")?;
    let timestamp = ctx.now_ms();
    state.with_slice("invite", |invite| {
        let entries = invite
            .remove("invitees")
            .and_then(map_entries)
            .ok_or_else(|| MigrationError::malformed(1, "invite.invitees"))?;
        let records = entries
            .into_iter()
            .map(|(address, e164)| {
                json!({
                    "timestamp": timestamp,
                    "e164Number": e164,
                    "tempWalletAddress": address,
                    "tempWalletPrivateKey": "fakePrivateKey",
                    "tempWalletRedeemed": false,
                    "inviteCode": "fakeInviteCode",
                    "inviteLink": "fakeInviteLink",
                })
            })
            .collect();
        invite.insert("invitees".to_string(), Value::Array(records));
        Ok::<(), MigrationError>(())
    })?;
    Ok(state)
}

/// v2: force re-verification of the phone number
pub fn reset_number_verified(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("app", |app| {
        app.insert("numberVerified".to_string(), Value::Bool(false));
    });
    Ok(state)
}

/// v3: clear recent payments and flag the BIP39 migration as pending
pub fn clear_recent_payments(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("send", |send| {
        send.insert("recentPayments".to_string(), json!([]));
    });
    state.with_slice("account", |account| {
        account.insert("hasMigratedToNewBip39".to_string(), Value::Bool(false));
    });
    Ok(state)
}

/// v4: drop accepted attestation codes
pub fn clear_accepted_attestation_codes(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("identity", |identity| {
        identity.insert("acceptedAttestationCodes".to_string(), json!([]));
    });
    Ok(state)
}

/// v5: payment requests get their own slice, the comment key is renamed
pub fn split_payment_requests(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(5, "account")?;
    state.require_slice(5, "web3")?;

    let (incoming, outgoing) = state.with_slice("account", |account| {
        (
            list_or_empty(account.remove("incomingPaymentRequests")),
            list_or_empty(account.remove("outgoingPaymentRequests")),
        )
    });
    state.set_slice(
        "paymentRequest",
        json!({
            "incomingPaymentRequests": incoming,
            "outgoingPaymentRequests": outgoing,
        }),
    );
    state.with_slice("web3", |web3| {
        let key = web3.remove("commentKey");
        set_opt(web3, "dataEncryptionKey", key);
    });
    Ok(state)
}

/// v6: an existing web3 account means the invite was redeemed
pub fn mark_invite_redeemed(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let redeemed = state
        .require_slice(6, "web3")?
        .get("account")
        .is_some_and(is_truthy);
    state.with_slice("invite", |invite| {
        invite.insert("redeemComplete".to_string(), Value::Bool(redeemed));
    });
    Ok(state)
}

/// v7: display names become `{ name, imageUrl }` records
///
/// A missing or falsy map becomes empty. Other non-map values are malformed.
pub fn expand_display_names(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(7, "identity")?;
    state.with_slice("identity", |identity| {
        let names = match identity.remove("addressToDisplayName") {
            None => Vec::new(),
            Some(value) if !is_truthy(&value) => Vec::new(),
            Some(value) => map_entries(value)
                .ok_or_else(|| MigrationError::malformed(7, "identity.addressToDisplayName"))?,
        };
        let expanded: Map<String, Value> = names
            .into_iter()
            .map(|(address, name)| (address, json!({ "name": name, "imageUrl": null })))
            .collect();
        identity.insert("addressToDisplayName".to_string(), Value::Object(expanded));
        Ok::<(), MigrationError>(())
    })?;
    Ok(state)
}

/// v8: the last used provider is stored by id instead of display info
pub fn last_used_provider_to_id(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let name = state
        .slice("fiatExchanges")
        .and_then(|fiat| fiat.get("lastUsedProvider"))
        .filter(|provider| is_truthy(provider))
        .and_then(|provider| provider.get("name"))
        .filter(|name| is_truthy(name))
        .cloned();
    let Some(name) = name else {
        return Ok(state);
    };
    let name = name
        .as_str()
        .ok_or_else(|| MigrationError::malformed(8, "fiatExchanges.lastUsedProvider.name"))?;

    let provider_id = ProviderList::legacy()
        .find_by_name(name)
        .map(|provider| Value::String(provider.name.clone()))
        .unwrap_or(Value::Null);
    state.with_slice("fiatExchanges", |fiat| {
        fiat.insert("lastUsedProvider".to_string(), provider_id);
    });
    Ok(state)
}

/// v9: raise daily limits below the legacy default to that default
pub fn raise_daily_limit(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let legacy = DEFAULT_DAILY_PAYMENT_LIMIT_CUSD_LEGACY;
    let current = state
        .require_slice(9, "account")?
        .get("dailyLimitCusd")
        .and_then(numeric);
    if current.is_some_and(|limit| limit >= legacy as f64) {
        return Ok(state);
    }
    state.with_slice("account", |account| {
        account.insert("dailyLimitCusd".to_string(), Value::from(legacy));
    });
    Ok(state)
}

/// Truthy value, or a fresh empty list
fn list_or_empty(value: Option<Value>) -> Value {
    value.filter(is_truthy).unwrap_or_else(|| json!([]))
}

/// Numeric reading of a stored amount (numbers and numeric strings)
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
