use crate::state::omit;
use crate::{MigrationContext, PersistedState, Result};
use serde_json::{json, Value};
use wallet_state_params::{
    FinclusiveKycStatus, PaymentDeepLinkHandler, RemoteConfigDefaults,
    DEFAULT_SENTRY_NETWORK_ERRORS,
};

const RETIRED_REWARDS_FIELDS: [&str; 5] = [
    "rewardsPercent",
    "rewardsStartDate",
    "rewardsMax",
    "rewardsMin",
    "rewardsABTestThreshold",
];

/// v30: network errors Sentry should ignore
pub fn add_sentry_network_errors(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("app", "sentryNetworkErrors", json!(DEFAULT_SENTRY_NETWORK_ERRORS));
    Ok(state)
}

/// v31: biometry settings, and the PIN flag leaves `account`
pub fn add_biometry_settings(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.with_slice("app", |app| {
        app.insert("biometryEnabled".to_string(), Value::Bool(false));
        app.insert("supportedBiometryType".to_string(), Value::Null);
    });
    state.omit_fields("account", &["isSettingPin"]);
    Ok(state)
}

/// v32: no bank account linked yet
pub fn add_linked_bank_account(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("account", "hasLinkedBankAccount", Value::Bool(false));
    Ok(state)
}

/// v33: verification migration has not run
pub fn add_verification_migration_marker(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("app", "ranVerificationMigrationAt", Value::Null);
    Ok(state)
}

/// v34: rewards settings are replaced by supercharge settings
pub fn rewards_to_supercharge(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let defaults = RemoteConfigDefaults::standard();
    state.with_slice("app", |app| {
        app.insert("superchargeApy".to_string(), json!(defaults.supercharge_apy));
        app.insert("superchargeTokens".to_string(), json!([]));
        omit(app, &RETIRED_REWARDS_FIELDS);
    });
    Ok(state)
}

/// v36: KYC status and recent dapps
pub fn add_kyc_and_recent_dapps(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field(
        "account",
        "finclusiveKycStatus",
        json!(FinclusiveKycStatus::NotSubmitted.as_u64()),
    );
    state.with_slice("app", |app| {
        app.insert("maxNumRecentDapps".to_string(), json!(0));
        app.insert("recentDapps".to_string(), json!([]));
    });
    Ok(state)
}

/// v37: price change indicator, remote config default
pub fn add_price_change_indicator(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let defaults = RemoteConfigDefaults::standard();
    state.set_field(
        "app",
        "showPriceChangeIndicatorInBalances",
        Value::Bool(defaults.show_price_change_indicator_in_balances),
    );
    Ok(state)
}

/// v38: verification is not skipped
pub fn add_skip_verification(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("app", "skipVerification", Value::Bool(false));
    Ok(state)
}

/// v39: payment deep links are ignored until a handler is configured
pub fn add_payment_deep_link_handler(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field(
        "app",
        "paymentDeepLinkHandler",
        json!(PaymentDeepLinkHandler::Disabled.as_str()),
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::test_support::{ctx, state};

    #[test]
    fn test_add_sentry_network_errors() {
        let out = add_sentry_network_errors(state(json!({"app": {}})), &ctx()).unwrap();
        assert_eq!(
            out.get_path("app.sentryNetworkErrors"),
            Some(&json!(["network request failed", "The network connection was lost"]))
        );
    }

    #[test]
    fn test_add_biometry_settings() {
        let input = state(json!({
            "app": {},
            "account": {"isSettingPin": true, "pincodeType": "CustomPin"},
        }));
        let out = add_biometry_settings(input, &ctx()).unwrap();
        assert_eq!(
            out.slice("app"),
            Some(&json!({"biometryEnabled": false, "supportedBiometryType": null}))
        );
        assert_eq!(out.slice("account"), Some(&json!({"pincodeType": "CustomPin"})));
    }

    #[test]
    fn test_account_and_app_flags() {
        let out = add_linked_bank_account(state(json!({})), &ctx()).unwrap();
        let out = add_verification_migration_marker(out, &ctx()).unwrap();
        let out = add_skip_verification(out, &ctx()).unwrap();
        let out = add_payment_deep_link_handler(out, &ctx()).unwrap();
        assert_eq!(
            out.into_value(),
            json!({
                "account": {"hasLinkedBankAccount": false},
                "app": {
                    "ranVerificationMigrationAt": null,
                    "skipVerification": false,
                    "paymentDeepLinkHandler": "",
                },
            })
        );
    }

    #[test]
    fn test_rewards_to_supercharge() {
        let input = state(json!({
            "app": {
                "rewardsPercent": 5,
                "rewardsStartDate": 1622505600000i64,
                "rewardsMax": 1000,
                "rewardsMin": 10,
                "rewardsABTestThreshold": "0xffffffffffffffffffffffffffffffffffffffff",
                "locked": false,
            }
        }));
        let out = rewards_to_supercharge(input, &ctx()).unwrap();
        assert_eq!(
            out.slice("app"),
            Some(&json!({"locked": false, "superchargeApy": 25, "superchargeTokens": []}))
        );
    }

    #[test]
    fn test_add_kyc_and_recent_dapps() {
        let input = state(json!({"account": {"dailyLimitCusd": 1000}, "app": {}}));
        let out = add_kyc_and_recent_dapps(input, &ctx()).unwrap();
        assert_eq!(
            out.slice("account"),
            Some(&json!({"dailyLimitCusd": 1000, "finclusiveKycStatus": 0}))
        );
        assert_eq!(out.slice("app"), Some(&json!({"maxNumRecentDapps": 0, "recentDapps": []})));
    }

    #[test]
    fn test_add_price_change_indicator() {
        let input = state(json!({"app": {"showPriceChangeIndicatorInBalances": true}}));
        let out = add_price_change_indicator(input, &ctx()).unwrap();
        assert_eq!(
            out.get_path("app.showPriceChangeIndicatorInBalances"),
            Some(&json!(false))
        );
    }
}
