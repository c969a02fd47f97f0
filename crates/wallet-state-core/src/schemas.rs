//! Canonical snapshots of every schema version
//!
//! The unversioned snapshot is written out in full. Each later version is
//! described as the edit that turns its predecessor into it, restated by hand
//! rather than derived from the step functions, so that running a step over
//! the previous snapshot and comparing against the next one checks the step.
//!
//! Steps that stamp records read the clock from [`MigrationContext`]; run them
//! with [`fixture_context`] to reproduce these snapshots exactly.

use crate::{MigrationContext, PersistedState, LATEST_VERSION, UNVERSIONED};
use serde_json::{json, Map, Value};

/// Clock used by the snapshots
pub const FIXTURE_NOW_MS: i64 = 1_596_502_618_000;

/// Wallet account address
pub const ACCOUNT: &str = "0x0000000000000000000000000000000000007E57";
/// Verified phone number of the account
pub const PHONE: &str = "+14155556666";
/// Address of a saved contact
pub const CONTACT: &str = "0x0000000000000000000000000000000000007E58";
/// Temporary wallet created for a pending invite
pub const TEMP_WALLET: &str = "0x0000000000000000000000000000000000001234";
/// Phone number of the invitee
pub const INVITEE_PHONE: &str = "+14155550000";
/// Legacy comment key, later the data encryption key
pub const COMMENT_KEY: &str = "0x0000000000000000000000000000000000008F68";

/// Context whose clock matches the snapshots
pub fn fixture_context() -> MigrationContext {
    MigrationContext::at(FIXTURE_NOW_MS)
}

/// The unversioned snapshot
pub fn v_neg1() -> PersistedState {
    let value = json!({
        "app": {
            "inviteCodeEntered": false,
            "loggedIn": false,
            "numberVerified": true,
            "error": null,
            "dismissErrorAfter": null,
            "language": "es-419",
            "doingBackupFlow": false,
            "message": null,
            "dismissMessageAfter": null,
            "analyticsEnabled": true,
            "lockWithPinEnabled": false,
            "appState": "Active",
            "locked": false,
            "lastTimeBackgrounded": 0,
            "loading": false,
            "pontoEnabled": false,
            "kotaniEnabled": false,
            "bitfyUrl": null,
            "flowBtcUrl": null,
            "shortVerificationCodesEnabled": false,
            "walletConnectEnabled": false,
            "rewardsPercent": 5,
            "rewardsStartDate": 1_622_505_600_000i64,
            "rewardsMax": 1000,
            "rewardsMin": 10,
            "rewardsABTestThreshold": "0xffffffffffffffffffffffffffffffffffffffff",
            "multiTokenShowHomeBalances": false,
            "multiTokenUseSendFlow": false,
            "multiTokenUseUpdatedFeed": false,
        },
        "networkInfo": {"connected": true, "rehydrated": true},
        "send": {
            "isSending": false,
            "recentRecipients": [],
            "recentPayments": [{"timestamp": FIXTURE_NOW_MS, "amount": "100"}],
            "recipientCache": {},
        },
        "recipients": {"recipientCache": {}, "phoneRecipientCache": {}},
        "goldToken": {"balance": null, "educationCompleted": false, "lastFetch": null},
        "stableToken": {"balance": "150", "educationCompleted": false, "lastFetch": null},
        "home": {"loading": false, "notifications": []},
        "medianator": {"exchangeRate": "1"},
        "transactions": {"standbyTransactions": [], "standbyTransactionsLegacy": []},
        "web3": {
            "latestBlockNumber": 0,
            "account": ACCOUNT,
            "accountInWeb3Keystore": ACCOUNT,
            "commentKey": COMMENT_KEY,
            "gasPriceLastUpdated": 0,
            "fornoMode": false,
            "contractKitReady": true,
        },
        "geth": {"initialized": "INITIALIZED", "connected": true},
        "identity": {
            "attestationCodes": [],
            "numCompleteAttestations": 0,
            "verificationFailed": false,
            "addressToE164Number": {},
            "e164NumberToAddress": entry(PHONE, json!(ACCOUNT)),
            "e164NumberToSalt": {},
            "startedVerification": false,
            "askedContactsPermission": false,
            "isLoadingImportContacts": false,
            "acceptedAttestationCodes": [{"code": "code", "issuer": "issuer"}],
            "verificationStatus": 0,
            "hasSeenVerificationNux": true,
            "contactMappingProgress": {"current": 0, "total": 0},
            "addressToDisplayName": entry(CONTACT, json!("Jane Doe")),
            "feelessAttestationCodes": [],
            "feelessProcessingInputCode": false,
            "feelessVerificationStatus": 0,
            "verificationState": {"isLoading": false},
        },
        "verify": {
            "TEMPORARY_override_withoutVerification": false,
            "withoutRevealing": true,
            "retries": 2,
            "komenciAvailable": "UNKNOWN",
        },
        "account": {
            "name": "John Doe",
            "e164PhoneNumber": PHONE,
            "defaultCountryCode": "+1",
            "contactDetails": {"contactId": "contactId", "thumbnailPath": null},
            "pincodeType": "CustomPin",
            "pincodeSet": true,
            "isSettingPin": false,
            "backupCompleted": false,
            "backupDelayedTime": 0,
            "socialBackupCompleted": false,
            "incomingPaymentRequests": [{"id": "req-1", "amount": "5"}],
            "outgoingPaymentRequests": [],
            "dismissedInviteFriends": false,
            "dismissedEarnRewards": false,
            "dailyLimitCusd": 500,
            "acceptedTerms": true,
        },
        "invite": {
            "isSendingInvite": false,
            "isRedeemingInvite": false,
            "isSkippingInvite": false,
            "invitees": entry(TEMP_WALLET, json!(INVITEE_PHONE)),
            "redeemedTempAccountPrivateKey": "",
            "redeemComplete": false,
        },
        "escrow": {
            "isReclaiming": true,
            "sentEscrowedPayments": [{"paymentID": "0x1"}],
            "suggestedFee": null,
        },
        "localCurrency": {
            "isLoading": false,
            "exchangeRate": "1.33",
            "preferredCurrencyCode": "PHP",
            "fetchedCurrencyCode": "PHP",
            "fetchRateFailed": false,
        },
        "imports": {"isImportingWallet": false},
        "exchange": {
            "exchangeRatePair": null,
            "tobinTax": "0",
            "history": {"isLoading": false, "celoGoldExchangeRates": [], "lastTimeUpdated": 0},
        },
        "fiatExchanges": {
            "lastUsedProvider": {"name": "simplex", "icon": "https://example.com/simplex.jpg"},
            "txHashToProvider": {},
        },
        "walletConnect": {"pairings": [], "sessions": [], "pendingSessions": [], "pendingActions": []},
        "tokens": {
            "tokenBalances": {},
            "loading": false,
            "error": false,
            "lastSuccessfulFetch": FIXTURE_NOW_MS,
        },
        "cloudFunctionsApi": {},
        "supercharge": {"loading": false, "error": false},
    });
    match PersistedState::from_value(value) {
        Ok(state) => state,
        Err(_) => PersistedState::new(),
    }
}

/// Snapshot of `version`, `None` outside `-1..=LATEST_VERSION`
pub fn schema(version: i64) -> Option<PersistedState> {
    if !(UNVERSIONED..=LATEST_VERSION).contains(&version) {
        return None;
    }
    let mut value = v_neg1().into_value();
    for v in 0..=version {
        apply_edit(v, &mut value);
    }
    let mut state = PersistedState::from_value(value).ok()?;
    if version != UNVERSIONED {
        state.set_version(version);
    }
    Some(state)
}

/// Snapshot of [`LATEST_VERSION`]
pub fn latest() -> PersistedState {
    schema(LATEST_VERSION).unwrap_or_default()
}

fn apply_edit(version: i64, s: &mut Value) {
    match version {
        0 => set(s, "identity.e164NumberToAddress", entry(PHONE, json!([ACCOUNT]))),
        1 => set(
            s,
            "invite.invitees",
            json!([{
                "timestamp": FIXTURE_NOW_MS,
                "e164Number": INVITEE_PHONE,
                "tempWalletAddress": TEMP_WALLET,
                "tempWalletPrivateKey": "fakePrivateKey",
                "tempWalletRedeemed": false,
                "inviteCode": "fakeInviteCode",
                "inviteLink": "fakeInviteLink",
            }]),
        ),
        2 => set(s, "app.numberVerified", json!(false)),
        3 => {
            set(s, "send.recentPayments", json!([]));
            set(s, "account.hasMigratedToNewBip39", json!(false));
        }
        4 => set(s, "identity.acceptedAttestationCodes", json!([])),
        5 => {
            set(
                s,
                "paymentRequest",
                json!({
                    "incomingPaymentRequests": [{"id": "req-1", "amount": "5"}],
                    "outgoingPaymentRequests": [],
                }),
            );
            unset_all(s, "account", &["incomingPaymentRequests", "outgoingPaymentRequests"]);
            unset(s, "web3.commentKey");
            set(s, "web3.dataEncryptionKey", json!(COMMENT_KEY));
        }
        6 => set(s, "invite.redeemComplete", json!(true)),
        7 => set(
            s,
            "identity.addressToDisplayName",
            entry(CONTACT, json!({"name": "Jane Doe", "imageUrl": null})),
        ),
        8 => set(s, "fiatExchanges.lastUsedProvider", json!("Simplex")),
        9 => set(s, "account.dailyLimitCusd", json!(1000)),
        10 => unset_all(
            s,
            "identity",
            &[
                "feelessAttestationCodes",
                "feelessProcessingInputCode",
                "feelessVerificationStatus",
                "verificationState",
            ],
        ),
        11 => unset_all(s, "app", &["pontoEnabled", "kotaniEnabled", "bitfyUrl", "flowBtcUrl"]),
        12 => set(
            s,
            "exchange.history",
            json!({
                "celoGoldExchangeRates": [],
                "aggregatedExchangeRates": [],
                "granularity": 60,
                "range": 2_592_000_000i64,
                "lastTimeUpdated": 0,
            }),
        ),
        13 => {
            unset_all(
                s,
                "identity",
                &[
                    "attestationCodes",
                    "acceptedAttestationCodes",
                    "numCompleteAttestations",
                    "verificationStatus",
                    "hasSeenVerificationNux",
                ],
            );
            unset_all(
                s,
                "verify",
                &["TEMPORARY_override_withoutVerification", "withoutRevealing", "retries"],
            );
            set(s, "verify.seenVerificationNux", json!(true));
        }
        14 => set(
            s,
            "networkInfo.userLocationData",
            json!({"countryCodeAlpha2": null, "region": null, "ipAddress": null}),
        ),
        15 => {
            set(s, "identity.attestationsCode", json!([]));
            set(s, "identity.acceptedAttestationCodes", json!([]));
            set(
                s,
                "identity.attestationInputStatus",
                json!(["Inputting", "Disabled", "Disabled"]),
            );
            set(s, "identity.numCompleteAttestations", json!(0));
            set(s, "identity.verificationStatus", json!(0));
            set(s, "identity.hasSeenVerificationNux", json!(true));
            set(s, "identity.lastRevealAttempt", Value::Null);
            unset(s, "verify.seenVerificationNux");
            set(s, "verify.withoutRevealing", json!(false));
            set(s, "verify.retries", json!(0));
        }
        16 => {
            unset(s, "localCurrency.exchangeRate");
            set(
                s,
                "localCurrency.exchangeRates",
                json!({"cUSD": "1.33", "cEUR": null, "cGLD": null}),
            );
            unset(s, "stableToken.balance");
            set(s, "stableToken.balances", json!({"cUSD": "150", "cEUR": null}));
            set(s, "escrow", json!({"isReclaiming": false, "sentEscrowedPayments": []}));
        }
        17 => unset(s, "fiatExchanges.lastUsedProvider"),
        18 => set(
            s,
            "walletConnect",
            json!({"v2": {"sessions": [], "pendingSessions": [], "pendingActions": []}}),
        ),
        22 => {
            unset(s, "app.language");
            set(
                s,
                "i18n",
                json!({
                    "language": "es-419",
                    "allowOtaTranslations": false,
                    "otaTranslationsLastUpdate": 0,
                    "otaTranslationsAppVersion": "0",
                    "otaTranslationsLanguage": "",
                }),
            );
        }
        24 => unset(s, "invite"),
        25 => set(s, "app.sentryTracesSampleRate", json!(0.2)),
        26 => set(s, "app.rampCashInButtonExpEnabled", json!(false)),
        27 => set(s, "app.superchargeButtonType", json!("PILL_REWARDS")),
        28 => set(s, "app.dappListApiUrl", Value::Null),
        29 => {
            set(s, "web3.fornoMode", json!(true));
            set(s, "web3.hadFornoDisabled", json!(true));
        }
        30 => set(
            s,
            "app.sentryNetworkErrors",
            json!(["network request failed", "The network connection was lost"]),
        ),
        31 => {
            set(s, "app.biometryEnabled", json!(false));
            set(s, "app.supportedBiometryType", Value::Null);
            unset(s, "account.isSettingPin");
        }
        32 => set(s, "account.hasLinkedBankAccount", json!(false)),
        33 => set(s, "app.ranVerificationMigrationAt", Value::Null),
        34 => {
            set(s, "app.superchargeApy", json!(25));
            set(s, "app.superchargeTokens", json!([]));
            unset_all(
                s,
                "app",
                &[
                    "rewardsPercent",
                    "rewardsStartDate",
                    "rewardsMax",
                    "rewardsMin",
                    "rewardsABTestThreshold",
                ],
            );
        }
        36 => {
            set(s, "account.finclusiveKycStatus", json!(0));
            set(s, "app.maxNumRecentDapps", json!(0));
            set(s, "app.recentDapps", json!([]));
        }
        37 => set(s, "app.showPriceChangeIndicatorInBalances", json!(false)),
        38 => set(s, "app.skipVerification", json!(false)),
        39 => set(s, "app.paymentDeepLinkHandler", json!("")),
        40 => {
            unset(s, "medianator");
            unset_all(
                s,
                "account",
                &[
                    "pincodeSet",
                    "backupDelayedTime",
                    "socialBackupCompleted",
                    "dismissedInviteFriends",
                    "dismissedEarnRewards",
                ],
            );
            unset_all(
                s,
                "app",
                &[
                    "loading",
                    "inviteCodeEntered",
                    "error",
                    "dismissErrorAfter",
                    "doingBackupFlow",
                    "message",
                    "dismissMessageAfter",
                    "lockWithPinEnabled",
                    "shortVerificationCodesEnabled",
                    "walletConnectEnabled",
                ],
            );
            unset(s, "exchange.exchangeRatePair");
            set(s, "home.notifications", json!({}));
            unset_all(
                s,
                "identity",
                &[
                    "verificationFailed",
                    "startedVerification",
                    "isLoadingImportContacts",
                    "contactMappingProgress",
                    "attestationsCode",
                ],
            );
            unset(s, "localCurrency.fetchRateFailed");
            unset(s, "recipients.recipientCache");
            unset(s, "send.recipientCache");
            unset(s, "tokens.lastSuccessfulFetch");
            unset_all(s, "web3", &["gasPriceLastUpdated", "contractKitReady"]);
        }
        42 => set(s, "app.skipProfilePicture", json!(false)),
        44 => {
            set(s, "account.finclusiveRegionSupported", json!(false));
            set(s, "app.finclusiveUnsupportedStates", json!(["NY", "TX"]));
        }
        46 => unset(s, "cloudFunctionsApi"),
        47 => unset_all(
            s,
            "app",
            &[
                "multiTokenShowHomeBalances",
                "multiTokenUseSendFlow",
                "multiTokenUseUpdatedFeed",
            ],
        ),
        48 => {
            set(s, "supercharge.fetchAvailableRewardsLoading", json!(false));
            set(s, "supercharge.fetchAvailableRewardsError", json!(false));
            set(s, "supercharge.availableRewards", json!([]));
        }
        49 => {
            set(s, "account.dismissedKeepSupercharging", json!(false));
            set(s, "account.dismissedStartSupercharging", json!(false));
        }
        50 => unset(s, "walletConnect.v2"),
        51 => set(s, "app.celoWithdrawalEnabledInExchange", json!(true)),
        // 19, 20, 21, 23, 35, 41, 43, 45: schema unchanged
        _ => {}
    }
}

fn entry(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn split(path: &str) -> (Vec<&str>, &str) {
    match path.rsplit_once('.') {
        Some((parents, key)) => (parents.split('.').collect(), key),
        None => (Vec::new(), path),
    }
}

fn set(root: &mut Value, path: &str, value: Value) {
    let (parents, key) = split(path);
    let parent = parents.into_iter().fold(root, |node, segment| &mut node[segment]);
    parent[key] = value;
}

fn unset(root: &mut Value, path: &str) {
    let (parents, key) = split(path);
    let parent = parents
        .into_iter()
        .try_fold(root, |node, segment| node.get_mut(segment));
    if let Some(Value::Object(map)) = parent {
        map.remove(key);
    }
}

fn unset_all(root: &mut Value, slice: &str, fields: &[&str]) {
    for field in fields {
        unset(root, &format!("{slice}.{field}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MigrationRegistry;
    use crate::MigrationRunner;

    #[test]
    fn test_fixture_range() {
        assert!(schema(-2).is_none());
        assert!(schema(LATEST_VERSION + 1).is_none());
        assert_eq!(schema(UNVERSIONED).unwrap(), v_neg1());
        assert_eq!(v_neg1().version().unwrap(), UNVERSIONED);
        for version in 0..=LATEST_VERSION {
            assert_eq!(schema(version).unwrap().version().unwrap(), version);
        }
    }

    #[test]
    fn test_each_step_produces_next_fixture() {
        let ctx = fixture_context();
        for migration in MigrationRegistry::builtin().iter() {
            let previous = schema(migration.version - 1).unwrap();
            let mut migrated = (migration.up)(previous, &ctx).unwrap();
            migrated.set_version(migration.version);
            assert_eq!(
                migrated,
                schema(migration.version).unwrap(),
                "step {} ({}) does not reproduce its fixture",
                migration.version,
                migration.description
            );
        }
    }

    #[test]
    fn test_full_chain_reproduces_latest() {
        let (migrated, report) = MigrationRunner::new()
            .migrate_state(v_neg1(), &fixture_context())
            .unwrap();
        assert_eq!(report.steps_applied(), 52);
        assert_eq!(migrated, latest());
    }

    #[test]
    fn test_latest_fixture() {
        let expected = json!({
            "app": {
                "loggedIn": false,
                "numberVerified": false,
                "analyticsEnabled": true,
                "appState": "Active",
                "locked": false,
                "lastTimeBackgrounded": 0,
                "sentryTracesSampleRate": 0.2,
                "rampCashInButtonExpEnabled": false,
                "superchargeButtonType": "PILL_REWARDS",
                "dappListApiUrl": null,
                "sentryNetworkErrors": ["network request failed", "The network connection was lost"],
                "biometryEnabled": false,
                "supportedBiometryType": null,
                "ranVerificationMigrationAt": null,
                "superchargeApy": 25,
                "superchargeTokens": [],
                "maxNumRecentDapps": 0,
                "recentDapps": [],
                "showPriceChangeIndicatorInBalances": false,
                "skipVerification": false,
                "paymentDeepLinkHandler": "",
                "skipProfilePicture": false,
                "finclusiveUnsupportedStates": ["NY", "TX"],
                "celoWithdrawalEnabledInExchange": true,
            },
            "networkInfo": {
                "connected": true,
                "rehydrated": true,
                "userLocationData": {"countryCodeAlpha2": null, "region": null, "ipAddress": null},
            },
            "send": {"isSending": false, "recentRecipients": [], "recentPayments": []},
            "recipients": {"phoneRecipientCache": {}},
            "goldToken": {"balance": null, "educationCompleted": false, "lastFetch": null},
            "stableToken": {
                "educationCompleted": false,
                "lastFetch": null,
                "balances": {"cUSD": "150", "cEUR": null},
            },
            "home": {"loading": false, "notifications": {}},
            "transactions": {"standbyTransactions": [], "standbyTransactionsLegacy": []},
            "web3": {
                "latestBlockNumber": 0,
                "account": ACCOUNT,
                "accountInWeb3Keystore": ACCOUNT,
                "dataEncryptionKey": COMMENT_KEY,
                "fornoMode": true,
                "hadFornoDisabled": true,
            },
            "geth": {"initialized": "INITIALIZED", "connected": true},
            "identity": {
                "addressToE164Number": {},
                "e164NumberToAddress": entry(PHONE, json!([ACCOUNT])),
                "e164NumberToSalt": {},
                "askedContactsPermission": false,
                "addressToDisplayName": entry(CONTACT, json!({"name": "Jane Doe", "imageUrl": null})),
                "acceptedAttestationCodes": [],
                "attestationInputStatus": ["Inputting", "Disabled", "Disabled"],
                "numCompleteAttestations": 0,
                "verificationStatus": 0,
                "hasSeenVerificationNux": true,
                "lastRevealAttempt": null,
            },
            "verify": {"komenciAvailable": "UNKNOWN", "withoutRevealing": false, "retries": 0},
            "account": {
                "name": "John Doe",
                "e164PhoneNumber": PHONE,
                "defaultCountryCode": "+1",
                "contactDetails": {"contactId": "contactId", "thumbnailPath": null},
                "pincodeType": "CustomPin",
                "backupCompleted": false,
                "dailyLimitCusd": 1000,
                "acceptedTerms": true,
                "hasMigratedToNewBip39": false,
                "hasLinkedBankAccount": false,
                "finclusiveKycStatus": 0,
                "finclusiveRegionSupported": false,
                "dismissedKeepSupercharging": false,
                "dismissedStartSupercharging": false,
            },
            "paymentRequest": {
                "incomingPaymentRequests": [{"id": "req-1", "amount": "5"}],
                "outgoingPaymentRequests": [],
            },
            "escrow": {"isReclaiming": false, "sentEscrowedPayments": []},
            "localCurrency": {
                "isLoading": false,
                "preferredCurrencyCode": "PHP",
                "fetchedCurrencyCode": "PHP",
                "exchangeRates": {"cUSD": "1.33", "cEUR": null, "cGLD": null},
            },
            "imports": {"isImportingWallet": false},
            "exchange": {
                "tobinTax": "0",
                "history": {
                    "celoGoldExchangeRates": [],
                    "aggregatedExchangeRates": [],
                    "granularity": 60,
                    "range": 2_592_000_000i64,
                    "lastTimeUpdated": 0,
                },
            },
            "fiatExchanges": {"txHashToProvider": {}},
            "walletConnect": {},
            "tokens": {"tokenBalances": {}, "loading": false, "error": false},
            "supercharge": {
                "loading": false,
                "error": false,
                "fetchAvailableRewardsLoading": false,
                "fetchAvailableRewardsError": false,
                "availableRewards": [],
            },
            "i18n": {
                "language": "es-419",
                "allowOtaTranslations": false,
                "otaTranslationsLastUpdate": 0,
                "otaTranslationsAppVersion": "0",
                "otaTranslationsLanguage": "",
            },
            "_persist": {"version": 51},
        });
        assert_eq!(latest().into_value(), expected);
    }
}
