use crate::state::set_opt;
use crate::{MigrationContext, PersistedState, Result};
use serde_json::{json, Map, Value};
use wallet_state_params::{SuperchargeButtonType, DEFAULT_SENTRY_TRACES_SAMPLE_RATE};

/// v22: language moves from `app` into the new `i18n` slice
pub fn move_language_to_i18n(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.require_slice(22, "app")?;
    let language = state.with_slice("app", |app| app.remove("language"));

    let mut i18n = Map::new();
    set_opt(&mut i18n, "language", language);
    i18n.insert("allowOtaTranslations".to_string(), Value::Bool(false));
    i18n.insert("otaTranslationsLastUpdate".to_string(), json!(0));
    i18n.insert("otaTranslationsAppVersion".to_string(), json!("0"));
    i18n.insert("otaTranslationsLanguage".to_string(), json!(""));
    state.set_slice("i18n", Value::Object(i18n));
    Ok(state)
}

/// v24: invites are gone
pub fn drop_invite(mut state: PersistedState, _ctx: &MigrationContext) -> Result<PersistedState> {
    state.remove_slice("invite");
    Ok(state)
}

/// v25: start sampling traces
pub fn add_sentry_sample_rate(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field(
        "app",
        "sentryTracesSampleRate",
        json!(DEFAULT_SENTRY_TRACES_SAMPLE_RATE),
    );
    Ok(state)
}

/// v26: cash-in button experiment, off
pub fn add_ramp_cash_in_flag(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("app", "rampCashInButtonExpEnabled", Value::Bool(false));
    Ok(state)
}

/// v27: supercharge entry point style
pub fn add_supercharge_button_type(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field(
        "app",
        "superchargeButtonType",
        json!(SuperchargeButtonType::PillRewards.as_str()),
    );
    Ok(state)
}

/// v28: dapp list endpoint, unset
pub fn add_dapp_list_url(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    state.set_field("app", "dappListApiUrl", Value::Null);
    Ok(state)
}

/// v29: everybody moves to forno, remembering who had it disabled
pub fn force_forno_mode(
    mut state: PersistedState,
    _ctx: &MigrationContext,
) -> Result<PersistedState> {
    let had_forno_disabled =
        state.require_slice(29, "web3")?.get("fornoMode") == Some(&Value::Bool(false));
    state.with_slice("web3", |web3| {
        web3.insert("fornoMode".to_string(), Value::Bool(true));
        web3.insert("hadFornoDisabled".to_string(), Value::Bool(had_forno_disabled));
    });
    Ok(state)
}
