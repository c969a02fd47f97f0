//! Application defaults frozen into migrations

use serde::Serialize;
use serde_json::{json, Value};

/// Daily payment limit (cUSD) that older snapshots are raised to
pub const DEFAULT_DAILY_PAYMENT_LIMIT_CUSD_LEGACY: u64 = 1000;

/// Sentry trace sample rate written when tracing was introduced
pub const DEFAULT_SENTRY_TRACES_SAMPLE_RATE: f64 = 0.2;

/// Network error messages Sentry ignores by default
pub const DEFAULT_SENTRY_NETWORK_ERRORS: [&str; 2] =
    ["network request failed", "The network connection was lost"];

/// Exchange rate history granularity (minutes)
pub const EXCHANGE_HISTORY_GRANULARITY: u64 = 60;

/// Exchange rate history range (30 days, in milliseconds)
pub const EXCHANGE_HISTORY_RANGE_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Initial exchange rate history slice
pub fn exchange_initial_history() -> Value {
    json!({
        "celoGoldExchangeRates": [],
        "aggregatedExchangeRates": [],
        "granularity": EXCHANGE_HISTORY_GRANULARITY,
        "range": EXCHANGE_HISTORY_RANGE_MS,
        "lastTimeUpdated": 0,
    })
}

/// Remote config values used when the remote config service is unreachable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfigDefaults {
    /// Supercharge APY (percent)
    pub supercharge_apy: u32,
    /// Show 24h price change next to balances
    pub show_price_change_indicator_in_balances: bool,
    /// Skip the profile picture onboarding step
    pub skip_profile_picture: bool,
    /// Comma separated US states without banking partner support
    pub finclusive_unsupported_states: &'static str,
    /// Allow CELO withdrawal from the exchange screen
    pub celo_withdrawal_enabled_in_exchange: bool,
}

impl RemoteConfigDefaults {
    /// Defaults shipped with the application
    pub const fn standard() -> Self {
        Self {
            supercharge_apy: 25,
            show_price_change_indicator_in_balances: false,
            skip_profile_picture: false,
            finclusive_unsupported_states: "NY,TX",
            celo_withdrawal_enabled_in_exchange: true,
        }
    }

    /// Unsupported states as a list
    pub fn finclusive_unsupported_states_list(&self) -> Vec<String> {
        self.finclusive_unsupported_states
            .split(',')
            .map(str::to_string)
            .collect()
    }
}

impl Default for RemoteConfigDefaults {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defaults() {
        let defaults = RemoteConfigDefaults::default();
        assert_eq!(defaults.supercharge_apy, 25);
        assert!(defaults.celo_withdrawal_enabled_in_exchange);
        assert_eq!(defaults.finclusive_unsupported_states_list(), vec!["NY", "TX"]);
    }

    #[test]
    fn test_exchange_history_range() {
        let history = exchange_initial_history();
        assert_eq!(history["range"], json!(2_592_000_000u64));
        assert_eq!(history["granularity"], json!(60));
        assert_eq!(history["celoGoldExchangeRates"], json!([]));
    }
}
