//! Currency codes used as keys in persisted balance and rate maps

use serde::{Deserialize, Serialize};

/// Stable currencies and the native token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Celo Dollar
    #[serde(rename = "cUSD")]
    Dollar,
    /// Celo Euro
    #[serde(rename = "cEUR")]
    Euro,
    /// Native token; keeps its legacy `cGLD` code in persisted maps
    #[serde(rename = "cGLD")]
    Celo,
}

impl Currency {
    /// Key used for this currency inside persisted maps
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Dollar => "cUSD",
            Currency::Euro => "cEUR",
            Currency::Celo => "cGLD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_serde() {
        for currency in [Currency::Dollar, Currency::Euro, Currency::Celo] {
            let encoded = serde_json::to_value(currency).unwrap();
            assert_eq!(encoded, serde_json::Value::String(currency.code().to_string()));
        }
    }

    #[test]
    fn test_celo_keeps_legacy_code() {
        assert_eq!(Currency::Celo.code(), "cGLD");
        let decoded: Currency = serde_json::from_str("\"cGLD\"").unwrap();
        assert_eq!(decoded, Currency::Celo);
    }
}
