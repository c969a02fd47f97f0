//! Fiat on/off-ramp providers known to older snapshots

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const LOGO_BASE: &str =
    "https://firebasestorage.googleapis.com/v0/b/celo-mobile-mainnet.appspot.com/o/images%2F";

/// Display info of a cash-in provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDisplayInfo {
    /// Provider id, also used as the display name
    pub name: String,
    /// Logo URL
    pub icon: String,
}

/// List of providers
#[derive(Debug, Clone)]
pub struct ProviderList {
    providers: Vec<ProviderDisplayInfo>,
}

impl ProviderList {
    /// Create a new provider list
    pub fn new(providers: Vec<ProviderDisplayInfo>) -> Self {
        Self { providers }
    }

    /// Providers that could be stored as `lastUsedProvider` before it became an id
    pub fn legacy() -> Self {
        let entry = |name: &str, file: &str| ProviderDisplayInfo {
            name: name.to_string(),
            icon: format!("{LOGO_BASE}{file}?alt=media"),
        };
        Self::new(vec![
            entry("Moonpay", "moonpay.png"),
            entry("Ramp", "ramp.png"),
            entry("Simplex", "simplex.jpg"),
            entry("Transak", "transak.png"),
            entry("Xanpool", "xanpool.png"),
        ])
    }

    /// Find a provider by display name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Result<&ProviderDisplayInfo> {
        let wanted = name.to_lowercase();
        self.providers
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_providers() {
        let providers = ProviderList::legacy();
        for name in ["Moonpay", "Ramp", "Simplex", "Transak", "Xanpool"] {
            assert_eq!(providers.find_by_name(name).unwrap().name, name);
        }

        let simplex = providers.find_by_name("Simplex").unwrap();
        assert!(simplex.icon.ends_with("simplex.jpg?alt=media"));
    }

    #[test]
    fn test_find_ignores_case() {
        let providers = ProviderList::legacy();
        assert_eq!(providers.find_by_name("mOoNpAy").unwrap().name, "Moonpay");
    }

    #[test]
    fn test_provider_not_found() {
        let providers = ProviderList::legacy();
        let result = providers.find_by_name("Coinbase");
        assert!(result.is_err());
    }
}
