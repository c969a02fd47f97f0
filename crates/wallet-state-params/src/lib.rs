//! Wallet state parameters and constants
//!
//! This crate provides the defaults, enum encodings and lookup tables that
//! persisted-state migrations write into snapshots. Values here are frozen:
//! a migration that shipped with a default must keep producing that default.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod currency;
pub mod defaults;
pub mod providers;
pub mod status;

pub use currency::Currency;
pub use defaults::{
    exchange_initial_history, RemoteConfigDefaults, DEFAULT_DAILY_PAYMENT_LIMIT_CUSD_LEGACY,
    DEFAULT_SENTRY_NETWORK_ERRORS, DEFAULT_SENTRY_TRACES_SAMPLE_RATE,
};
pub use providers::{ProviderDisplayInfo, ProviderList};
pub use status::{
    CodeInputStatus, FinclusiveKycStatus, PaymentDeepLinkHandler, SuperchargeButtonType,
    VerificationStatus,
};

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown fiat provider
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
