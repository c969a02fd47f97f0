//! Enum encodings written into snapshots by migrations
//!
//! The wire value of each variant is what ends up in the persisted tree, so
//! these are spelled out explicitly instead of relying on variant names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State of one attestation code input box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeInputStatus {
    /// Accepting input
    Inputting,
    /// Code is being processed
    Processing,
    /// Code was rejected
    Error,
    /// Code was accepted
    Accepted,
    /// Input not yet available
    Disabled,
}

impl CodeInputStatus {
    /// Persisted string value
    pub const fn as_str(&self) -> &'static str {
        match self {
            CodeInputStatus::Inputting => "Inputting",
            CodeInputStatus::Processing => "Processing",
            CodeInputStatus::Error => "Error",
            CodeInputStatus::Accepted => "Accepted",
            CodeInputStatus::Disabled => "Disabled",
        }
    }

    /// Initial status of the three attestation inputs
    pub fn initial_inputs() -> Value {
        Value::from(vec![
            CodeInputStatus::Inputting.as_str(),
            CodeInputStatus::Disabled.as_str(),
            CodeInputStatus::Disabled.as_str(),
        ])
    }
}

/// Phone verification progress (numeric encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum VerificationStatus {
    /// Verification failed
    Failed = -1,
    /// Not started or stopped by the user
    Stopped = 0,
    /// Preparing keys
    Prepping = 1,
    /// Requesting attestations
    RequestingAttestations = 2,
    /// Waiting for codes
    RevealingNumber = 3,
    /// Completing attestations
    CompletingAttestations = 4,
    /// Verified
    Done = 5,
}

impl VerificationStatus {
    /// Persisted numeric value
    pub const fn as_i64(self) -> i64 {
        self as i8 as i64
    }
}

/// KYC status with the banking partner (numeric encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FinclusiveKycStatus {
    /// No submission yet
    NotSubmitted = 0,
    /// Submitted
    Submitted = 1,
    /// Accepted
    Accepted = 2,
    /// Rejected
    Rejected = 3,
    /// Under manual review
    InReview = 4,
}

impl FinclusiveKycStatus {
    /// Persisted numeric value
    pub const fn as_u64(self) -> u64 {
        self as u8 as u64
    }
}

/// Style of the supercharge entry point on the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuperchargeButtonType {
    /// Pill labelled "Rewards"
    #[serde(rename = "PILL_REWARDS")]
    PillRewards,
    /// Pill labelled "Supercharge"
    #[serde(rename = "PILL_SUPERCHARGE")]
    PillSupercharge,
    /// Menu item labelled "Rewards"
    #[serde(rename = "MENU_REWARDS")]
    MenuRewards,
    /// Menu item labelled "Supercharge"
    #[serde(rename = "MENU_SUPERCHARGE")]
    MenuSupercharge,
}

impl SuperchargeButtonType {
    /// Persisted string value
    pub const fn as_str(&self) -> &'static str {
        match self {
            SuperchargeButtonType::PillRewards => "PILL_REWARDS",
            SuperchargeButtonType::PillSupercharge => "PILL_SUPERCHARGE",
            SuperchargeButtonType::MenuRewards => "MENU_REWARDS",
            SuperchargeButtonType::MenuSupercharge => "MENU_SUPERCHARGE",
        }
    }
}

/// Handler for payment deep links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentDeepLinkHandler {
    /// Deep links are ignored
    #[serde(rename = "")]
    Disabled,
    /// Handled by the merchant payment flow
    #[serde(rename = "merchant")]
    Merchant,
}

impl PaymentDeepLinkHandler {
    /// Persisted string value
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentDeepLinkHandler::Disabled => "",
            PaymentDeepLinkHandler::Merchant => "merchant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_inputs() {
        assert_eq!(
            CodeInputStatus::initial_inputs(),
            serde_json::json!(["Inputting", "Disabled", "Disabled"])
        );
    }

    #[test]
    fn test_numeric_encodings() {
        assert_eq!(VerificationStatus::Stopped.as_i64(), 0);
        assert_eq!(VerificationStatus::Failed.as_i64(), -1);
        assert_eq!(FinclusiveKycStatus::NotSubmitted.as_u64(), 0);
        assert_eq!(FinclusiveKycStatus::InReview.as_u64(), 4);
    }

    #[test]
    fn test_string_encodings_match_serde() {
        assert_eq!(
            serde_json::to_value(SuperchargeButtonType::PillRewards).unwrap(),
            serde_json::json!(SuperchargeButtonType::PillRewards.as_str())
        );
        assert_eq!(
            serde_json::to_value(PaymentDeepLinkHandler::Disabled).unwrap(),
            serde_json::json!("")
        );
    }
}
