//! Carrier eligibility checks keyed by Motor Carrier (MC) number.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static MC_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(MC[-\s]?)?(\d{5,7})$").expect("MC number pattern should be valid"));

pub const MOCK_VERIFIED_REASON: &str = "Verified (mock data for testing)";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid MC number format `{input}`; expected format: MC123456")]
pub struct McNumberError {
    pub input: String,
}

/// A validated MC number. Accepts `MC123456`, `MC-123456`, `MC 123456` or bare digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct McNumber {
    digits: String,
}

impl McNumber {
    pub fn parse(raw: &str) -> Result<Self, McNumberError> {
        let normalized = raw.trim().to_uppercase();
        let digits = MC_FORMAT
            .captures(&normalized)
            .and_then(|captures| captures.get(2))
            .map(|digits| digits.as_str().to_string())
            .ok_or_else(|| McNumberError { input: raw.to_string() })?;

        Ok(Self { digits })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }
}

impl fmt::Display for McNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MC{}", self.digits)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierVerification {
    pub eligible: bool,
    pub carrier_name: Option<String>,
    pub reason: String,
}

impl CarrierVerification {
    pub fn eligible(carrier_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { eligible: true, carrier_name: Some(carrier_name.into()), reason: reason.into() }
    }

    pub fn ineligible(reason: impl Into<String>) -> Self {
        Self { eligible: false, carrier_name: None, reason: reason.into() }
    }
}

/// Looks up whether a carrier may haul freight. Lookup failures are reported as ineligible
/// verifications with a reason rather than as errors.
#[async_trait]
pub trait CarrierRegistry: Send + Sync {
    async fn verify(&self, mc_number: &str) -> CarrierVerification;
}

/// Offline registry for development and tests: every well-formed MC number is eligible.
#[derive(Clone, Debug)]
pub struct MockCarrierRegistry {
    known: HashMap<String, String>,
}

impl Default for MockCarrierRegistry {
    fn default() -> Self {
        let known = [
            ("123456", "ABC Trucking LLC"),
            ("234567", "XYZ Logistics Inc"),
            ("345678", "Swift Transport Co"),
            ("456789", "Premier Freight Services"),
        ]
        .into_iter()
        .map(|(digits, name)| (digits.to_string(), name.to_string()))
        .collect();

        Self { known }
    }
}

impl MockCarrierRegistry {
    pub fn lookup(&self, mc_number: &str) -> CarrierVerification {
        let Ok(mc) = McNumber::parse(mc_number) else {
            return CarrierVerification::ineligible("Invalid MC number format");
        };

        let name = self
            .known
            .get(mc.digits())
            .cloned()
            .unwrap_or_else(|| format!("Test Carrier {}", mc.digits()));

        CarrierVerification::eligible(name, MOCK_VERIFIED_REASON)
    }
}

#[async_trait]
impl CarrierRegistry for MockCarrierRegistry {
    async fn verify(&self, mc_number: &str) -> CarrierVerification {
        self.lookup(mc_number)
    }
}

#[cfg(test)]
mod tests {
    use super::{CarrierRegistry, McNumber, MockCarrierRegistry, MOCK_VERIFIED_REASON};

    #[test]
    fn mc_number_accepts_common_spellings() {
        for raw in ["MC123456", "mc-123456", "MC 123456", "123456", " MC123456 "] {
            let mc = McNumber::parse(raw).expect("should parse");
            assert_eq!(mc.digits(), "123456", "input {raw:?}");
            assert_eq!(mc.to_string(), "MC123456");
        }
    }

    #[test]
    fn mc_number_rejects_bad_formats() {
        for raw in ["MC1234", "MC12345678", "MX123456", "", "MC12-3456"] {
            assert!(McNumber::parse(raw).is_err(), "input {raw:?}");
        }
    }

    #[tokio::test]
    async fn mock_registry_knows_seed_carriers() {
        let registry = MockCarrierRegistry::default();

        let known = registry.verify("MC-345678").await;
        assert!(known.eligible);
        assert_eq!(known.carrier_name.as_deref(), Some("Swift Transport Co"));
        assert_eq!(known.reason, MOCK_VERIFIED_REASON);

        let unknown = registry.verify("987654").await;
        assert!(unknown.eligible);
        assert_eq!(unknown.carrier_name.as_deref(), Some("Test Carrier 987654"));
    }

    #[tokio::test]
    async fn mock_registry_rejects_invalid_numbers() {
        let verification = MockCarrierRegistry::default().verify("not-a-number").await;
        assert!(!verification.eligible);
        assert!(verification.carrier_name.is_none());
    }
}
