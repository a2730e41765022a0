//! AP2 verifier configuration.
//!
//! ```toml
//! [ap2]
//! allowed_domains = ["shop.example", "agent.example"]
//! allowed_agent_presence = ["present"]
//! allowed_modalities = ["human_present", "human_not_present"]
//!
//! [ap2.purposes]
//! payment = "payment-authorization"
//! ```

use serde::{Deserialize, Serialize};

use crate::types::MandateType;

/// Signing purposes expected in each chain slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedPurposes {
    /// Intent mandate purpose.
    pub intent: String,
    /// Cart mandate purpose.
    pub cart: String,
    /// Payment mandate purpose.
    pub payment: String,
}

impl Default for ExpectedPurposes {
    fn default() -> Self {
        Self {
            intent: "intent-authorization".to_owned(),
            cart: "cart-authorization".to_owned(),
            payment: "payment-authorization".to_owned(),
        }
    }
}

impl ExpectedPurposes {
    /// Returns the purpose expected for a mandate kind.
    #[must_use]
    pub fn for_kind(&self, kind: MandateType) -> &str {
        match kind {
            MandateType::Intent => &self.intent,
            MandateType::Cart => &self.cart,
            MandateType::Payment => &self.payment,
        }
    }
}

/// Settings for [`MandateVerifier`](crate::MandateVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ap2Config {
    /// Signing domains accepted on any mandate. Empty rejects every mandate.
    pub allowed_domains: Vec<String>,
    /// Accepted `agent_presence` values on a payment mandate.
    pub allowed_agent_presence: Vec<String>,
    /// Accepted `transaction_modality` values on a payment mandate.
    pub allowed_modalities: Vec<String>,
    /// Per-slot signing purposes.
    pub purposes: ExpectedPurposes,
}

impl Default for Ap2Config {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            allowed_agent_presence: vec!["present".to_owned()],
            allowed_modalities: vec!["human_present".to_owned(), "human_not_present".to_owned()],
            purposes: ExpectedPurposes::default(),
        }
    }
}

impl Ap2Config {
    /// Creates a config accepting the given domains, with default value sets.
    #[must_use]
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: domains.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn allows_domain(&self, domain: &str) -> bool {
        self.allowed_domains.iter().any(|d| d == domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config: Ap2Config = serde_json::from_str(
            r#"{"allowed_domains": ["shop.example"], "purposes": {"payment": "pay"}}"#,
        )
        .unwrap();
        assert!(config.allows_domain("shop.example"));
        assert!(!config.allows_domain("evil.example"));
        assert_eq!(config.purposes.for_kind(MandateType::Payment), "pay");
        assert_eq!(config.purposes.for_kind(MandateType::Cart), "cart-authorization");
        assert_eq!(config.allowed_modalities.len(), 2);
    }

    #[test]
    fn test_default_rejects_all_domains() {
        assert!(!Ap2Config::default().allows_domain("shop.example"));
    }
}
