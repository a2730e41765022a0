//! x402 wire types.
//!
//! All types serialize with camelCase field names.

use serde::{Deserialize, Serialize};
use vouch::UnixTimestamp;

/// A payment challenge returned with HTTP 402.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X402Challenge {
    /// Fresh random id the payload must echo.
    pub payment_id: String,
    /// The resource being paid for.
    pub resource_uri: String,
    /// Amount in the token's smallest unit, as a decimal string.
    pub amount: String,
    /// Currency or token symbol.
    pub currency: String,
    /// Address that receives the payment.
    pub payee_address: String,
    /// Network identifier, e.g. `base-sepolia` or `eip155:84532`.
    pub network: String,
    /// Token contract, when the currency is a token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    /// Moment the challenge stops being answerable.
    pub expires_at: UnixTimestamp,
    /// Fresh random nonce the payload must echo.
    pub nonce: String,
}

impl X402Challenge {
    /// Whether the challenge has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_reached(now)
    }
}

/// The payer's signed answer to a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X402PaymentPayload {
    /// Echo of the challenge payment id.
    pub payment_id: String,
    /// Paying address.
    pub payer_address: String,
    /// Amount paid, as a decimal string.
    pub amount: String,
    /// Echo of the challenge nonce.
    pub nonce: String,
    /// Payer signature over the payment, scheme-specific encoding.
    pub signature: String,
}

/// Settlement outcome carried in `PAYMENT-RESPONSE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Whether the payment settled.
    pub success: bool,
    /// The settled challenge's payment id.
    pub payment_id: String,
    /// Network the payment settled on.
    pub network: String,
    /// Settlement transaction hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    /// Paying address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Reason code when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// What is being sold, as passed to [`generate_challenge`](crate::generate_challenge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTerms {
    /// The resource being paid for.
    pub resource_uri: String,
    /// Amount in the token's smallest unit.
    pub amount: String,
    /// Currency or token symbol.
    pub currency: String,
    /// Address that receives the payment.
    pub payee_address: String,
    /// Network identifier.
    pub network: String,
    /// Token contract, if any.
    pub token_address: Option<String>,
}

/// A freshly issued challenge and its transport form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    /// The challenge.
    pub challenge: X402Challenge,
    /// Base64 JSON for the `PaymentRequired` header.
    pub header_value: String,
    /// Always 402.
    pub http_status: u16,
}
