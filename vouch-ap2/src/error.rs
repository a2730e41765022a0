//! AP2 verification errors.

use std::borrow::Cow;

use vouch::Reason;
use vouch::crypto::SignatureError;
use vouch::identity::IdentityError;
use vouch::replay::ReplayStoreError;

use crate::types::MandateType;

/// Reasons a mandate or mandate chain is rejected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Ap2Error {
    /// The bundle failed strict parsing.
    #[error("malformed mandate bundle: {0}")]
    MalformedBundle(String),
    /// `now >= expires_at`.
    #[error("mandate {0} is expired")]
    Expired(String),
    /// The signing domain is not in the allowed set.
    #[error("domain `{0}` is not allowed")]
    DomainNotAllowed(String),
    /// The mandate id has already been accepted and its record is live.
    #[error("mandate {0} has already been used")]
    Replayed(String),
    /// A payment with identical content has already been accepted.
    #[error("payment content {0} has already been consumed")]
    ContentReplayed(String),
    /// The signer could not be resolved.
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// `proof_value` is not base64.
    #[error("proof value is not valid base64")]
    InvalidProofEncoding,
    /// The proof does not verify over the domain-separated payload.
    #[error("mandate signature is invalid: {0}")]
    SignatureInvalid(#[from] SignatureError),
    /// The replay store could not record the mandate.
    #[error(transparent)]
    ReplayStore(#[from] ReplayStoreError),
    /// A chain slot holds the wrong kind of mandate.
    #[error("expected a {expected} mandate, found {found}")]
    TypeMismatch {
        /// The slot's kind.
        expected: MandateType,
        /// The declared kind.
        found: MandateType,
    },
    /// A chain slot's signing purpose differs from the configured one.
    #[error("{kind} mandate purpose `{found}` does not match `{expected}`")]
    PurposeMismatch {
        /// The slot's kind.
        kind: MandateType,
        /// Configured purpose.
        expected: String,
        /// Declared purpose.
        found: String,
    },
    /// The three mandates name different subjects.
    #[error("mandate subjects differ across the chain")]
    SubjectMismatch,
    /// The payment does not name a merchant domain.
    #[error("payment mandate has no merchant domain")]
    PaymentMissingMerchantDomain,
    /// Cart and payment merchant domains differ.
    #[error("cart merchant `{cart}` does not match payment merchant `{payment}`")]
    MerchantDomainMismatch {
        /// Cart's merchant domain.
        cart: String,
        /// Payment's merchant domain.
        payment: String,
    },
    /// The agent-presence signal is outside the allowed set.
    #[error("agent presence `{0}` is not allowed")]
    AgentPresenceRequired(String),
    /// The transaction modality is outside the allowed set.
    #[error("transaction modality `{0}` is not allowed")]
    InvalidModality(String),
    /// The payment amount differs from the cart total.
    #[error("payment amount {payment} does not equal cart total {cart_total}")]
    PaymentAmountMismatch {
        /// Payment amount.
        payment: u64,
        /// Cart subtotal plus taxes.
        cart_total: u64,
    },
    /// The payment amount exceeds the intent's requested amount.
    #[error("payment amount {payment} exceeds intent amount {requested}")]
    IntentAmountExceeded {
        /// Payment amount.
        payment: u64,
        /// Intent ceiling.
        requested: u64,
    },
}

impl Reason for Ap2Error {
    fn reason(&self) -> Cow<'static, str> {
        let reason = match self {
            Self::Identity(inner) => return inner.reason(),
            Self::ReplayStore(inner) => return inner.reason(),
            Self::MalformedBundle(_) => "malformed_bundle",
            Self::Expired(_) => "mandate_expired",
            Self::DomainNotAllowed(_) => "domain_not_allowed",
            Self::Replayed(_) => "mandate_replayed",
            Self::ContentReplayed(_) => "mandate_content_replayed",
            Self::InvalidProofEncoding => "invalid_proof_encoding",
            Self::SignatureInvalid(_) => "signature_invalid",
            Self::TypeMismatch { .. } => "mandate_type_mismatch",
            Self::PurposeMismatch { .. } => "mandate_purpose_mismatch",
            Self::SubjectMismatch => "subject_mismatch",
            Self::PaymentMissingMerchantDomain => "payment_missing_merchant_domain",
            Self::MerchantDomainMismatch { .. } => "merchant_domain_mismatch",
            Self::AgentPresenceRequired(_) => "payment_agent_presence_required",
            Self::InvalidModality(_) => "payment_invalid_modality",
            Self::PaymentAmountMismatch { .. } => "payment_amount_mismatch",
            Self::IntentAmountExceeded { .. } => "intent_amount_exceeded",
        };
        Cow::Borrowed(reason)
    }
}
