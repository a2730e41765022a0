//! x402 and ERC-3009 rejection reasons.

use std::borrow::Cow;

use vouch::Reason;

/// Reasons a payment payload is rejected against its challenge.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum X402Error {
    /// The challenge expired before the payload arrived.
    #[error("challenge {payment_id} expired")]
    ChallengeExpired {
        /// Challenge payment id.
        payment_id: String,
    },
    /// The payload answers a different challenge.
    #[error("payment id `{payload}` does not match challenge `{challenge}`")]
    PaymentIdMismatch {
        /// Id in the challenge.
        challenge: String,
        /// Id in the payload.
        payload: String,
    },
    /// The payload does not echo the challenge nonce.
    #[error("payload nonce does not match the challenge nonce")]
    NonceMismatch,
    /// The payload pays a different amount.
    #[error("payload amount `{payload}` does not match challenge amount `{challenge}`")]
    AmountMismatch {
        /// Amount in the challenge.
        challenge: String,
        /// Amount in the payload.
        payload: String,
    },
    /// The payload signature did not verify, or the verifier failed.
    #[error("payment signature is invalid")]
    SignatureInvalid,
    /// The `x402Version` is not supported.
    #[error("x402 version `{0}` is not supported")]
    UnsupportedVersion(String),
}

impl Reason for X402Error {
    fn reason(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::ChallengeExpired { .. } => "challenge_expired",
            Self::PaymentIdMismatch { .. } => "payment_id_mismatch",
            Self::NonceMismatch => "nonce_mismatch",
            Self::AmountMismatch { .. } => "amount_mismatch",
            Self::SignatureInvalid => "signature_invalid",
            Self::UnsupportedVersion(_) => "unsupported_version",
        })
    }
}

/// Errors decoding or encoding x402 headers.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderError {
    /// The `PaymentRequired` header is not base64 JSON of a challenge.
    #[error("invalid PaymentRequired header: {0}")]
    InvalidChallenge(String),
    /// The `PAYMENT-SIGNATURE` header is not base64 JSON of a payload.
    #[error("invalid PAYMENT-SIGNATURE header: {0}")]
    InvalidPaymentSignature(String),
    /// The `PAYMENT-RESPONSE` header is not base64 JSON of a receipt.
    #[error("invalid PAYMENT-RESPONSE header: {0}")]
    InvalidPaymentResponse(String),
    /// A value could not be serialized.
    #[error("failed to serialize header value: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Reason for HeaderError {
    fn reason(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::InvalidChallenge(_) => "invalid_challenge_header",
            Self::InvalidPaymentSignature(_) => "invalid_payment_signature_header",
            Self::InvalidPaymentResponse(_) => "invalid_payment_response_header",
            Self::Serialize(_) => "header_serialization_failed",
        })
    }
}

/// Reasons an ERC-3009 authorization is rejected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Erc3009Error {
    /// `valid_after >= valid_before`.
    #[error("validAfter {valid_after} is not before validBefore {valid_before}")]
    InvalidValidityWindow {
        /// Declared start.
        valid_after: u64,
        /// Declared end.
        valid_before: u64,
    },
    /// `now < valid_after`.
    #[error("authorization is not valid until {0}")]
    NotYetValid(u64),
    /// `now >= valid_before`.
    #[error("authorization expired at {0}")]
    Expired(u64),
    /// A fixed-width hex field decodes to more than 32 bytes.
    #[error("`{field}` is {len} bytes, more than 32")]
    HexTooLong {
        /// Field name.
        field: &'static str,
        /// Decoded length.
        len: usize,
    },
    /// A hex field does not decode.
    #[error("`{field}` is not valid hex")]
    InvalidHex {
        /// Field name.
        field: &'static str,
    },
    /// The signature recovers to an address other than `from`.
    #[error("authorization was signed by {recovered}, not {expected}")]
    SignerMismatch {
        /// The `from` address.
        expected: String,
        /// The recovered address.
        recovered: String,
    },
    /// `(v, r, s)` is not a recoverable signature.
    #[error("authorization signature is invalid: {0}")]
    SignatureInvalid(String),
}

impl Reason for Erc3009Error {
    fn reason(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::InvalidValidityWindow { .. } => "invalid_validity_window",
            Self::NotYetValid(_) => "authorization_not_yet_valid",
            Self::Expired(_) => "authorization_expired",
            Self::HexTooLong { .. } => "hex_too_long",
            Self::InvalidHex { .. } => "invalid_hex",
            Self::SignerMismatch { .. } => "authorization_signer_mismatch",
            Self::SignatureInvalid(_) => "authorization_signature_invalid",
        })
    }
}
