//! HTTP header encoding and decoding for x402 messages.
//!
//! Every header carries base64-encoded JSON.

use base64::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::HeaderError;
use crate::types::{PaymentReceipt, X402Challenge, X402PaymentPayload};

/// Header carrying the challenge on a 402 response.
pub const PAYMENT_REQUIRED_HEADER: &str = "PaymentRequired";

/// Header carrying the payer's payload on the retried request.
pub const PAYMENT_SIGNATURE_HEADER: &str = "PAYMENT-SIGNATURE";

/// Header carrying the settlement receipt.
pub const PAYMENT_RESPONSE_HEADER: &str = "PAYMENT-RESPONSE";

/// HTTP status that signals a challenge.
pub const PAYMENT_REQUIRED_STATUS: u16 = 402;

fn encode<T: Serialize>(value: &T) -> Result<String, HeaderError> {
    let json = serde_json::to_vec(value)?;
    Ok(BASE64_STANDARD.encode(&json))
}

fn decode<T: DeserializeOwned>(header_value: &str) -> Result<T, String> {
    let bytes = BASE64_STANDARD
        .decode(header_value.trim())
        .map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

/// Encodes a challenge for the `PaymentRequired` header.
///
/// # Errors
///
/// Returns [`HeaderError::Serialize`] if JSON serialization fails.
pub fn encode_challenge(challenge: &X402Challenge) -> Result<String, HeaderError> {
    encode(challenge)
}

/// Decodes a `PaymentRequired` header value.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidChallenge`] on base64 or JSON failure.
pub fn decode_challenge(header_value: &str) -> Result<X402Challenge, HeaderError> {
    decode(header_value).map_err(HeaderError::InvalidChallenge)
}

/// Encodes a payload for the `PAYMENT-SIGNATURE` header.
///
/// # Errors
///
/// Returns [`HeaderError::Serialize`] if JSON serialization fails.
pub fn encode_payment_signature(payload: &X402PaymentPayload) -> Result<String, HeaderError> {
    encode(payload)
}

/// Decodes a `PAYMENT-SIGNATURE` header value.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidPaymentSignature`] on base64 or JSON failure.
pub fn decode_payment_signature(header_value: &str) -> Result<X402PaymentPayload, HeaderError> {
    decode(header_value).map_err(HeaderError::InvalidPaymentSignature)
}

/// Encodes a receipt for the `PAYMENT-RESPONSE` header.
///
/// # Errors
///
/// Returns [`HeaderError::Serialize`] if JSON serialization fails.
pub fn encode_payment_response(receipt: &PaymentReceipt) -> Result<String, HeaderError> {
    encode(receipt)
}

/// Decodes a `PAYMENT-RESPONSE` header value.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidPaymentResponse`] on base64 or JSON failure.
pub fn decode_payment_response(header_value: &str) -> Result<PaymentReceipt, HeaderError> {
    decode(header_value).map_err(HeaderError::InvalidPaymentResponse)
}
