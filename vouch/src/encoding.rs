//! Base64 encoding utilities.
//!
//! This module provides [`Base64Bytes`], a wrapper type for base64-encoded
//! data: mandate `proof_value` fields, TAP `Signature` header values and the
//! JSON payloads carried in x402 headers.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as b64, URL_SAFE_NO_PAD as b64url};
use std::fmt::Display;

/// A wrapper for base64-encoded byte data.
///
/// This type holds bytes that represent base64-encoded data and provides
/// methods for encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// Standard alphabet with padding is tried first; the URL-safe unpadded
    /// alphabet used by JOSE objects is accepted as a fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is valid base64 in neither alphabet.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let trimmed = self.0.trim_ascii();
        b64.decode(trimmed).or_else(|err| b64url.decode(trimmed).map_err(|_| err))
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        let encoded = b64.encode(input.as_ref());
        Self(encoded.into_bytes())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl From<&str> for Base64Bytes {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_alphabet() {
        let encoded = Base64Bytes::encode(b"\xfb\xff payload");
        assert_eq!(encoded.decode().unwrap(), b"\xfb\xff payload");
    }

    #[test]
    fn test_url_safe_fallback() {
        let encoded = Base64Bytes::from("-_8");
        assert_eq!(encoded.decode().unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_invalid_input() {
        assert!(Base64Bytes::from("not base64 at all!").decode().is_err());
    }
}
