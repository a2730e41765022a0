//! Ed25519 signature verification.

use ed25519_dalek::{Signature, VerifyingKey};

use super::{Algorithm, SignatureError, SignatureVerifier};

/// Verifies Ed25519 signatures over raw 32-byte public keys.
///
/// Uses strict verification, which rejects small-order keys and
/// non-canonical signature encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ed25519
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError> {
        let key_bytes: &[u8; 32] = public_key.try_into().map_err(|_| {
            SignatureError::MalformedKey(format!(
                "expected 32-byte Ed25519 key, got {} bytes",
                public_key.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(key_bytes)
            .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
        let sig_bytes: &[u8; 64] = signature.try_into().map_err(|_| {
            SignatureError::MalformedSignature(format!(
                "expected 64-byte Ed25519 signature, got {} bytes",
                signature.len()
            ))
        })?;
        let sig = Signature::from_bytes(sig_bytes);
        key.verify_strict(message, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}
