//! ECDSA P-256 signature verification.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

use super::{Algorithm, SignatureError, SignatureVerifier};

/// Verifies ECDSA P-256 / SHA-256 signatures.
///
/// Keys are SEC1-encoded points, compressed or uncompressed. Signatures may be
/// the fixed 64-byte `r‖s` form used by JOSE or ASN.1 DER.
#[derive(Debug, Clone, Copy, Default)]
pub struct P256Verifier;

impl SignatureVerifier for P256Verifier {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EcdsaP256
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError> {
        let key = VerifyingKey::from_sec1_bytes(public_key)
            .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
        let sig = if signature.len() == 64 {
            Signature::from_slice(signature)
        } else {
            Signature::from_der(signature)
        }
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
        key.verify(message, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}
