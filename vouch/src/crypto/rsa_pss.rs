//! RSASSA-PSS signature verification.

use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::pss::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::traits::PublicKeyParts;
use sha2::Sha256;

use super::{Algorithm, SignatureError, SignatureVerifier};

/// Smallest modulus accepted by default.
pub const DEFAULT_MIN_RSA_BITS: usize = 2048;

/// Verifies RSASSA-PSS signatures with SHA-256 and a digest-length salt.
///
/// Keys are DER, either `SubjectPublicKeyInfo` or PKCS#1 `RSAPublicKey`.
#[derive(Debug, Clone, Copy)]
pub struct RsaPssVerifier {
    min_bits: usize,
}

impl Default for RsaPssVerifier {
    fn default() -> Self {
        Self {
            min_bits: DEFAULT_MIN_RSA_BITS,
        }
    }
}

impl RsaPssVerifier {
    /// Creates a verifier that rejects moduli shorter than `min_bits`.
    #[must_use]
    pub const fn with_min_bits(min_bits: usize) -> Self {
        Self { min_bits }
    }

    fn decode_key(&self, der: &[u8]) -> Result<RsaPublicKey, SignatureError> {
        let key = RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
        let bits = key.size() * 8;
        if bits < self.min_bits {
            return Err(SignatureError::MalformedKey(format!(
                "RSA modulus of {bits} bits is below the {} bit minimum",
                self.min_bits
            )));
        }
        Ok(key)
    }
}

impl SignatureVerifier for RsaPssVerifier {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RsaPssSha256
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError> {
        let key = self.decode_key(public_key)?;
        let sig = Signature::try_from(signature)
            .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
        VerifyingKey::<Sha256>::new(key)
            .verify(message, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}
