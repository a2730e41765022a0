//! Algorithm-polymorphic signature verification.
//!
//! Every protocol adapter verifies signatures through the [`SignatureVerifier`]
//! trait. Third-party cryptography stays behind this seam: adapters pick a
//! verifier from a [`VerifierRegistry`] by algorithm name (`alg`) or by JWK
//! `kty`/`crv`, and never touch a curve library directly.
//!
//! # Supported algorithms
//!
//! | [`Algorithm`]    | Names accepted                          | Key bytes              | Signature bytes      |
//! |------------------|-----------------------------------------|------------------------|----------------------|
//! | `Ed25519`        | `ed25519`, `eddsa`                      | 32-byte raw key        | 64 bytes             |
//! | `EcdsaP256`      | `ecdsa-p256`, `es256`, `p256`, `p-256`  | SEC1 (33 or 65 bytes)  | 64-byte `r‖s` or DER |
//! | `RsaPssSha256`   | `rsa-pss-sha256`, `ps256`, `rsa-pss`    | SPKI or PKCS#1 DER     | modulus-sized        |

mod ecdsa;
mod ed25519;
mod jwk;
mod rsa_pss;

pub use self::ecdsa::P256Verifier;
pub use self::ed25519::Ed25519Verifier;
pub use self::jwk::{Jwk, Jwks};
pub use self::rsa_pss::RsaPssVerifier;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A signature algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// `EdDSA` over Curve25519.
    Ed25519,
    /// ECDSA over NIST P-256 with SHA-256.
    EcdsaP256,
    /// RSASSA-PSS with SHA-256 and MGF1-SHA-256.
    RsaPssSha256,
}

impl Algorithm {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::EcdsaP256 => "ecdsa-p256",
            Self::RsaPssSha256 => "rsa-pss-sha256",
        }
    }

    /// Resolves an algorithm from a name or common alias, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ed25519" | "eddsa" => Some(Self::Ed25519),
            "ecdsa-p256" | "es256" | "p256" | "p-256" => Some(Self::EcdsaP256),
            "rsa-pss-sha256" | "ps256" | "rsa-pss" => Some(Self::RsaPssSha256),
            _ => None,
        }
    }

    /// Resolves an algorithm from JWK `kty` and `crv` members.
    #[must_use]
    pub fn from_jwk(kty: &str, crv: Option<&str>) -> Option<Self> {
        match (kty, crv) {
            ("OKP", Some("Ed25519")) => Some(Self::Ed25519),
            ("EC", Some("P-256")) => Some(Self::EcdsaP256),
            ("RSA", _) => Some(Self::RsaPssSha256),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SignatureError::UnsupportedAlgorithm(s.to_owned()))
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors raised while verifying a signature.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
    /// The public key bytes could not be decoded for the algorithm.
    #[error("malformed public key: {0}")]
    MalformedKey(String),
    /// The signature bytes could not be decoded for the algorithm.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    /// The signature is well-formed but does not match the message.
    #[error("signature does not match message")]
    Mismatch,
    /// No verifier is registered for the requested algorithm.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Verifies detached signatures for one algorithm family.
pub trait SignatureVerifier: Send + Sync + fmt::Debug {
    /// The algorithm this verifier implements.
    fn algorithm(&self) -> Algorithm;

    /// Verifies `signature` over `message` with the encoded `public_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the key or signature is malformed or the
    /// signature does not match.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<(), SignatureError>;

    /// Boolean form of [`SignatureVerifier::verify`]. Any error is `false`.
    fn is_valid(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        self.verify(message, signature, public_key).is_ok()
    }
}

/// A public key tagged with the algorithm it verifies for.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// The algorithm family.
    pub algorithm: Algorithm,
    /// Encoded key material, in the format the algorithm's verifier expects.
    pub bytes: Vec<u8>,
}

impl PublicKey {
    /// Creates a new tagged public key.
    #[must_use]
    pub const fn new(algorithm: Algorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &alloy_primitives::hex::encode(&self.bytes))
            .finish()
    }
}

/// Maps algorithms to their verifiers.
#[derive(Debug, Clone)]
pub struct VerifierRegistry {
    verifiers: HashMap<Algorithm, Arc<dyn SignatureVerifier>>,
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VerifierRegistry {
    /// Creates a registry with no verifiers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            verifiers: HashMap::new(),
        }
    }

    /// Creates a registry with Ed25519, ECDSA P-256 and RSA-PSS registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register(Arc::new(Ed25519Verifier))
            .register(Arc::new(P256Verifier))
            .register(Arc::new(RsaPssVerifier::default()));
        registry
    }

    /// Registers a verifier, replacing any previous one for the same algorithm.
    pub fn register(&mut self, verifier: Arc<dyn SignatureVerifier>) -> &mut Self {
        self.verifiers.insert(verifier.algorithm(), verifier);
        self
    }

    /// Returns the verifier for an algorithm.
    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<&dyn SignatureVerifier> {
        self.verifiers.get(&algorithm).map(AsRef::as_ref)
    }

    /// Returns the verifier for an `alg` name or alias.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&dyn SignatureVerifier> {
        Algorithm::from_name(name).and_then(|alg| self.get(alg))
    }

    /// Returns the verifier matching JWK `kty`/`crv`.
    #[must_use]
    pub fn by_jwk(&self, kty: &str, crv: Option<&str>) -> Option<&dyn SignatureVerifier> {
        Algorithm::from_jwk(kty, crv).and_then(|alg| self.get(alg))
    }

    /// Verifies `signature` over `message` with a tagged key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::UnsupportedAlgorithm`] if no verifier is
    /// registered for the key's algorithm, or the verifier's own error.
    pub fn verify(
        &self,
        key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        let verifier = self
            .get(key.algorithm)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(key.algorithm.to_string()))?;
        verifier.verify(message, signature, &key.bytes)
    }
}
