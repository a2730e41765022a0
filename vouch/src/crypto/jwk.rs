//! JSON Web Key decoding into [`PublicKey`] values.
//!
//! Agents publish their keys as JWK sets. The `kty`/`crv` members select the
//! verifier; the coordinate or modulus members are re-encoded into the byte
//! format that verifier expects.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as b64url;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};

use super::{Algorithm, PublicKey, SignatureError};

/// A public JSON Web Key (RFC 7517).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `OKP`, `EC` or `RSA`.
    pub kty: String,
    /// Curve name for `OKP` and `EC` keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Public key (`OKP`) or x coordinate (`EC`), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// y coordinate (`EC`), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Modulus (`RSA`), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// Public exponent (`RSA`), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended algorithm, if the publisher pinned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

/// A JWK set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// The keys in the set.
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Finds a key by `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

fn member(value: Option<&String>, name: &str) -> Result<Vec<u8>, SignatureError> {
    let encoded =
        value.ok_or_else(|| SignatureError::MalformedKey(format!("JWK is missing `{name}`")))?;
    b64url
        .decode(encoded)
        .map_err(|e| SignatureError::MalformedKey(format!("JWK `{name}`: {e}")))
}

impl Jwk {
    /// Returns the algorithm selected by `kty`/`crv`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::UnsupportedAlgorithm`] for unknown key types.
    pub fn algorithm(&self) -> Result<Algorithm, SignatureError> {
        Algorithm::from_jwk(&self.kty, self.crv.as_deref()).ok_or_else(|| {
            SignatureError::UnsupportedAlgorithm(format!(
                "{}/{}",
                self.kty,
                self.crv.as_deref().unwrap_or("-")
            ))
        })
    }

    /// Decodes this JWK into a tagged public key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the key type is unsupported or a member
    /// is missing or malformed.
    pub fn to_public_key(&self) -> Result<PublicKey, SignatureError> {
        let algorithm = self.algorithm()?;
        let bytes = match algorithm {
            Algorithm::Ed25519 => {
                let x = member(self.x.as_ref(), "x")?;
                if x.len() != 32 {
                    return Err(SignatureError::MalformedKey(format!(
                        "Ed25519 `x` must be 32 bytes, got {}",
                        x.len()
                    )));
                }
                x
            }
            Algorithm::EcdsaP256 => {
                let x = member(self.x.as_ref(), "x")?;
                let y = member(self.y.as_ref(), "y")?;
                if x.len() != 32 || y.len() != 32 {
                    return Err(SignatureError::MalformedKey(
                        "P-256 coordinates must be 32 bytes".to_owned(),
                    ));
                }
                let mut point = Vec::with_capacity(65);
                point.push(0x04);
                point.extend_from_slice(&x);
                point.extend_from_slice(&y);
                point
            }
            Algorithm::RsaPssSha256 => {
                let n = member(self.n.as_ref(), "n")?;
                let e = member(self.e.as_ref(), "e")?;
                let key = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
                    .map_err(|err| SignatureError::MalformedKey(err.to_string()))?;
                key.to_pkcs1_der()
                    .map_err(|err| SignatureError::MalformedKey(err.to_string()))?
                    .as_bytes()
                    .to_vec()
            }
        };
        Ok(PublicKey::new(algorithm, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::VerifierRegistry;
    use ed25519_dalek::{Signer, SigningKey};

    fn ed25519_jwk(sk: &SigningKey) -> Jwk {
        Jwk {
            kty: "OKP".into(),
            crv: Some("Ed25519".into()),
            x: Some(b64url.encode(sk.verifying_key().to_bytes())),
            y: None,
            n: None,
            e: None,
            kid: Some("agent-key-1".into()),
            alg: Some("EdDSA".into()),
        }
    }

    #[test]
    fn test_ed25519_jwk_verifies() {
        let sk = SigningKey::from_bytes(&[3u8; 32]);
        let key = ed25519_jwk(&sk).to_public_key().unwrap();
        assert_eq!(key.algorithm, Algorithm::Ed25519);
        let sig = sk.sign(b"hello");
        let registry = VerifierRegistry::with_defaults();
        assert!(registry.verify(&key, b"hello", &sig.to_bytes()).is_ok());
    }

    #[test]
    fn test_p256_jwk_verifies() {
        use p256::ecdsa::signature::Signer as _;
        let sk = p256::ecdsa::SigningKey::from_slice(&[9u8; 32]).unwrap();
        let point = sk.verifying_key().to_encoded_point(false);
        let jwk = Jwk {
            kty: "EC".into(),
            crv: Some("P-256".into()),
            x: point.x().map(|x| b64url.encode(x)),
            y: point.y().map(|y| b64url.encode(y)),
            n: None,
            e: None,
            kid: None,
            alg: None,
        };
        let key = jwk.to_public_key().unwrap();
        let sig: p256::ecdsa::Signature = sk.sign(b"hello");
        let registry = VerifierRegistry::with_defaults();
        assert!(registry.verify(&key, b"hello", &sig.to_bytes()).is_ok());
    }

    #[test]
    fn test_jwks_find_and_missing_members() {
        let sk = SigningKey::from_bytes(&[3u8; 32]);
        let mut jwk = ed25519_jwk(&sk);
        let set = Jwks { keys: vec![jwk.clone()] };
        assert!(set.find("agent-key-1").is_some());
        assert!(set.find("other").is_none());

        jwk.x = None;
        assert!(matches!(jwk.to_public_key(), Err(SignatureError::MalformedKey(_))));
    }

    #[test]
    fn test_unsupported_kty() {
        let jwk: Jwk = serde_json::from_str(r#"{"kty":"oct","k":"c2VjcmV0"}"#).unwrap();
        assert!(matches!(
            jwk.to_public_key(),
            Err(SignatureError::UnsupportedAlgorithm(_))
        ));
    }
}
