//! Linked objects carried alongside a TAP message signature.
//!
//! Two object kinds share one contract:
//!
//! - **Agentic consumer** (`nonce`, `idToken`, `kid`, `alg`, `signature`):
//!   attests the consumer on whose behalf the agent acts.
//! - **Agentic payment container** (`nonce`, `kid`, `alg`, `signature`):
//!   wraps payment data for the merchant.
//!
//! Each object must echo the header-level nonce. Its own signature covers the
//! canonical JSON of the object without the `signature` member. Signature
//! checking is delegated to a [`LinkedObjectVerifier`]; any verifier error is
//! a rejection.

use std::fmt;

use serde_json::{Map, Value};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use vouch::canonical::canonical_json_without;
use vouch::crypto::{Algorithm, Jwks, SignatureError, VerifierRegistry};
use vouch::encoding::Base64Bytes;
use vouch::Verdict;

use crate::error::LinkedObjectError;

/// The linked object formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkedObjectKind {
    /// Consumer attestation object.
    AgenticConsumer,
    /// Payment container object.
    AgenticPaymentContainer,
}

impl LinkedObjectKind {
    /// Prefix of every rejection reason for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::AgenticConsumer => "agentic_consumer",
            Self::AgenticPaymentContainer => "agentic_payment_container",
        }
    }

    /// Members that must be present as non-empty strings, in check order.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::AgenticConsumer => &["nonce", "idToken", "kid", "alg", "signature"],
            Self::AgenticPaymentContainer => &["nonce", "kid", "alg", "signature"],
        }
    }
}

impl fmt::Display for LinkedObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AgenticConsumer => "agentic consumer object",
            Self::AgenticPaymentContainer => "agentic payment container",
        })
    }
}

/// What a [`LinkedObjectVerifier`] is asked to check.
#[derive(Debug, Clone, Copy)]
pub struct LinkedSignature<'a> {
    /// The object's `kid`.
    pub kid: &'a str,
    /// The object's `alg`.
    pub alg: &'a str,
    /// Canonical JSON of the object without `signature`.
    pub message: &'a [u8],
    /// The object's `signature` member, as sent.
    pub signature: &'a str,
}

/// Checks a linked object's own signature.
///
/// `Ok(false)` and `Err(_)` are both rejections.
pub trait LinkedObjectVerifier: Send + Sync {
    /// Verifies one linked signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the key or signature cannot be used.
    fn verify(&self, signature: &LinkedSignature<'_>) -> Result<bool, SignatureError>;
}

impl<F> LinkedObjectVerifier for F
where
    F: Fn(&LinkedSignature<'_>) -> Result<bool, SignatureError> + Send + Sync,
{
    fn verify(&self, signature: &LinkedSignature<'_>) -> Result<bool, SignatureError> {
        self(signature)
    }
}

/// Verifies linked objects against a published JWK set, selecting the key by
/// `kid`.
///
/// The object's `alg` must name the key's algorithm. Signatures are base64,
/// standard or URL-safe.
#[derive(Debug, Clone)]
pub struct JwksVerifier {
    jwks: Jwks,
    verifiers: VerifierRegistry,
}

impl JwksVerifier {
    /// Creates a verifier over `jwks` with the default algorithms.
    #[must_use]
    pub fn new(jwks: Jwks) -> Self {
        Self {
            jwks,
            verifiers: VerifierRegistry::with_defaults(),
        }
    }

    /// Replaces the signature verifier registry.
    #[must_use]
    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = verifiers;
        self
    }
}

impl LinkedObjectVerifier for JwksVerifier {
    fn verify(&self, signature: &LinkedSignature<'_>) -> Result<bool, SignatureError> {
        let jwk = self.jwks.find(signature.kid).ok_or_else(|| {
            SignatureError::MalformedKey(format!("no key with kid `{}`", signature.kid))
        })?;
        let key = jwk.to_public_key()?;
        let declared = Algorithm::from_name(signature.alg)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(signature.alg.to_owned()))?;
        if declared != key.algorithm {
            return Err(SignatureError::UnsupportedAlgorithm(format!(
                "alg `{}` does not match key type {}",
                signature.alg, key.algorithm
            )));
        }
        let bytes = Base64Bytes::from(signature.signature)
            .decode()
            .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
        match self.verifiers.verify(&key, signature.message, &bytes) {
            Ok(()) => Ok(true),
            Err(SignatureError::Mismatch) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    kind: LinkedObjectKind,
    field: &'static str,
) -> Result<&'a str, LinkedObjectError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(LinkedObjectError::MissingField { kind, field })
}

fn check_linked(
    kind: LinkedObjectKind,
    object: &Value,
    header_nonce: &str,
    verifier: Option<&dyn LinkedObjectVerifier>,
) -> Result<(), LinkedObjectError> {
    let map = object
        .as_object()
        .ok_or(LinkedObjectError::Malformed { kind })?;
    for field in kind.required_fields() {
        required_str(map, kind, field)?;
    }
    let nonce = required_str(map, kind, "nonce")?;
    if nonce != header_nonce {
        return Err(LinkedObjectError::NonceMismatch { kind });
    }
    let alg = required_str(map, kind, "alg")?;
    if alg.eq_ignore_ascii_case("none") || alg.eq_ignore_ascii_case("null") {
        return Err(LinkedObjectError::AlgInvalid {
            kind,
            alg: alg.to_owned(),
        });
    }
    let Some(verifier) = verifier else {
        return Ok(());
    };
    let message = canonical_json_without(object, "signature")
        .map_err(|_| LinkedObjectError::Malformed { kind })?;
    let signature = LinkedSignature {
        kid: required_str(map, kind, "kid")?,
        alg,
        message: message.as_bytes(),
        signature: required_str(map, kind, "signature")?,
    };
    match verifier.verify(&signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(LinkedObjectError::SignatureInvalid { kind }),
        Err(err) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(%kind, kid = signature.kid, error = %err, "linked object verifier failed");
            #[cfg(not(feature = "telemetry"))]
            let _ = err;
            Err(LinkedObjectError::SignatureInvalid { kind })
        }
    }
}

fn into_verdict(result: Result<(), LinkedObjectError>) -> Verdict {
    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        tracing::debug!(reason = %vouch::Reason::reason(err), "linked object rejected");
    }
    Verdict::from(result)
}

/// Validates an agentic consumer object against the message signature nonce.
///
/// Without a `verifier` only structure, nonce binding and `alg` are checked.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
pub fn validate_agentic_consumer_object(
    object: &Value,
    header_nonce: &str,
    verifier: Option<&dyn LinkedObjectVerifier>,
) -> Verdict {
    into_verdict(check_linked(
        LinkedObjectKind::AgenticConsumer,
        object,
        header_nonce,
        verifier,
    ))
}

/// Validates an agentic payment container against the message signature
/// nonce.
///
/// Without a `verifier` only structure, nonce binding and `alg` are checked.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
pub fn validate_agentic_payment_container(
    object: &Value,
    header_nonce: &str,
    verifier: Option<&dyn LinkedObjectVerifier>,
) -> Verdict {
    into_verdict(check_linked(
        LinkedObjectKind::AgenticPaymentContainer,
        object,
        header_nonce,
        verifier,
    ))
}
