//! Challenge issuance and payload verification.

use alloy_primitives::hex;
use rand::RngExt;
use rand::rng;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use vouch::crypto::SignatureError;
use vouch::{UnixTimestamp, Verdict};

use crate::config::X402Config;
use crate::error::{HeaderError, X402Error};
use crate::headers::{PAYMENT_REQUIRED_STATUS, encode_challenge};
use crate::types::{ChallengeTerms, IssuedChallenge, X402Challenge, X402PaymentPayload};

/// Checks a payload's signature against the challenge it answers.
///
/// `Ok(false)` and `Err(_)` are both rejections.
pub trait PaymentSignatureVerifier: Send + Sync {
    /// Verifies the payload signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the signature cannot be checked.
    fn verify(
        &self,
        payload: &X402PaymentPayload,
        challenge: &X402Challenge,
    ) -> Result<bool, SignatureError>;
}

impl<F> PaymentSignatureVerifier for F
where
    F: Fn(&X402PaymentPayload, &X402Challenge) -> Result<bool, SignatureError> + Send + Sync,
{
    fn verify(
        &self,
        payload: &X402PaymentPayload,
        challenge: &X402Challenge,
    ) -> Result<bool, SignatureError> {
        self(payload, challenge)
    }
}

fn random_hex<const N: usize>() -> String {
    let bytes: [u8; N] = rng().random();
    hex::encode(bytes)
}

/// Issues a challenge with a fresh payment id and nonce, expiring `ttl_secs`
/// after `now` (the configured lifetime when `None`).
///
/// # Errors
///
/// Returns [`HeaderError::Serialize`] if the header value cannot be encoded.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(resource = %terms.resource_uri)))]
pub fn generate_challenge(
    config: &X402Config,
    terms: ChallengeTerms,
    ttl_secs: Option<u64>,
    now: UnixTimestamp,
) -> Result<IssuedChallenge, HeaderError> {
    let challenge = X402Challenge {
        payment_id: random_hex::<16>(),
        resource_uri: terms.resource_uri,
        amount: terms.amount,
        currency: terms.currency,
        payee_address: terms.payee_address,
        network: terms.network,
        token_address: terms.token_address,
        expires_at: now + ttl_secs.unwrap_or(config.challenge_ttl_secs),
        nonce: random_hex::<32>(),
    };
    let header_value = encode_challenge(&challenge)?;
    #[cfg(feature = "telemetry")]
    tracing::debug!(payment_id = %challenge.payment_id, expires_at = %challenge.expires_at, "issued x402 challenge");
    Ok(IssuedChallenge {
        challenge,
        header_value,
        http_status: PAYMENT_REQUIRED_STATUS,
    })
}

fn check_payload(
    payload: &X402PaymentPayload,
    challenge: &X402Challenge,
    verifier: Option<&dyn PaymentSignatureVerifier>,
    now: UnixTimestamp,
) -> Result<(), X402Error> {
    if challenge.is_expired(now) {
        return Err(X402Error::ChallengeExpired {
            payment_id: challenge.payment_id.clone(),
        });
    }
    if payload.payment_id != challenge.payment_id {
        return Err(X402Error::PaymentIdMismatch {
            challenge: challenge.payment_id.clone(),
            payload: payload.payment_id.clone(),
        });
    }
    if payload.nonce != challenge.nonce {
        return Err(X402Error::NonceMismatch);
    }
    if payload.amount != challenge.amount {
        return Err(X402Error::AmountMismatch {
            challenge: challenge.amount.clone(),
            payload: payload.amount.clone(),
        });
    }
    match verifier.map(|v| v.verify(payload, challenge)) {
        None | Some(Ok(true)) => Ok(()),
        Some(Ok(false)) => Err(X402Error::SignatureInvalid),
        Some(Err(err)) => {
            #[cfg(feature = "telemetry")]
            tracing::warn!(payment_id = %payload.payment_id, error = %err, "payment signature verifier failed");
            #[cfg(not(feature = "telemetry"))]
            let _ = err;
            Err(X402Error::SignatureInvalid)
        }
    }
}

/// Verifies a payload against the challenge it answers.
///
/// Checks expiry, payment id, nonce and amount, then the signature when a
/// `verifier` is given.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(payment_id = %challenge.payment_id)))]
pub fn verify_payment_payload(
    payload: &X402PaymentPayload,
    challenge: &X402Challenge,
    verifier: Option<&dyn PaymentSignatureVerifier>,
    now: UnixTimestamp,
) -> Verdict {
    into_verdict(check_payload(payload, challenge, verifier, now))
}

/// Accepts an empty version or one listed in `config.supported_versions`.
///
/// The comparison is exact: surrounding whitespace is not stripped.
pub fn validate_x402_version(config: &X402Config, version: &str) -> Verdict {
    let result = if version.is_empty() || config.supported_versions.iter().any(|v| v == version) {
        Ok(())
    } else {
        Err(X402Error::UnsupportedVersion(version.to_owned()))
    };
    into_verdict(result)
}

fn into_verdict(result: Result<(), X402Error>) -> Verdict {
    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        tracing::debug!(reason = %vouch::Reason::reason(err), error = %err, "x402 payment rejected");
    }
    Verdict::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_800_000_000;

    fn terms() -> ChallengeTerms {
        ChallengeTerms {
            resource_uri: "https://api.example/report".into(),
            amount: "10000".into(),
            currency: "USDC".into(),
            payee_address: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".into(),
            network: "base-sepolia".into(),
            token_address: None,
        }
    }

    fn issue() -> X402Challenge {
        generate_challenge(&X402Config::default(), terms(), None, UnixTimestamp::from_secs(NOW))
            .unwrap()
            .challenge
    }

    fn answer(challenge: &X402Challenge) -> X402PaymentPayload {
        X402PaymentPayload {
            payment_id: challenge.payment_id.clone(),
            payer_address: "0x857b06519E91e3A54538791bDbb0E22373e36b66".into(),
            amount: challenge.amount.clone(),
            nonce: challenge.nonce.clone(),
            signature: "0xsig".into(),
        }
    }

    fn at(secs: u64) -> UnixTimestamp {
        UnixTimestamp::from_secs(secs)
    }

    #[test]
    fn test_generate_challenge() {
        let issued =
            generate_challenge(&X402Config::default(), terms(), Some(60), at(NOW)).unwrap();
        assert_eq!(issued.http_status, 402);
        assert_eq!(issued.challenge.expires_at, at(NOW + 60));
        assert_eq!(issued.challenge.payment_id.len(), 32);
        assert_eq!(issued.challenge.nonce.len(), 64);
        assert_eq!(
            crate::headers::decode_challenge(&issued.header_value).unwrap(),
            issued.challenge
        );

        let other = issue();
        assert_ne!(other.payment_id, issued.challenge.payment_id);
        assert_ne!(other.nonce, issued.challenge.nonce);
        assert_eq!(other.expires_at, at(NOW + 300));
    }

    #[test]
    fn test_each_mismatch_has_its_reason() {
        let challenge = issue();
        assert!(verify_payment_payload(&answer(&challenge), &challenge, None, at(NOW)).is_accepted());

        let verdict = verify_payment_payload(&answer(&challenge), &challenge, None, at(NOW + 300));
        assert_eq!(verdict.reason(), Some("challenge_expired"));

        let mut payload = answer(&challenge);
        payload.payment_id = "other".into();
        let verdict = verify_payment_payload(&payload, &challenge, None, at(NOW));
        assert_eq!(verdict.reason(), Some("payment_id_mismatch"));

        let mut payload = answer(&challenge);
        payload.nonce = "other".into();
        let verdict = verify_payment_payload(&payload, &challenge, None, at(NOW));
        assert_eq!(verdict.reason(), Some("nonce_mismatch"));

        let mut payload = answer(&challenge);
        payload.amount = "9999".into();
        let verdict = verify_payment_payload(&payload, &challenge, None, at(NOW));
        assert_eq!(verdict.reason(), Some("amount_mismatch"));
    }

    #[test]
    fn test_signature_verifier() {
        let challenge = issue();
        let payload = answer(&challenge);
        let accepts = |p: &X402PaymentPayload, _: &X402Challenge| -> Result<bool, SignatureError> {
            Ok(p.signature == "0xsig")
        };
        let refuses = |_: &X402PaymentPayload, _: &X402Challenge| -> Result<bool, SignatureError> {
            Ok(false)
        };
        let fails = |_: &X402PaymentPayload, _: &X402Challenge| -> Result<bool, SignatureError> {
            Err(SignatureError::MalformedSignature("truncated".into()))
        };

        assert!(verify_payment_payload(&payload, &challenge, Some(&accepts), at(NOW)).is_accepted());
        let verifiers: [&dyn PaymentSignatureVerifier; 2] = [&refuses, &fails];
        for verifier in verifiers {
            let verdict = verify_payment_payload(&payload, &challenge, Some(verifier), at(NOW));
            assert_eq!(verdict.reason(), Some("signature_invalid"));
        }
    }

    #[test]
    fn test_version() {
        let config = X402Config::default();
        for ok in ["", "1", "2"] {
            assert!(validate_x402_version(&config, ok).is_accepted(), "{ok}");
        }
        for bad in ["3", "v2", "1.0", "   ", " 2 "] {
            assert_eq!(
                validate_x402_version(&config, bad).reason(),
                Some("unsupported_version")
            );
        }
    }

    #[test]
    fn test_rejection_carries_error_message() {
        let rejection = validate_x402_version(&X402Config::default(), "3")
            .into_result()
            .unwrap_err();
        assert_eq!(rejection.reason(), "unsupported_version");
        assert_eq!(rejection.message(), Some("x402 version `3` is not supported"));
    }
}
