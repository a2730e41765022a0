//! TAP message-signature header validation.
//!
//! [`TapValidator::validate`] checks, in order:
//!
//! 1. `Signature-Input` parses
//! 2. `Signature` parses and carries the same label
//! 3. `tag` is a registered authorization context
//! 4. `alg` is the configured algorithm
//! 5. `created <= now < expires`
//! 6. `expires - created` is within the configured maximum
//! 7. the nonce has no live record, when a nonce store is configured
//! 8. every covered component is present in the request
//!
//! On acceptance the nonce is recorded until `expires` and the reconstructed
//! signature base is returned. The detached signature itself is checked by
//! [`TapValidator::verify_with_key`] once the caller has resolved `keyid`.

use std::sync::Arc;

#[cfg(feature = "telemetry")]
use tracing::instrument;
use vouch::crypto::{PublicKey, VerifierRegistry};
use vouch::replay::ReplayStore;
use vouch::{UnixTimestamp, Verdict};

use crate::base::{RequestComponents, signature_base};
use crate::config::TapConfig;
use crate::error::TapError;
use crate::signature_input::{SignatureHeader, SignatureInput};

const NONCE_KEY_PREFIX: &str = "tap-nonce:";

/// A message signature whose headers passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignature {
    /// The parsed `Signature-Input`.
    pub input: SignatureInput,
    /// The decoded detached signature.
    pub signature: Vec<u8>,
    /// The reconstructed signature base.
    pub signature_base: String,
}

/// Validates TAP `Signature-Input` / `Signature` header pairs.
#[derive(Debug, Clone)]
pub struct TapValidator {
    config: TapConfig,
    nonces: Option<Arc<dyn ReplayStore>>,
    verifiers: VerifierRegistry,
}

impl TapValidator {
    /// Creates a validator without nonce tracking.
    #[must_use]
    pub fn new(config: TapConfig) -> Self {
        Self {
            config,
            nonces: None,
            verifiers: VerifierRegistry::with_defaults(),
        }
    }

    /// Rejects nonces already recorded in `store`.
    #[must_use]
    pub fn with_nonce_store(mut self, store: Arc<dyn ReplayStore>) -> Self {
        self.nonces = Some(store);
        self
    }

    /// Replaces the signature verifier registry.
    #[must_use]
    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = verifiers;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Validates a header pair against `request` at `now`.
    #[cfg_attr(feature = "telemetry", instrument(skip_all))]
    pub fn validate(
        &self,
        signature_input: &str,
        signature: &str,
        request: &RequestComponents,
        now: UnixTimestamp,
    ) -> Verdict<ValidatedSignature> {
        into_verdict(self.check(signature_input, signature, request, now))
    }

    /// Verifies the detached signature of a validated message with the key
    /// resolved for its `keyid`.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, fields(keyid = %validated.input.keyid)))]
    pub fn verify_with_key(&self, validated: &ValidatedSignature, key: &PublicKey) -> Verdict {
        let result = if key.algorithm == self.config.algorithm {
            self.verifiers
                .verify(
                    key,
                    validated.signature_base.as_bytes(),
                    &validated.signature,
                )
                .map_err(|_| TapError::SignatureInvalid)
        } else {
            Err(TapError::AlgInvalid(key.algorithm.to_string()))
        };
        into_verdict(result)
    }

    fn check(
        &self,
        signature_input: &str,
        signature: &str,
        request: &RequestComponents,
        now: UnixTimestamp,
    ) -> Result<ValidatedSignature, TapError> {
        let input = SignatureInput::parse(signature_input)?;
        let header = SignatureHeader::parse(signature)?;
        if header.label != input.label {
            return Err(TapError::LabelMismatch {
                input: input.label,
                signature: header.label,
            });
        }
        if !self.config.allows_tag(&input.tag) {
            return Err(TapError::TagInvalid(input.tag));
        }
        if !self.config.allows_alg(&input.alg) {
            return Err(TapError::AlgInvalid(input.alg));
        }

        let now_secs = now.as_secs();
        if now_secs < input.created {
            return Err(TapError::NotYetValid {
                created: input.created,
            });
        }
        if now_secs >= input.expires {
            return Err(TapError::Expired {
                expires: input.expires,
            });
        }
        let window = input.window_secs();
        if window > self.config.max_window_secs {
            return Err(TapError::WindowTooLarge {
                window,
                max: self.config.max_window_secs,
            });
        }

        let nonce_key = format!("{NONCE_KEY_PREFIX}{}", input.nonce);
        if let Some(nonces) = &self.nonces
            && nonces.contains(&nonce_key, now)
        {
            return Err(TapError::NonceReplayed(input.nonce));
        }

        let base = signature_base(&input, request)?;

        if let Some(nonces) = &self.nonces
            && !nonces.check_and_store(&nonce_key, UnixTimestamp::from_secs(input.expires), now)?
        {
            return Err(TapError::NonceReplayed(input.nonce));
        }

        Ok(ValidatedSignature {
            input,
            signature: header.signature,
            signature_base: base,
        })
    }
}

fn into_verdict<T>(result: Result<T, TapError>) -> Verdict<T> {
    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        use vouch::Reason;
        match err {
            TapError::NonceReplayed(nonce) => {
                tracing::warn!(nonce = %nonce, "tap nonce replay rejected");
            }
            _ => tracing::debug!(reason = %err.reason(), error = %err, "tap signature rejected"),
        }
    }
    Verdict::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch::replay::InMemoryReplayStore;

    const NOW: u64 = 1_735_689_700;

    fn headers(window: u64, tag: &str, alg: &str, nonce: &str) -> (String, &'static str) {
        let created = NOW - 60;
        let input = format!(
            r#"sig2=("@authority" "@path");created={created};keyid="k1";alg="{alg}";expires={};nonce="{nonce}";tag="{tag}""#,
            created + window
        );
        (input, "sig2=:AQID:")
    }

    fn request() -> RequestComponents {
        RequestComponents::new()
            .authority("merchant.example")
            .path("/checkout")
    }

    fn validate(validator: &TapValidator, input: &str, signature: &str) -> Verdict<ValidatedSignature> {
        validator.validate(input, signature, &request(), UnixTimestamp::from_secs(NOW))
    }

    #[test]
    fn test_window_limits() {
        let validator = TapValidator::new(TapConfig::default());
        let (input, sig) = headers(240, "agent-browser-auth", "ed25519", "n");
        let validated = validate(&validator, &input, sig).accepted().unwrap();
        assert_eq!(validated.signature, [1, 2, 3]);
        assert!(validated.signature_base.starts_with("\"@authority\": merchant.example\n"));

        let (input, sig) = headers(630, "agent-browser-auth", "ed25519", "n");
        assert_eq!(
            validate(&validator, &input, sig).reason(),
            Some("tap_window_too_large")
        );
    }

    #[test]
    fn test_tag_and_alg() {
        let validator = TapValidator::new(TapConfig::default());
        let (input, sig) = headers(240, "agent-admin", "ed25519", "n");
        assert_eq!(validate(&validator, &input, sig).reason(), Some("tap_tag_invalid"));

        let (input, sig) = headers(240, "agent-payer-auth", "rsa-pss-sha256", "n");
        assert_eq!(validate(&validator, &input, sig).reason(), Some("tap_alg_invalid"));
    }

    #[test]
    fn test_time_bounds() {
        let validator = TapValidator::new(TapConfig::default());
        let future = format!(
            r#"sig2=("@authority");created={};keyid="k";alg="ed25519";expires={};nonce="n";tag="agent-browser-auth""#,
            NOW + 10,
            NOW + 100
        );
        assert_eq!(
            validate(&validator, &future, "sig2=:AQID:").reason(),
            Some("tap_signature_not_yet_valid")
        );
        let stale = format!(
            r#"sig2=("@authority");created={};keyid="k";alg="ed25519";expires={NOW};nonce="n";tag="agent-browser-auth""#,
            NOW - 100
        );
        assert_eq!(
            validate(&validator, &stale, "sig2=:AQID:").reason(),
            Some("tap_signature_expired")
        );
    }

    #[test]
    fn test_nonce_replay() {
        let store = Arc::new(InMemoryReplayStore::default());
        let validator = TapValidator::new(TapConfig::default()).with_nonce_store(store.clone());
        let (input, sig) = headers(240, "agent-browser-auth", "ed25519", "once");
        assert!(validate(&validator, &input, sig).is_accepted());
        assert_eq!(validate(&validator, &input, sig).reason(), Some("tap_nonce_replayed"));
        assert_eq!(store.len(), 1);

        // Without a store the same headers keep passing.
        let stateless = TapValidator::new(TapConfig::default());
        assert!(validate(&stateless, &input, sig).is_accepted());
        assert!(validate(&stateless, &input, sig).is_accepted());
    }

    #[test]
    fn test_rejection_does_not_record_nonce() {
        let store = Arc::new(InMemoryReplayStore::default());
        let validator = TapValidator::new(TapConfig::default()).with_nonce_store(store.clone());
        let (input, sig) = headers(240, "agent-browser-auth", "ed25519", "retry");
        let bare = RequestComponents::new().authority("merchant.example");
        let verdict = validator.validate(&input, sig, &bare, UnixTimestamp::from_secs(NOW));
        assert_eq!(verdict.reason(), Some("tap_component_missing"));
        assert!(store.is_empty());
        assert!(validate(&validator, &input, sig).is_accepted());
    }

    #[test]
    fn test_label_and_signature_structure() {
        let validator = TapValidator::new(TapConfig::default());
        let (input, _) = headers(240, "agent-browser-auth", "ed25519", "n");
        assert_eq!(
            validate(&validator, &input, "sig1=:AQID:").reason(),
            Some("tap_signature_label_mismatch")
        );
        assert_eq!(
            validate(&validator, &input, "sig2=AQID").reason(),
            Some("tap_signature_malformed")
        );
        assert_eq!(
            validate(&validator, "garbage", "sig2=:AQID:").reason(),
            Some("tap_signature_input_malformed")
        );
    }
}
