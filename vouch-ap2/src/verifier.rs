//! Single-mandate and mandate-chain verification.
//!
//! A single mandate is checked in this order, stopping at the first failure:
//!
//! 1. not expired
//! 2. signing domain is allowed
//! 3. mandate id has no live replay record
//! 4. signer resolves from `proof.verification_method`
//! 5. `proof_value` is base64
//! 6. signature verifies over `domain|nonce|purpose|payload`
//!
//! The replay record is written last, atomically, and only when every check
//! passed. A mandate rejected for any other reason stays retryable.
//!
//! A chain first runs checks 1-6 on all three mandates (replay is consulted
//! for the payment only, since one intent or cart may back several payments),
//! then applies the binding rules, then consumes the payment id.

use std::sync::Arc;

use serde::Serialize;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use vouch::canonical::fingerprint;
use vouch::crypto::VerifierRegistry;
use vouch::encoding::Base64Bytes;
use vouch::identity::SignerResolver;
use vouch::replay::{ConsumedMandateCache, ReplayStore};
use vouch::{UnixTimestamp, Verdict};

use crate::config::Ap2Config;
use crate::error::Ap2Error;
use crate::types::{CartMandate, IntentMandate, Mandate, MandateBase, MandateBundle, PaymentMandate};

/// An accepted Intent → Cart → Payment chain.
///
/// Handed to the execution collaborator; never persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MandateChain {
    /// The user's intent.
    pub intent: IntentMandate,
    /// The merchant's cart.
    pub cart: CartMandate,
    /// The payment authorization.
    pub payment: PaymentMandate,
}

impl From<MandateBundle> for MandateChain {
    fn from(bundle: MandateBundle) -> Self {
        Self {
            intent: bundle.intent,
            cart: bundle.cart,
            payment: bundle.payment,
        }
    }
}

/// Verifies AP2 mandates and mandate chains.
#[derive(Debug, Clone)]
pub struct MandateVerifier {
    config: Ap2Config,
    signers: SignerResolver,
    verifiers: VerifierRegistry,
    replay: Arc<dyn ReplayStore>,
    consumed: Option<Arc<ConsumedMandateCache>>,
}

impl MandateVerifier {
    /// Creates a verifier with the default signature verifiers.
    #[must_use]
    pub fn new(config: Ap2Config, signers: SignerResolver, replay: Arc<dyn ReplayStore>) -> Self {
        Self {
            config,
            signers,
            verifiers: VerifierRegistry::with_defaults(),
            replay,
            consumed: None,
        }
    }

    /// Replaces the signature verifier registry.
    #[must_use]
    pub fn with_verifiers(mut self, verifiers: VerifierRegistry) -> Self {
        self.verifiers = verifiers;
        self
    }

    /// Also rejects chains whose payment content was already accepted under
    /// a different mandate id.
    ///
    /// The content key is the fingerprint of the payment mandate without its
    /// id, nonce, expiry and proof.
    #[must_use]
    pub fn with_consumed_cache(mut self, cache: Arc<ConsumedMandateCache>) -> Self {
        self.consumed = Some(cache);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Ap2Config {
        &self.config
    }

    /// Verifies one mandate and, on acceptance, consumes its id until it
    /// expires.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, fields(
        mandate_id = %mandate.base().mandate_id,
        kind = %M::KIND,
    )))]
    pub fn verify<M: Mandate>(&self, mandate: &M, now: UnixTimestamp) -> Verdict {
        let result = self
            .check_mandate(mandate, now, true)
            .and_then(|()| self.consume_id(mandate.base(), now));
        into_verdict(result)
    }

    /// Verifies a chain and, on acceptance, consumes the payment id.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, fields(
        payment_id = %bundle.payment.base.mandate_id,
    )))]
    pub fn verify_chain(&self, bundle: MandateBundle, now: UnixTimestamp) -> Verdict<MandateChain> {
        let result = self
            .check_chain(&bundle, now)
            .and_then(|()| self.commit_payment(&bundle.payment, now))
            .map(|()| MandateChain::from(bundle));
        into_verdict(result)
    }

    /// Strictly parses a JSON bundle, then verifies it as a chain.
    pub fn verify_chain_json(&self, json: &str, now: UnixTimestamp) -> Verdict<MandateChain> {
        match MandateBundle::from_json(json) {
            Ok(bundle) => self.verify_chain(bundle, now),
            Err(err) => into_verdict(Err(err)),
        }
    }

    fn check_mandate<M: Mandate>(
        &self,
        mandate: &M,
        now: UnixTimestamp,
        consult_replay: bool,
    ) -> Result<(), Ap2Error> {
        let base = mandate.base();
        if base.is_expired(now) {
            return Err(Ap2Error::Expired(base.mandate_id.clone()));
        }
        if !self.config.allows_domain(&base.domain) {
            return Err(Ap2Error::DomainNotAllowed(base.domain.clone()));
        }
        if consult_replay && self.replay.contains(&base.mandate_id, now) {
            return Err(Ap2Error::Replayed(base.mandate_id.clone()));
        }
        let key = self.signers.resolve(&base.proof.verification_method)?;
        let signature = Base64Bytes::from(base.proof.proof_value.as_str())
            .decode()
            .map_err(|_| Ap2Error::InvalidProofEncoding)?;
        self.verifiers
            .verify(&key, mandate.signing_input().as_bytes(), &signature)?;
        Ok(())
    }

    fn check_slot<M: Mandate>(&self, mandate: &M) -> Result<(), Ap2Error> {
        let base = mandate.base();
        if base.mandate_type != M::KIND {
            return Err(Ap2Error::TypeMismatch {
                expected: M::KIND,
                found: base.mandate_type,
            });
        }
        let expected = self.config.purposes.for_kind(M::KIND);
        if base.purpose != expected {
            return Err(Ap2Error::PurposeMismatch {
                kind: M::KIND,
                expected: expected.to_owned(),
                found: base.purpose.clone(),
            });
        }
        Ok(())
    }

    fn check_chain(&self, bundle: &MandateBundle, now: UnixTimestamp) -> Result<(), Ap2Error> {
        let MandateBundle {
            intent,
            cart,
            payment,
        } = bundle;

        self.check_mandate(intent, now, false)?;
        self.check_mandate(cart, now, false)?;
        self.check_mandate(payment, now, true)?;

        self.check_slot(intent)?;
        self.check_slot(cart)?;
        self.check_slot(payment)?;

        if intent.base.subject != cart.base.subject || cart.base.subject != payment.base.subject {
            return Err(Ap2Error::SubjectMismatch);
        }

        let merchant = payment
            .merchant_domain
            .as_deref()
            .ok_or(Ap2Error::PaymentMissingMerchantDomain)?;
        if cart.merchant_domain != merchant {
            return Err(Ap2Error::MerchantDomainMismatch {
                cart: cart.merchant_domain.clone(),
                payment: merchant.to_owned(),
            });
        }

        if let Some(presence) = payment
            .agent_presence
            .as_ref()
            .filter(|presence| !self.config.allowed_agent_presence.contains(*presence))
        {
            return Err(Ap2Error::AgentPresenceRequired(presence.clone()));
        }
        if let Some(modality) = payment
            .transaction_modality
            .as_ref()
            .filter(|modality| !self.config.allowed_modalities.contains(*modality))
        {
            return Err(Ap2Error::InvalidModality(modality.clone()));
        }

        let cart_total = cart.total_minor().unwrap_or(u64::MAX);
        if payment.amount_minor != cart_total {
            return Err(Ap2Error::PaymentAmountMismatch {
                payment: payment.amount_minor,
                cart_total,
            });
        }
        if let Some(requested) = intent
            .requested_amount
            .filter(|requested| payment.amount_minor > *requested)
        {
            return Err(Ap2Error::IntentAmountExceeded {
                payment: payment.amount_minor,
                requested,
            });
        }
        Ok(())
    }

    fn consume_id(&self, base: &MandateBase, now: UnixTimestamp) -> Result<(), Ap2Error> {
        if self
            .replay
            .check_and_store(&base.mandate_id, base.expires_at, now)?
        {
            Ok(())
        } else {
            Err(Ap2Error::Replayed(base.mandate_id.clone()))
        }
    }

    fn commit_payment(&self, payment: &PaymentMandate, now: UnixTimestamp) -> Result<(), Ap2Error> {
        let Some(cache) = &self.consumed else {
            return self.consume_id(&payment.base, now);
        };
        let mut content =
            serde_json::to_value(payment).map_err(|e| Ap2Error::MalformedBundle(e.to_string()))?;
        if let Some(object) = content.as_object_mut() {
            for volatile in ["mandate_id", "nonce", "expires_at", "proof"] {
                object.remove(volatile);
            }
        }
        let hash = fingerprint(&content).map_err(|e| Ap2Error::MalformedBundle(e.to_string()))?;
        let ttl = payment.base.expires_at.seconds_since(now);
        if !cache.consume_mandate(&hash, content, Some(ttl), now) {
            return Err(Ap2Error::ContentReplayed(hash));
        }
        self.consume_id(&payment.base, now).inspect_err(|_| {
            cache.revoke_mandate(&hash);
        })
    }
}

fn into_verdict<T>(result: Result<T, Ap2Error>) -> Verdict<T> {
    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        use vouch::Reason;
        match err {
            Ap2Error::Replayed(_) | Ap2Error::ContentReplayed(_) => {
                tracing::warn!(reason = %err.reason(), "mandate replay rejected");
            }
            _ => tracing::debug!(reason = %err.reason(), error = %err, "mandate rejected"),
        }
    }
    Verdict::from(result)
}
