//! AP2 mandate wire types.
//!
//! A mandate is a signed, time-bounded authorization. Three kinds are chained
//! together for one purchase: the user's [`IntentMandate`], the merchant's
//! [`CartMandate`] and the [`PaymentMandate`] that moves funds. All three
//! share the [`MandateBase`] fields and carry a [`Proof`].
//!
//! Amounts are integer minor units. They deserialize from JSON numbers or
//! decimal strings and serialize as numbers.
//!
//! Parsing is strict: [`MandateBundle::from_json`] rejects unknown fields
//! anywhere in the bundle before any verification runs.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use vouch::UnixTimestamp;
use vouch::canonical::{Canonicalize, domain_separated};

use crate::error::Ap2Error;

/// A detached signature over a mandate's domain-separated payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Proof {
    /// `<controller>#<scheme>:<hex-public-key>`.
    pub verification_method: String,
    /// When the proof was produced.
    pub created: UnixTimestamp,
    /// Proof purpose declared by the signer.
    pub proof_purpose: String,
    /// Base64-encoded raw signature.
    pub proof_value: String,
}

/// The kind of a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MandateType {
    /// User intent.
    Intent,
    /// Merchant cart.
    Cart,
    /// Payment authorization.
    Payment,
}

impl MandateType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::Cart => "cart",
            Self::Payment => "payment",
        }
    }
}

impl fmt::Display for MandateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every mandate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateBase {
    /// Unique id, consumed by the replay store on acceptance.
    pub mandate_id: String,
    /// Declared kind.
    pub mandate_type: MandateType,
    /// Who issued the mandate.
    pub issuer: String,
    /// The party the mandate is about; identical across a chain.
    pub subject: String,
    /// Expiry; the mandate is expired once `now >= expires_at`.
    pub expires_at: UnixTimestamp,
    /// Signing nonce, part of the domain-separation prefix.
    pub nonce: String,
    /// Signature over the domain-separated canonical payload.
    pub proof: Proof,
    /// Signing domain, checked against the allowed-domain set.
    pub domain: String,
    /// Signing purpose.
    pub purpose: String,
}

const BASE_FIELDS: &[&str] = &[
    "mandate_id",
    "mandate_type",
    "issuer",
    "subject",
    "expires_at",
    "nonce",
    "proof",
    "domain",
    "purpose",
];

impl MandateBase {
    /// Returns `true` once `now >= expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: UnixTimestamp) -> bool {
        self.expires_at.is_reached(now)
    }
}

/// Behavior shared by the three mandate kinds.
pub trait Mandate: Canonicalize + Serialize + DeserializeOwned {
    /// The kind this type represents.
    const KIND: MandateType;

    /// Type-specific field names, in addition to the base fields.
    const FIELDS: &'static [&'static str];

    /// Returns the shared fields.
    fn base(&self) -> &MandateBase;

    /// Returns the exact string the proof signs: `domain|nonce|purpose|payload`.
    fn signing_input(&self) -> String {
        let base = self.base();
        domain_separated(&base.domain, &base.nonce, &base.purpose, &self.canonical_payload())
    }

    /// Strictly deserializes a mandate from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Ap2Error::MalformedBundle`] on unknown, missing or
    /// mistyped fields.
    fn from_value(value: Value) -> Result<Self, Ap2Error> {
        ensure_known_fields(Self::KIND.as_str(), &value, Self::FIELDS)?;
        serde_json::from_value(value)
            .map_err(|e| Ap2Error::MalformedBundle(format!("{}: {e}", Self::KIND)))
    }
}

fn ensure_known_fields(slot: &str, value: &Value, fields: &[&str]) -> Result<(), Ap2Error> {
    let object = value
        .as_object()
        .ok_or_else(|| Ap2Error::MalformedBundle(format!("`{slot}` must be an object")))?;
    match object
        .keys()
        .find(|key| !BASE_FIELDS.contains(&key.as_str()) && !fields.contains(&key.as_str()))
    {
        Some(unknown) => Err(Ap2Error::MalformedBundle(format!(
            "`{slot}` has unknown field `{unknown}`"
        ))),
        None => Ok(()),
    }
}

/// The user's statement of what an agent may buy.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMandate {
    /// Shared fields.
    #[serde(flatten)]
    pub base: MandateBase,
    /// Ordered capability strings.
    pub scope: Vec<String>,
    /// Optional spending ceiling in minor units.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_amount: Option<u64>,
}

impl Mandate for IntentMandate {
    const KIND: MandateType = MandateType::Intent;
    const FIELDS: &'static [&'static str] = &["scope", "requested_amount"];

    fn base(&self) -> &MandateBase {
        &self.base
    }
}

/// One cart line.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItem {
    /// Item id (`sku` is accepted as an alias).
    #[serde(alias = "sku")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price in minor units.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub price_minor: u64,
}

/// The merchant's signed cart.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMandate {
    /// Shared fields.
    #[serde(flatten)]
    pub base: MandateBase,
    /// Cart lines, in the order the merchant listed them.
    pub line_items: Vec<LineItem>,
    /// Merchant's domain.
    pub merchant_domain: String,
    /// ISO 4217 currency or token symbol.
    pub currency: String,
    /// Sum of line totals in minor units.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub subtotal_minor: u64,
    /// Taxes in minor units.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub taxes_minor: u64,
}

impl Mandate for CartMandate {
    const KIND: MandateType = MandateType::Cart;
    const FIELDS: &'static [&'static str] = &[
        "line_items",
        "merchant_domain",
        "currency",
        "subtotal_minor",
        "taxes_minor",
    ];

    fn base(&self) -> &MandateBase {
        &self.base
    }
}

impl CartMandate {
    /// Returns `subtotal_minor + taxes_minor`, or `None` on overflow.
    #[must_use]
    pub const fn total_minor(&self) -> Option<u64> {
        self.subtotal_minor.checked_add(self.taxes_minor)
    }
}

/// The authorization that moves funds.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMandate {
    /// Shared fields.
    #[serde(flatten)]
    pub base: MandateBase,
    /// Settlement chain.
    pub chain: String,
    /// Token symbol or contract.
    pub token: String,
    /// Amount in minor units.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub amount_minor: u64,
    /// Recipient address.
    pub destination: String,
    /// Hash linking the payment to the audit trail.
    pub audit_hash: String,
    /// Merchant's domain; must match the cart's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_domain: Option<String>,
    /// Agent-presence signal, checked against the configured set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_presence: Option<String>,
    /// Transaction modality, checked against the configured set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_modality: Option<String>,
}

impl Mandate for PaymentMandate {
    const KIND: MandateType = MandateType::Payment;
    const FIELDS: &'static [&'static str] = &[
        "chain",
        "token",
        "amount_minor",
        "destination",
        "audit_hash",
        "merchant_domain",
        "agent_presence",
        "transaction_modality",
    ];

    fn base(&self) -> &MandateBase {
        &self.base
    }
}

/// An intent, cart and payment submitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateBundle {
    /// The user's intent.
    pub intent: IntentMandate,
    /// The merchant's cart.
    pub cart: CartMandate,
    /// The payment authorization.
    pub payment: PaymentMandate,
}

impl MandateBundle {
    /// Parses a bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Ap2Error::MalformedBundle`] if the text is not JSON, a slot
    /// is missing, or any object carries unknown or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, Ap2Error> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Ap2Error::MalformedBundle(e.to_string()))?;
        Self::from_value(value)
    }

    /// Strictly converts a JSON value into a bundle.
    ///
    /// # Errors
    ///
    /// See [`MandateBundle::from_json`].
    pub fn from_value(value: Value) -> Result<Self, Ap2Error> {
        let Value::Object(mut object) = value else {
            return Err(Ap2Error::MalformedBundle("bundle must be an object".to_owned()));
        };
        if let Some(unknown) = object
            .keys()
            .find(|key| !matches!(key.as_str(), "intent" | "cart" | "payment"))
        {
            return Err(Ap2Error::MalformedBundle(format!(
                "bundle has unknown field `{unknown}`"
            )));
        }
        let mut take = |slot: &str| {
            object
                .remove(slot)
                .ok_or_else(|| Ap2Error::MalformedBundle(format!("bundle is missing `{slot}`")))
        };
        let intent = take("intent")?;
        let cart = take("cart")?;
        let payment = take("payment")?;
        Ok(Self {
            intent: IntentMandate::from_value(intent)?,
            cart: CartMandate::from_value(cart)?,
            payment: PaymentMandate::from_value(payment)?,
        })
    }
}
