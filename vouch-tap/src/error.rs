//! TAP rejection reasons.

use std::borrow::Cow;

use vouch::Reason;
use vouch::replay::ReplayStoreError;

use crate::linked::LinkedObjectKind;

/// Reasons a TAP message signature is rejected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TapError {
    /// `Signature-Input` is not `label=("c1" ...);param=value;...`.
    #[error("malformed Signature-Input: {0}")]
    SignatureInputMalformed(String),
    /// `Signature` is not `label=:base64:`.
    #[error("malformed Signature: {0}")]
    SignatureMalformed(String),
    /// The two headers carry different labels.
    #[error("Signature label `{signature}` does not match Signature-Input label `{input}`")]
    LabelMismatch {
        /// Label in `Signature-Input`.
        input: String,
        /// Label in `Signature`.
        signature: String,
    },
    /// `tag` is not a registered authorization context.
    #[error("tag `{0}` is not allowed")]
    TagInvalid(String),
    /// `alg` is not the configured algorithm.
    #[error("alg `{0}` is not allowed")]
    AlgInvalid(String),
    /// `now < created`.
    #[error("signature is not valid until {created}")]
    NotYetValid {
        /// Declared creation time.
        created: u64,
    },
    /// `now >= expires`.
    #[error("signature expired at {expires}")]
    Expired {
        /// Declared expiry.
        expires: u64,
    },
    /// `expires - created` exceeds the configured maximum.
    #[error("signature window of {window}s exceeds the {max}s maximum")]
    WindowTooLarge {
        /// Declared window.
        window: u64,
        /// Configured maximum.
        max: u64,
    },
    /// The nonce was already seen while its record is live.
    #[error("nonce `{0}` has already been used")]
    NonceReplayed(String),
    /// A covered component is absent from the request.
    #[error("covered component `{0}` is missing from the request")]
    ComponentMissing(String),
    /// The detached signature does not verify.
    #[error("message signature is invalid")]
    SignatureInvalid,
    /// The nonce store could not record the nonce.
    #[error(transparent)]
    ReplayStore(#[from] ReplayStoreError),
}

impl Reason for TapError {
    fn reason(&self) -> Cow<'static, str> {
        let reason = match self {
            Self::ReplayStore(inner) => return inner.reason(),
            Self::SignatureInputMalformed(_) => "tap_signature_input_malformed",
            Self::SignatureMalformed(_) => "tap_signature_malformed",
            Self::LabelMismatch { .. } => "tap_signature_label_mismatch",
            Self::TagInvalid(_) => "tap_tag_invalid",
            Self::AlgInvalid(_) => "tap_alg_invalid",
            Self::NotYetValid { .. } => "tap_signature_not_yet_valid",
            Self::Expired { .. } => "tap_signature_expired",
            Self::WindowTooLarge { .. } => "tap_window_too_large",
            Self::NonceReplayed(_) => "tap_nonce_replayed",
            Self::ComponentMissing(_) => "tap_component_missing",
            Self::SignatureInvalid => "tap_signature_invalid",
        };
        Cow::Borrowed(reason)
    }
}

/// Reasons a linked object (consumer attestation or payment container) is
/// rejected.
///
/// Reason strings are prefixed with the object kind, e.g.
/// `agentic_consumer_missing_idToken` or
/// `agentic_payment_container_nonce_mismatch`.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkedObjectError {
    /// The object is not a JSON object.
    #[error("{kind} must be a JSON object")]
    Malformed {
        /// Object kind.
        kind: LinkedObjectKind,
    },
    /// A required field is absent, null or empty.
    #[error("{kind} is missing `{field}`")]
    MissingField {
        /// Object kind.
        kind: LinkedObjectKind,
        /// Field name.
        field: &'static str,
    },
    /// The object's nonce differs from the message signature nonce.
    #[error("{kind} nonce does not match the message signature nonce")]
    NonceMismatch {
        /// Object kind.
        kind: LinkedObjectKind,
    },
    /// The object names the null algorithm.
    #[error("{kind} alg `{alg}` is not allowed")]
    AlgInvalid {
        /// Object kind.
        kind: LinkedObjectKind,
        /// Declared algorithm.
        alg: String,
    },
    /// The object's signature did not verify, or the verifier failed.
    #[error("{kind} signature is invalid")]
    SignatureInvalid {
        /// Object kind.
        kind: LinkedObjectKind,
    },
}

impl Reason for LinkedObjectError {
    fn reason(&self) -> Cow<'static, str> {
        let (kind, suffix) = match self {
            Self::Malformed { kind } => (kind, Cow::Borrowed("malformed")),
            Self::MissingField { kind, field } => (kind, Cow::Owned(format!("missing_{field}"))),
            Self::NonceMismatch { kind } => (kind, Cow::Borrowed("nonce_mismatch")),
            Self::AlgInvalid { kind, .. } => (kind, Cow::Borrowed("alg_invalid")),
            Self::SignatureInvalid { kind } => (kind, Cow::Borrowed("signature_invalid")),
        };
        Cow::Owned(format!("{}_{suffix}", kind.prefix()))
    }
}
