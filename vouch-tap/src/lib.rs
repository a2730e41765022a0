#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! TAP message-signature validation.
//!
//! An agent signs selected components of its HTTP request and sends the
//! result in `Signature-Input` / `Signature` headers. Linked JSON objects
//! (a consumer attestation and a payment container) travel with the request
//! and are bound to it through the header nonce.
//!
//! # Modules
//!
//! - [`signature_input`] - Header parsing and rendering
//! - [`base`] - Request components and signature base reconstruction
//! - [`config`] - Tag allowlist, algorithm and window limits
//! - [`validator`] - [`TapValidator`]
//! - [`linked`] - Linked-object validators and [`JwksVerifier`]
//! - [`error`] - Rejection reasons
//!
//! # Example
//!
//! ```
//! use vouch::UnixTimestamp;
//! use vouch_tap::{RequestComponents, TapConfig, TapValidator};
//!
//! let validator = TapValidator::new(TapConfig::default());
//! let request = RequestComponents::new()
//!     .authority("merchant.example")
//!     .path("/checkout");
//! let verdict = validator.validate(
//!     r#"sig2=("@authority" "@path");created=1000;keyid="k";alg="ed25519";expires=1240;nonce="n";tag="agent-browser-auth""#,
//!     "sig2=:AQID:",
//!     &request,
//!     UnixTimestamp::from_secs(1100),
//! );
//! assert!(verdict.is_accepted());
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod base;
pub mod config;
pub mod error;
pub mod linked;
pub mod signature_input;
pub mod validator;

pub use base::{RequestComponents, signature_base};
pub use config::TapConfig;
pub use error::{LinkedObjectError, TapError};
pub use linked::{
    JwksVerifier, LinkedObjectKind, LinkedObjectVerifier, LinkedSignature,
    validate_agentic_consumer_object, validate_agentic_payment_container,
};
pub use signature_input::{SignatureHeader, SignatureInput};
pub use validator::{TapValidator, ValidatedSignature};
