#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! x402 challenge/response validation.
//!
//! A resource server answers an unpaid request with HTTP 402 and a
//! challenge. The client retries with a payment payload that must echo the
//! challenge's payment id, nonce and amount before it expires. Token
//! payments are usually ERC-3009 authorizations, checked by [`erc3009`].
//!
//! # Modules
//!
//! - [`types`] - Challenge, payload and receipt wire types
//! - [`challenge`] - Challenge issuance, payload verification, version check
//! - [`headers`] - Base64 JSON header codec
//! - [`erc3009`] - Authorization timing, ABI encoding and signer recovery
//! - [`config`] - Challenge lifetime and supported versions
//! - [`error`] - Rejection reasons
//!
//! # Example
//!
//! ```
//! use vouch::UnixTimestamp;
//! use vouch_x402::{ChallengeTerms, X402Config, X402PaymentPayload, generate_challenge, verify_payment_payload};
//!
//! let now = UnixTimestamp::from_secs(1_800_000_000);
//! let issued = generate_challenge(
//!     &X402Config::default(),
//!     ChallengeTerms {
//!         resource_uri: "/report".into(),
//!         amount: "10000".into(),
//!         currency: "USDC".into(),
//!         payee_address: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".into(),
//!         network: "base".into(),
//!         token_address: None,
//!     },
//!     None,
//!     now,
//! )
//! .unwrap();
//! assert_eq!(issued.http_status, 402);
//!
//! let payload = X402PaymentPayload {
//!     payment_id: issued.challenge.payment_id.clone(),
//!     payer_address: "0x857b06519E91e3A54538791bDbb0E22373e36b66".into(),
//!     amount: "10000".into(),
//!     nonce: issued.challenge.nonce.clone(),
//!     signature: String::new(),
//! };
//! assert!(verify_payment_payload(&payload, &issued.challenge, None, now).is_accepted());
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod challenge;
pub mod config;
pub mod erc3009;
pub mod error;
pub mod headers;
pub mod types;

pub use challenge::{
    PaymentSignatureVerifier, generate_challenge, validate_x402_version, verify_payment_payload,
};
pub use config::X402Config;
pub use erc3009::{
    Erc3009Authorization, TokenDomain, encode_authorization_params,
    transfer_with_authorization_calldata, validate_authorization_timing, verify_authorization,
    verify_authorization_signature,
};
pub use error::{Erc3009Error, HeaderError, X402Error};
pub use types::{ChallengeTerms, IssuedChallenge, PaymentReceipt, X402Challenge, X402PaymentPayload};
