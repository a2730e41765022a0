#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! AP2 mandate chain verification.
//!
//! An agent purchase under AP2 is authorized by three signed mandates: the
//! user's intent, the merchant's cart, and the payment. This crate verifies
//! each mandate's proof over its domain-separated canonical payload and binds
//! the three into one chain (same subject, same merchant, consistent amounts).
//!
//! # Modules
//!
//! - [`types`] - Mandate wire types and strict bundle parsing
//! - [`canonical`] - Per-kind canonical signing payloads
//! - [`config`] - Allowed domains, purposes and payment signal value sets
//! - [`error`] - Rejection reasons
//! - [`verifier`] - [`MandateVerifier`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vouch::UnixTimestamp;
//! use vouch::identity::{Environment, SignerResolver, StaticRegistry};
//! use vouch::replay::InMemoryReplayStore;
//! use vouch_ap2::{Ap2Config, MandateVerifier};
//!
//! let verifier = MandateVerifier::new(
//!     Ap2Config::with_domains(["shop.example"]),
//!     SignerResolver::new(Environment::Production, Arc::new(StaticRegistry::new())),
//!     Arc::new(InMemoryReplayStore::default()),
//! );
//! let verdict = verifier.verify_chain_json("{}", UnixTimestamp::now());
//! assert_eq!(verdict.reason(), Some("malformed_bundle"));
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod canonical;
pub mod config;
pub mod error;
pub mod types;
pub mod verifier;

pub use config::{Ap2Config, ExpectedPurposes};
pub use error::Ap2Error;
pub use types::{
    CartMandate, IntentMandate, LineItem, Mandate, MandateBase, MandateBundle, MandateType,
    PaymentMandate, Proof,
};
pub use verifier::{MandateChain, MandateVerifier};
