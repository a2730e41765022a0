#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core verification primitives for agent-initiated payments.
//!
//! This crate holds the protocol-agnostic pieces every adapter relies on
//! before a payment request is allowed to move funds. Protocol adapters
//! (`vouch-ap2`, `vouch-tap`, `vouch-x402`) build on top of it.
//!
//! # Overview
//!
//! An inbound request is routed to its protocol adapter. The adapter
//! canonicalizes the signed bytes, resolves the claimed signer's public key,
//! runs a [`crypto::SignatureVerifier`], checks freshness against an injected
//! clock and consults a [`replay::ReplayStore`]. The result is always a
//! [`Verdict`] carrying a stable machine-readable reason on rejection.
//!
//! # Modules
//!
//! - [`canonical`] - Deterministic byte serialization and domain separation
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`crypto`] - Algorithm-polymorphic signature verification and JWK keys
//! - [`encoding`] - Base64 wrapper type
//! - [`identity`] - Signer resolution against an external identity registry
//! - [`replay`] - Replay cache and consumed-mandate cache
//! - [`timestamp`] - Unix timestamps used for every freshness check
//! - [`verdict`] - Accept/reject results and the [`Reason`] trait
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod canonical;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod identity;
pub mod replay;
pub mod timestamp;
pub mod verdict;

pub use timestamp::UnixTimestamp;
pub use verdict::{Reason, Rejection, Verdict};
