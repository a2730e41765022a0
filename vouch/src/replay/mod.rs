//! Replay and nonce de-duplication stores.
//!
//! Two abstractions with different keys and guarantees:
//!
//! - [`ReplayStore`] is keyed by an identifier (a mandate id or a TAP nonce)
//!   and remembers it until the expiry supplied by the caller. After that
//!   the identifier is reusable.
//! - [`ConsumedMandateCache`] is keyed by a content fingerprint, carries a
//!   payload, and exposes revoke and hit/miss counters for auditing.
//!
//! Both guarantee that exactly one concurrent caller wins the first
//! acceptance of a key. Verifiers hold the store behind `Arc<dyn ReplayStore>`
//! so a shared external backend can replace the in-memory one.

mod consumed;
mod memory;

pub use consumed::{CacheStats, ConsumedCacheConfig, ConsumedMandateCache};
pub use memory::InMemoryReplayStore;

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;
use crate::verdict::Reason;

/// Default bound on live records held by [`InMemoryReplayStore`].
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Errors raised by a replay store backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReplayStoreError {
    /// An external backend failed.
    #[error("replay store backend error: {0}")]
    Backend(String),
}

impl Reason for ReplayStoreError {
    fn reason(&self) -> Cow<'static, str> {
        Cow::Borrowed("replay_store_unavailable")
    }
}

/// Counts reported by [`ReplayStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// All records currently held.
    pub total: usize,
    /// Records whose expiry has not passed.
    pub active: usize,
    /// Records awaiting cleanup.
    pub expired: usize,
}

/// An expiry-keyed replay cache.
///
/// A record is live while `now < expires_at`. Implementations must make
/// [`check_and_store`](Self::check_and_store) atomic per key and must never
/// drop a live record during cleanup.
pub trait ReplayStore: Send + Sync + fmt::Debug {
    /// Records `key` until `expires_at` if no live record exists.
    ///
    /// Returns `Ok(true)` for the first sighting and `Ok(false)` for a
    /// replay.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayStoreError`] when the key cannot be recorded. Callers
    /// must treat this as a rejection.
    fn check_and_store(
        &self,
        key: &str,
        expires_at: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<bool, ReplayStoreError>;

    /// Returns whether a live record exists for `key`, without recording it.
    fn contains(&self, key: &str, now: UnixTimestamp) -> bool;

    /// Removes expired records and returns how many were removed.
    fn cleanup(&self, now: UnixTimestamp) -> usize;

    /// Reports record counts as of `now`.
    fn stats(&self, now: UnixTimestamp) -> ReplayStats;
}

/// Settings for [`InMemoryReplayStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Number of records above which an insert first triggers cleanup.
    pub max_entries: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
