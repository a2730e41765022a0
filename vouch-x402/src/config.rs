//! x402 validator configuration.

use serde::{Deserialize, Serialize};

/// Default challenge lifetime, in seconds.
pub const DEFAULT_CHALLENGE_TTL_SECS: u64 = 300;

/// Configuration for challenge issuance and version checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct X402Config {
    /// Challenge lifetime when the caller gives none.
    pub challenge_ttl_secs: u64,
    /// Accepted `x402Version` values. An empty version is always accepted.
    pub supported_versions: Vec<String>,
}

impl Default for X402Config {
    fn default() -> Self {
        Self {
            challenge_ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
            supported_versions: vec!["1".to_owned(), "2".to_owned()],
        }
    }
}
