//! TAP validator configuration.

use serde::{Deserialize, Serialize};
use vouch::crypto::Algorithm;

/// Default maximum `expires - created`, in seconds.
pub const DEFAULT_MAX_WINDOW_SECS: u64 = 480;

/// Authorization-context tags accepted by default.
pub const DEFAULT_TAGS: [&str; 2] = ["agent-browser-auth", "agent-payer-auth"];

/// Configuration for [`TapValidator`](crate::TapValidator).
///
/// ```toml
/// allowed_tags = ["agent-browser-auth", "agent-payer-auth"]
/// algorithm = "ed25519"
/// max_window_secs = 480
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Registered authorization-context tags.
    pub allowed_tags: Vec<String>,
    /// The single algorithm accepted for the message signature.
    pub algorithm: Algorithm,
    /// Maximum signature window, in seconds.
    pub max_window_secs: u64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_TAGS.iter().map(|t| (*t).to_owned()).collect(),
            algorithm: Algorithm::Ed25519,
            max_window_secs: DEFAULT_MAX_WINDOW_SECS,
        }
    }
}

impl TapConfig {
    pub(crate) fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.iter().any(|allowed| allowed == tag)
    }

    /// `alg` must name the configured algorithm, by canonical name or alias.
    pub(crate) fn allows_alg(&self, alg: &str) -> bool {
        Algorithm::from_name(alg) == Some(self.algorithm)
    }
}
