//! Verification layer configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [replay]
//! max_entries = 250000
//!
//! [consumed]
//! default_ttl_secs = ${CONSUMED_TTL_SECS}
//! ```
//!
//! # Environment Variables
//!
//! - `VOUCH_CONFIG`: path to the configuration file (default: `vouch.toml`)
//!
//! Protocol adapters define their own sections (`Ap2Config`, `TapConfig`,
//! `X402Config`) which callers embed in their own configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::identity::Environment;
use crate::replay::{ConsumedCacheConfig, ReplayConfig};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration for the core stores and identity policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VouchConfig {
    /// Deployment environment (default: `production`).
    pub environment: Environment,
    /// Mandate-id and nonce replay store.
    pub replay: ReplayConfig,
    /// Consumed-mandate cache.
    pub consumed: ConsumedCacheConfig,
}

impl VouchConfig {
    /// Loads configuration from the path given by the `VOUCH_CONFIG`
    /// environment variable, falling back to `vouch.toml` in the current
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("VOUCH_CONFIG").unwrap_or_else(|_| "vouch.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text after expanding environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid for this schema.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }
}

/// Expands `$VAR` and `${VAR}` patterns from the process environment.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        let value = if var_name.is_empty() {
            None
        } else {
            std::env::var(&var_name).ok()
        };
        match value {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced && !var_name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        let config = VouchConfig::from_toml("").unwrap();
        assert_eq!(config, VouchConfig::default());
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.replay.max_entries, crate::replay::DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_sections() {
        let config = VouchConfig::from_toml(
            r#"
            environment = "development"

            [replay]
            max_entries = 10

            [consumed]
            default_ttl_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.replay.max_entries, 10);
        assert_eq!(config.consumed.default_ttl_secs, 30);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = VouchConfig::load_from("/nonexistent/vouch.toml").unwrap();
        assert_eq!(config, VouchConfig::default());
    }

    #[test]
    fn test_unknown_environment_rejected() {
        assert!(matches!(
            VouchConfig::from_toml(r#"environment = "staging""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        // PATH is set in any test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("a=$PATH;"), format!("a={path};"));
        assert_eq!(expand_env_vars("a=${PATH}"), format!("a={path}"));
        assert_eq!(
            expand_env_vars("x=$VOUCH_SURELY_UNSET_VAR y=${VOUCH_SURELY_UNSET_VAR}"),
            "x=$VOUCH_SURELY_UNSET_VAR y=${VOUCH_SURELY_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("cost: $ 5"), "cost: $ 5");
    }
}
