//! Signer resolution for `verification_method` references.
//!
//! A proof names its signer as `<controller>#<scheme>:<hex-public-key>`. In
//! production the key must come from an external identity registry; the key
//! embedded in the reference is only trusted in non-production environments,
//! and using it logs a warning.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::hex;
use serde::{Deserialize, Serialize};

use crate::crypto::{Algorithm, PublicKey};
use crate::verdict::Reason;

/// Deployment environment, which decides whether a registry is mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// An identity registry is required; missing one rejects every request.
    #[default]
    Production,
    /// Keys embedded in `verification_method` are accepted without a registry.
    Development,
}

/// Errors raised while resolving a signer.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    /// Production deployment without an identity registry.
    #[error("an identity registry is required in production")]
    RegistryRequired,
    /// The reference is not of the form `<controller>#<scheme>:<hex>`.
    #[error("malformed verification method: {0}")]
    Malformed(String),
    /// The key scheme is not one this deployment verifies.
    #[error("unsupported verification method scheme `{0}`")]
    UnsupportedScheme(String),
    /// The registry does not know this signer.
    #[error("signer `{0}` is not known to the identity registry")]
    Unresolved(String),
}

impl Reason for IdentityError {
    fn reason(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::RegistryRequired => "identity_registry_required",
            Self::Malformed(_) => "malformed_verification_method",
            Self::UnsupportedScheme(_) => "unsupported_verification_method",
            Self::Unresolved(_) => "signer_unresolved",
        })
    }
}

/// A parsed `verification_method` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationMethod {
    /// The identity that controls the key (the part before `#`).
    pub controller: String,
    /// The claimed key, decoded from the fragment.
    pub claimed_key: PublicKey,
}

impl VerificationMethod {
    /// Parses `<controller>#<scheme>:<hex-public-key>`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Malformed`] for structural problems and
    /// [`IdentityError::UnsupportedScheme`] for unknown schemes.
    pub fn parse(reference: &str) -> Result<Self, IdentityError> {
        let (controller, fragment) = reference
            .split_once('#')
            .ok_or_else(|| IdentityError::Malformed("missing `#` fragment".to_owned()))?;
        let (scheme, key_hex) = fragment
            .split_once(':')
            .ok_or_else(|| IdentityError::Malformed("fragment must be `<scheme>:<hex>`".to_owned()))?;
        let algorithm = Algorithm::from_name(scheme)
            .ok_or_else(|| IdentityError::UnsupportedScheme(scheme.to_owned()))?;
        let bytes = hex::decode(key_hex)
            .map_err(|e| IdentityError::Malformed(format!("public key is not hex: {e}")))?;
        if bytes.is_empty() {
            return Err(IdentityError::Malformed("public key is empty".to_owned()));
        }
        Ok(Self {
            controller: controller.to_owned(),
            claimed_key: PublicKey::new(algorithm, bytes),
        })
    }
}

/// An external identity or agent registry.
///
/// Implementations may be backed by a DID resolver, a JWKS endpoint cache or
/// a database. Lookups must be bounded in time; this crate never awaits.
pub trait IdentityRegistry: Send + Sync + fmt::Debug {
    /// Returns the key the registry trusts for this reference, if any.
    fn resolve(&self, method: &VerificationMethod) -> Option<PublicKey>;
}

/// An in-memory registry keyed by controller.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    keys: HashMap<String, Vec<PublicKey>>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trusts `key` for `controller`.
    pub fn insert(&mut self, controller: impl Into<String>, key: PublicKey) -> &mut Self {
        self.keys.entry(controller.into()).or_default().push(key);
        self
    }
}

impl IdentityRegistry for StaticRegistry {
    /// Resolves only when the claimed key is one of the controller's trusted keys.
    fn resolve(&self, method: &VerificationMethod) -> Option<PublicKey> {
        self.keys
            .get(&method.controller)?
            .iter()
            .find(|key| **key == method.claimed_key)
            .cloned()
    }
}

/// Resolves signers, enforcing the production registry requirement.
#[derive(Debug, Clone, Default)]
pub struct SignerResolver {
    environment: Environment,
    registry: Option<Arc<dyn IdentityRegistry>>,
}

impl SignerResolver {
    /// Creates a resolver backed by a registry.
    #[must_use]
    pub fn new(environment: Environment, registry: Arc<dyn IdentityRegistry>) -> Self {
        Self {
            environment,
            registry: Some(registry),
        }
    }

    /// Creates a resolver with no registry.
    ///
    /// In [`Environment::Production`] every resolution fails with
    /// [`IdentityError::RegistryRequired`].
    #[must_use]
    pub const fn without_registry(environment: Environment) -> Self {
        Self {
            environment,
            registry: None,
        }
    }

    /// Returns the configured environment.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Resolves the public key for a `verification_method` reference.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if no registry is configured in production,
    /// the reference is malformed, or the registry does not know the signer.
    pub fn resolve(&self, reference: &str) -> Result<PublicKey, IdentityError> {
        if self.registry.is_none() && self.environment == Environment::Production {
            return Err(IdentityError::RegistryRequired);
        }
        let method = VerificationMethod::parse(reference)?;
        match &self.registry {
            Some(registry) => registry
                .resolve(&method)
                .ok_or(IdentityError::Unresolved(method.controller)),
            None => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    controller = %method.controller,
                    "no identity registry configured; trusting embedded verification key"
                );
                Ok(method.claimed_key)
            }
        }
    }
}
