//! Signature base reconstruction.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::TapError;
use crate::signature_input::SignatureInput;

/// Component values of an inbound request, keyed by component name.
///
/// Derived components keep their `@` prefix (`@method`, `@authority`,
/// `@path`, `@target-uri`); header names are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestComponents {
    values: HashMap<String, String>,
}

impl RequestComponents {
    /// Creates an empty component map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `@method`, upper-cased.
    #[must_use]
    pub fn method(self, method: &str) -> Self {
        self.with("@method", method.to_ascii_uppercase())
    }

    /// Sets `@authority`, lower-cased.
    #[must_use]
    pub fn authority(self, authority: &str) -> Self {
        self.with("@authority", authority.to_ascii_lowercase())
    }

    /// Sets `@path`.
    #[must_use]
    pub fn path(self, path: impl Into<String>) -> Self {
        self.with("@path", path)
    }

    /// Sets `@target-uri`.
    #[must_use]
    pub fn target_uri(self, uri: impl Into<String>) -> Self {
        self.with("@target-uri", uri)
    }

    /// Sets a header value. The name is lower-cased and the value trimmed.
    #[must_use]
    pub fn header(self, name: &str, value: &str) -> Self {
        self.with(name.to_ascii_lowercase(), value.trim())
    }

    /// Sets an arbitrary component.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Looks up a component. Header names match case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .or_else(|| self.values.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }
}

/// Builds the signature base for `input` over `request`.
///
/// One `"<name>": <value>` line per covered component in the signer's
/// order, then `"@signature-params": <label>=(...)`. Lines are joined with
/// `\n` and there is no trailing newline.
///
/// # Errors
///
/// Returns [`TapError::ComponentMissing`] for the first covered component the
/// request does not carry.
pub fn signature_base(input: &SignatureInput, request: &RequestComponents) -> Result<String, TapError> {
    let mut base = String::new();
    for name in &input.components {
        let value = request
            .get(name)
            .ok_or_else(|| TapError::ComponentMissing(name.clone()))?;
        let _ = writeln!(base, "\"{name}\": {value}");
    }
    let _ = write!(base, "\"@signature-params\": {}", input.to_header());
    Ok(base)
}
