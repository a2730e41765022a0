//! `Signature-Input` and `Signature` header parsing.
//!
//! ```text
//! Signature-Input: sig2=("@authority" "@path");created=1735689600;keyid="poqk";alg="ed25519";expires=1735690080;nonce="e8N7";tag="agent-browser-auth"
//! Signature: sig2=:jdq0SqOwHdyHr9+r5jw3iYZH6aNGKijYp/EstF4RQTQdi5N5YYKrD+mCT1HA1nZDsi6nJKuHxUi/5Syp3rLWBA==:
//! ```
//!
//! Only one signature per header is accepted. Every parameter is required;
//! unknown or repeated parameters are rejected.

use std::fmt::Write as _;

use vouch::encoding::Base64Bytes;

use crate::error::TapError;

/// Parsed `Signature-Input` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInput {
    /// Signature label, e.g. `sig2`.
    pub label: String,
    /// Covered components, in the order the signer listed them.
    pub components: Vec<String>,
    /// Creation time, Unix seconds.
    pub created: u64,
    /// Expiry, Unix seconds.
    pub expires: u64,
    /// Key identifier.
    pub keyid: String,
    /// Signature algorithm.
    pub alg: String,
    /// Replay nonce.
    pub nonce: String,
    /// Authorization context tag.
    pub tag: String,
}

fn malformed(detail: impl Into<String>) -> TapError {
    TapError::SignatureInputMalformed(detail.into())
}

fn is_label(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'*'))
}

fn quoted(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    (!inner.contains(['"', '\\'])).then_some(inner)
}

fn parse_components(list: &str) -> Result<Vec<String>, TapError> {
    list.split_ascii_whitespace()
        .map(|item| {
            quoted(item)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| malformed(format!("component `{item}` is not a quoted string")))
        })
        .collect()
}

#[derive(Default)]
struct Params<'a> {
    created: Option<u64>,
    expires: Option<u64>,
    keyid: Option<&'a str>,
    alg: Option<&'a str>,
    nonce: Option<&'a str>,
    tag: Option<&'a str>,
}

fn set<T>(slot: &mut Option<T>, name: &str, value: T) -> Result<(), TapError> {
    if slot.replace(value).is_some() {
        return Err(malformed(format!("parameter `{name}` is repeated")));
    }
    Ok(())
}

fn parse_params(params: &str) -> Result<Params<'_>, TapError> {
    let mut out = Params::default();
    // Skips the empty segment before the leading `;`.
    for param in params.split(';').skip(1) {
        let (name, value) = param
            .split_once('=')
            .ok_or_else(|| malformed(format!("parameter `{param}` has no value")))?;
        let integer = || {
            value
                .parse::<u64>()
                .map_err(|_| malformed(format!("`{name}` must be an integer")))
        };
        let string = || {
            quoted(value).ok_or_else(|| malformed(format!("`{name}` must be a quoted string")))
        };
        match name {
            "created" => set(&mut out.created, name, integer()?)?,
            "expires" => set(&mut out.expires, name, integer()?)?,
            "keyid" => set(&mut out.keyid, name, string()?)?,
            "alg" => set(&mut out.alg, name, string()?)?,
            "nonce" => set(&mut out.nonce, name, string()?)?,
            "tag" => set(&mut out.tag, name, string()?)?,
            other => return Err(malformed(format!("unknown parameter `{other}`"))),
        }
    }
    Ok(out)
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, TapError> {
    value.ok_or_else(|| malformed(format!("missing `{name}` parameter")))
}

impl SignatureInput {
    /// Parses a `Signature-Input` header value.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::SignatureInputMalformed`] on any structural problem.
    pub fn parse(header: &str) -> Result<Self, TapError> {
        let header = header.trim();
        let (label, rest) = header
            .split_once('=')
            .ok_or_else(|| malformed("missing `label=`"))?;
        if !is_label(label) {
            return Err(malformed(format!("invalid label `{label}`")));
        }
        let rest = rest
            .strip_prefix('(')
            .ok_or_else(|| malformed("component list must start with `(`"))?;
        let (list, params) = rest
            .split_once(')')
            .ok_or_else(|| malformed("component list is not closed"))?;
        if !params.is_empty() && !params.starts_with(';') {
            return Err(malformed("parameters must follow the component list"));
        }
        let params = parse_params(params)?;
        Ok(Self {
            label: label.to_owned(),
            components: parse_components(list)?,
            created: required(params.created, "created")?,
            expires: required(params.expires, "expires")?,
            keyid: required(params.keyid, "keyid")?.to_owned(),
            alg: required(params.alg, "alg")?.to_owned(),
            nonce: required(params.nonce, "nonce")?.to_owned(),
            tag: required(params.tag, "tag")?.to_owned(),
        })
    }

    /// Renders `("c1" "c2");created=..;keyid="..";alg="..";expires=..;nonce="..";tag=".."`.
    #[must_use]
    pub fn params_value(&self) -> String {
        let mut out = String::from("(");
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "\"{component}\"");
        }
        let _ = write!(
            out,
            ");created={};keyid=\"{}\";alg=\"{}\";expires={};nonce=\"{}\";tag=\"{}\"",
            self.created, self.keyid, self.alg, self.expires, self.nonce, self.tag
        );
        out
    }

    /// Renders the header value, `label=` followed by [`params_value`](Self::params_value).
    #[must_use]
    pub fn to_header(&self) -> String {
        format!("{}={}", self.label, self.params_value())
    }

    /// Returns `expires - created`, saturating at zero.
    #[must_use]
    pub const fn window_secs(&self) -> u64 {
        self.expires.saturating_sub(self.created)
    }
}

/// Parsed `Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signature label; must match the `Signature-Input` label.
    pub label: String,
    /// Decoded signature bytes.
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a `Signature` header value.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::SignatureMalformed`] unless the value is
    /// `label=:base64:` with a non-empty, decodable signature.
    pub fn parse(header: &str) -> Result<Self, TapError> {
        let header = header.trim();
        let (label, value) = header
            .split_once('=')
            .ok_or_else(|| TapError::SignatureMalformed("missing `label=`".to_owned()))?;
        if !is_label(label) {
            return Err(TapError::SignatureMalformed(format!("invalid label `{label}`")));
        }
        let encoded = value
            .strip_prefix(':')
            .and_then(|v| v.strip_suffix(':'))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                TapError::SignatureMalformed("value must be a `:base64:` byte sequence".to_owned())
            })?;
        let signature = Base64Bytes::from(encoded)
            .decode()
            .map_err(|e| TapError::SignatureMalformed(e.to_string()))?;
        Ok(Self {
            label: label.to_owned(),
            signature,
        })
    }
}
