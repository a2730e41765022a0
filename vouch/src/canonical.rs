//! Deterministic byte serialization of signed protocol messages.
//!
//! Field order and separators are part of the wire contract: a signer and a
//! verifier that disagree on a single byte will disagree on every signature.
//! Protocol-specific layouts (AP2 mandate payloads, the TAP signature base)
//! live in their adapter crates and are built from the primitives here.

use std::fmt::Write as _;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Separator between canonical payload fields.
pub const FIELD_SEPARATOR: char = '|';

/// A message with a single canonical signing payload.
pub trait Canonicalize {
    /// Returns the canonical payload, before domain separation.
    fn canonical_payload(&self) -> String;
}

/// Joins canonical fields with [`FIELD_SEPARATOR`].
pub fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Prefixes a canonical payload with its signing context.
///
/// The result is `domain|nonce|purpose|payload`. A signature produced for one
/// domain or purpose therefore never verifies in another.
#[must_use]
pub fn domain_separated(domain: &str, nonce: &str, purpose: &str, payload: &str) -> String {
    join_fields([domain, nonce, purpose, payload])
}

/// Serializes a JSON value with sorted keys and compact separators.
///
/// Non-ASCII characters are emitted as `\uXXXX` escapes so the output is
/// byte-identical to `json.dumps(value, sort_keys=True, separators=(",", ":"))`.
///
/// # Errors
///
/// Returns an error if a string or number fails to serialize.
pub fn canonical_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

/// Like [`canonical_json`] but drops one top-level key first.
///
/// Used to compute the signature base of a linked object whose signature is
/// carried inside the object itself.
///
/// # Errors
///
/// Returns an error if a string or number fails to serialize.
pub fn canonical_json_without(value: &Value, excluded: &str) -> Result<String, serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut stripped = map.clone();
            stripped.remove(excluded);
            canonical_json(&Value::Object(stripped))
        }
        other => canonical_json(other),
    }
}

/// Lowercase hex SHA-256 of the canonical JSON form of `value`.
///
/// Two payloads that differ only in key order or whitespace share a fingerprint.
///
/// # Errors
///
/// Returns an error if the value fails to serialize.
pub fn fingerprint(value: &Value) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(value)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(alloy_primitives::hex::encode(digest))
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_ascii(&serde_json::to_string(key)?, out);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => push_ascii(&serde_json::to_string(scalar)?, out),
    }
    Ok(())
}

fn push_ascii(json: &str, out: &mut String) {
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                // Writing to a String cannot fail.
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_fields() {
        assert_eq!(join_fields(["a", "", "c"]), "a||c");
        assert_eq!(join_fields(Vec::<String>::new()), "");
    }

    #[test]
    fn test_domain_separation_prefix() {
        let separated = domain_separated("shop.example", "n-1", "payment", "m|s|1");
        assert_eq!(separated, "shop.example|n-1|payment|m|s|1");
    }

    #[test]
    fn test_canonical_json_sorts_keys_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "y": [3, {"d": null, "c": "x"}]}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":{"y":[3,{"c":"x","d":null}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn test_canonical_json_escapes_non_ascii() {
        let value = json!({"name": "caf\u{e9} \u{1F600}"});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"name":"caf\u00e9 \ud83d\ude00"}"#
        );
    }

    #[test]
    fn test_canonical_json_without_signature() {
        let value = json!({"signature": "abc", "nonce": "n", "alg": "ed25519"});
        assert_eq!(
            canonical_json_without(&value, "signature").unwrap(),
            r#"{"alg":"ed25519","nonce":"n"}"#
        );
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        let fa = fingerprint(&a).unwrap();
        assert_eq!(fa, fingerprint(&b).unwrap());
        assert_eq!(fa.len(), 64);
        assert_ne!(fa, fingerprint(&json!({"x": 1, "y": 3})).unwrap());
    }
}
