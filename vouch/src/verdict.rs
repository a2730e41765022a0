//! Accept/reject results returned by every public verification entry point.
//!
//! Internal checks return `Result<T, E>` with a module-local error enum. At the
//! public boundary those errors are folded into a [`Verdict`], which carries a
//! stable machine-readable reason string that is safe to log and to assert on.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Maps an error to the stable reason string reported in a [`Rejection`].
pub trait Reason {
    /// Returns the `snake_case` reason code for this error.
    fn reason(&self) -> Cow<'static, str>;
}

/// A rejected verification, with its machine-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    reason: Cow<'static, str>,
    message: Option<String>,
}

impl Rejection {
    /// Creates a rejection with the given reason code.
    #[must_use]
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
            message: None,
        }
    }

    /// Sets the human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the machine-readable reason code.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the human-readable message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Builds a rejection from any error implementing [`Reason`].
    pub fn from_error<E: Reason + fmt::Display>(err: &E) -> Self {
        Self::new(err.reason()).with_message(err.to_string())
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.reason, msg),
            None => f.write_str(&self.reason),
        }
    }
}

/// The outcome of a verification.
///
/// `Accepted` carries whatever the caller needs to proceed: a validated
/// chain, a reconstructed signature base, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Verdict<T = ()> {
    /// Every check passed.
    Accepted(T),
    /// A check failed; nothing was committed to any replay store.
    Rejected(Rejection),
}

impl<T> Verdict<T> {
    /// Constructs a rejection with the given reason code.
    pub fn reject(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Rejected(Rejection::new(reason))
    }

    /// Returns `true` if the verification succeeded.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Returns the rejection reason, or `None` when accepted.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection.reason()),
        }
    }

    /// Returns the accepted value, discarding any rejection.
    #[must_use]
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the verdict is a rejection.
    pub fn into_result(self) -> Result<T, Rejection> {
        match self {
            Self::Accepted(value) => Ok(value),
            Self::Rejected(rejection) => Err(rejection),
        }
    }

    /// Maps the accepted value, leaving a rejection untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Verdict<U> {
        match self {
            Self::Accepted(value) => Verdict::Accepted(f(value)),
            Self::Rejected(rejection) => Verdict::Rejected(rejection),
        }
    }
}

impl<T, E> From<Result<T, E>> for Verdict<T>
where
    E: Reason + fmt::Display,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Accepted(value),
            Err(err) => Self::Rejected(Rejection::from_error(&err)),
        }
    }
}

#[derive(Serialize)]
struct VerdictWire<'a> {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Serializes as `{"accepted": bool, "reason"?: str, "message"?: str}`.
///
/// The accepted payload is not part of the wire form; callers serialize it
/// separately when they need to.
impl<T> Serialize for Verdict<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Accepted(_) => VerdictWire {
                accepted: true,
                reason: None,
                message: None,
            },
            Self::Rejected(rejection) => VerdictWire {
                accepted: false,
                reason: Some(rejection.reason()),
                message: rejection.message(),
            },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("the thing was stale")]
    struct Stale;

    impl Reason for Stale {
        fn reason(&self) -> Cow<'static, str> {
            Cow::Borrowed("stale_thing")
        }
    }

    #[test]
    fn test_from_result_maps_reason() {
        let verdict: Verdict<()> = Err::<(), _>(Stale).into();
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.reason(), Some("stale_thing"));
    }

    #[test]
    fn test_wire_format() {
        let ok: Verdict<u8> = Verdict::Accepted(7);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"accepted":true}"#);

        let rejected: Verdict = Verdict::reject("nonce_mismatch");
        assert_eq!(
            serde_json::to_string(&rejected).unwrap(),
            r#"{"accepted":false,"reason":"nonce_mismatch"}"#
        );
    }

    #[test]
    fn test_display_includes_message() {
        let rejection = Rejection::new("amount_mismatch").with_message("expected 10, got 9");
        assert_eq!(rejection.to_string(), "amount_mismatch: expected 10, got 9");
    }
}
