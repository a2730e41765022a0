//! ERC-3009 `transferWithAuthorization` checks.
//!
//! An authorization lets a relayer move tokens on the payer's behalf inside a
//! `[validAfter, validBefore)` window. This module checks that window, encodes
//! the call parameters and recovers the EIP-712 signer.

use alloy_primitives::{Address, B256, Signature, U256, hex};
use alloy_sol_types::{Eip712Domain, SolCall, SolStruct, SolValue, eip712_domain, sol};
use serde::{Deserialize, Serialize};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use vouch::{UnixTimestamp, Verdict};

use crate::error::Erc3009Error;

sol!(
    /// EIP-712 typed data signed by the payer.
    #[allow(missing_docs)]
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

sol! {
    /// The `(v, r, s)` overload of ERC-3009 `transferWithAuthorization`.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IEIP3009 {
        function transferWithAuthorization(
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}

/// A signed ERC-3009 authorization.
///
/// `nonce`, `r` and `s` are hex strings of at most 32 bytes, with or without
/// a `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc3009Authorization {
    /// Payer.
    pub from_address: Address,
    /// Payee.
    pub to_address: Address,
    /// Amount in the token's smallest unit.
    pub value: U256,
    /// Start of the validity window, inclusive.
    pub valid_after: UnixTimestamp,
    /// End of the validity window, exclusive.
    pub valid_before: UnixTimestamp,
    /// Unique authorization nonce.
    pub nonce: String,
    /// Recovery id, `27`/`28` or `0`/`1`.
    pub v: u8,
    /// Signature `r`.
    pub r: String,
    /// Signature `s`.
    pub s: String,
}

/// The token's EIP-712 domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDomain {
    /// Token `name()`, e.g. `USD Coin`.
    pub name: String,
    /// Token `version()`, e.g. `2`.
    pub version: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Token contract.
    pub verifying_contract: Address,
}

impl TokenDomain {
    fn eip712(&self) -> Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }
}

fn fixed_word(field: &'static str, value: &str) -> Result<B256, Erc3009Error> {
    let digits = value.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    let bytes = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    }
    .map_err(|_| Erc3009Error::InvalidHex { field })?;
    if bytes.len() > 32 {
        return Err(Erc3009Error::HexTooLong {
            field,
            len: bytes.len(),
        });
    }
    let mut word = B256::ZERO;
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

struct Words {
    nonce: B256,
    r: B256,
    s: B256,
}

impl Erc3009Authorization {
    fn words(&self) -> Result<Words, Erc3009Error> {
        Ok(Words {
            nonce: fixed_word("nonce", &self.nonce)?,
            r: fixed_word("r", &self.r)?,
            s: fixed_word("s", &self.s)?,
        })
    }

    /// Checks `valid_after < valid_before` and `valid_after <= now < valid_before`.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn check_timing(&self, now: UnixTimestamp) -> Result<(), Erc3009Error> {
        let (after, before) = (self.valid_after.as_secs(), self.valid_before.as_secs());
        if after >= before {
            return Err(Erc3009Error::InvalidValidityWindow {
                valid_after: after,
                valid_before: before,
            });
        }
        if now.as_secs() < after {
            return Err(Erc3009Error::NotYetValid(after));
        }
        if now.as_secs() >= before {
            return Err(Erc3009Error::Expired(before));
        }
        Ok(())
    }

    /// The EIP-712 digest the payer signs for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Erc3009Error`] if `nonce` is not a hex word.
    pub fn signing_hash(&self, domain: &TokenDomain) -> Result<B256, Erc3009Error> {
        let typed = TransferWithAuthorization {
            from: self.from_address,
            to: self.to_address,
            value: self.value,
            validAfter: U256::from(self.valid_after.as_secs()),
            validBefore: U256::from(self.valid_before.as_secs()),
            nonce: fixed_word("nonce", &self.nonce)?,
        };
        Ok(typed.eip712_signing_hash(&domain.eip712()))
    }

    /// Recovers the signer and checks that it is `from_address`.
    ///
    /// # Errors
    ///
    /// Returns [`Erc3009Error::SignatureInvalid`] if `(v, r, s)` does not
    /// recover, or [`Erc3009Error::SignerMismatch`] if it recovers to another
    /// address.
    pub fn check_signature(&self, domain: &TokenDomain) -> Result<(), Erc3009Error> {
        let hash = self.signing_hash(domain)?;
        let Words { r, s, .. } = self.words()?;
        let parity = match self.v {
            0 | 27 => false,
            1 | 28 => true,
            other => {
                return Err(Erc3009Error::SignatureInvalid(format!(
                    "v must be 27 or 28, got {other}"
                )));
            }
        };
        let signature = Signature::new(U256::from_be_bytes(r.0), U256::from_be_bytes(s.0), parity);
        let recovered = signature
            .recover_address_from_prehash(&hash)
            .map_err(|e| Erc3009Error::SignatureInvalid(e.to_string()))?;
        if recovered != self.from_address {
            return Err(Erc3009Error::SignerMismatch {
                expected: self.from_address.to_string(),
                recovered: recovered.to_string(),
            });
        }
        Ok(())
    }
}

fn into_verdict(result: Result<(), Erc3009Error>) -> Verdict {
    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        tracing::debug!(
            reason = %vouch::Reason::reason(err),
            error = %err,
            "erc-3009 authorization rejected"
        );
    }
    Verdict::from(result)
}

/// Checks an authorization's validity window at `now`.
pub fn validate_authorization_timing(auth: &Erc3009Authorization, now: UnixTimestamp) -> Verdict {
    into_verdict(auth.check_timing(now))
}

/// Checks that `from_address` signed the authorization under `domain`.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(from = %auth.from_address)))]
pub fn verify_authorization_signature(auth: &Erc3009Authorization, domain: &TokenDomain) -> Verdict {
    into_verdict(auth.check_signature(domain))
}

/// Checks the validity window, then the signature.
pub fn verify_authorization(
    auth: &Erc3009Authorization,
    domain: &TokenDomain,
    now: UnixTimestamp,
) -> Verdict {
    into_verdict(
        auth.check_timing(now)
            .and_then(|()| auth.check_signature(domain)),
    )
}

/// ABI-encodes `(from, to, value, validAfter, validBefore, nonce, v, r, s)`
/// as nine 32-byte words.
///
/// # Errors
///
/// Returns [`Erc3009Error::HexTooLong`] if `nonce`, `r` or `s` exceeds 32
/// bytes, or [`Erc3009Error::InvalidHex`] if one does not decode.
pub fn encode_authorization_params(auth: &Erc3009Authorization) -> Result<Vec<u8>, Erc3009Error> {
    let Words { nonce, r, s } = auth.words()?;
    Ok((
        auth.from_address,
        auth.to_address,
        auth.value,
        U256::from(auth.valid_after.as_secs()),
        U256::from(auth.valid_before.as_secs()),
        nonce,
        U256::from(auth.v),
        r,
        s,
    )
        .abi_encode_params())
}

/// Calldata for `transferWithAuthorization(..., uint8 v, bytes32 r, bytes32 s)`:
/// the 4-byte selector followed by [`encode_authorization_params`].
///
/// # Errors
///
/// Same as [`encode_authorization_params`].
pub fn transfer_with_authorization_calldata(
    auth: &Erc3009Authorization,
) -> Result<Vec<u8>, Erc3009Error> {
    let Words { nonce, r, s } = auth.words()?;
    let call = IEIP3009::transferWithAuthorizationCall {
        from: auth.from_address,
        to: auth.to_address,
        value: auth.value,
        validAfter: U256::from(auth.valid_after.as_secs()),
        validBefore: U256::from(auth.valid_before.as_secs()),
        nonce,
        v: auth.v,
        r,
        s,
    };
    Ok(call.abi_encode())
}
