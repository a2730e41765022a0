//! ERC-3009 signer recovery with a real key, and header round-trips.

use alloy_primitives::{B256, U256, address, hex};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use proptest::prelude::*;
use vouch::UnixTimestamp;
use vouch_x402::headers::{
    decode_challenge, decode_payment_signature, encode_challenge, encode_payment_signature,
};
use vouch_x402::{
    Erc3009Authorization, TokenDomain, X402Challenge, X402PaymentPayload, verify_authorization,
    verify_authorization_signature,
};

fn usdc_base() -> TokenDomain {
    TokenDomain {
        name: "USD Coin".into(),
        version: "2".into(),
        chain_id: 8453,
        verifying_contract: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
    }
}

fn payer() -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::repeat_byte(0x11)).unwrap()
}

fn signed(signer: &PrivateKeySigner, domain: &TokenDomain) -> Erc3009Authorization {
    let mut auth = Erc3009Authorization {
        from_address: signer.address(),
        to_address: address!("0x209693Bc6afc0C5328bA36FaF03C514EF312287C"),
        value: U256::from(1_500_000u64),
        valid_after: UnixTimestamp::from_secs(1_800_000_000 - 600),
        valid_before: UnixTimestamp::from_secs(1_800_000_000 + 300),
        nonce: hex::encode_prefixed([0x5a; 32]),
        v: 0,
        r: String::new(),
        s: String::new(),
    };
    let hash = auth.signing_hash(domain).unwrap();
    let signature = signer.sign_hash_sync(&hash).unwrap();
    auth.v = 27 + u8::from(signature.v());
    auth.r = hex::encode_prefixed(signature.r().to_be_bytes::<32>());
    auth.s = hex::encode_prefixed(signature.s().to_be_bytes::<32>());
    auth
}

#[test]
fn test_recovers_payer() {
    let domain = usdc_base();
    let auth = signed(&payer(), &domain);
    assert!(verify_authorization_signature(&auth, &domain).is_accepted());
    assert!(
        verify_authorization(&auth, &domain, UnixTimestamp::from_secs(1_800_000_000))
            .is_accepted()
    );
    assert_eq!(
        verify_authorization(&auth, &domain, UnixTimestamp::from_secs(1_800_000_300)).reason(),
        Some("authorization_expired")
    );
}

#[test]
fn test_tampered_authorization_recovers_someone_else() {
    let domain = usdc_base();
    let mut auth = signed(&payer(), &domain);
    auth.value = U256::from(9_000_000u64);
    assert_eq!(
        verify_authorization_signature(&auth, &domain).reason(),
        Some("authorization_signer_mismatch")
    );

    let auth = signed(&payer(), &domain);
    let mut other_chain = domain;
    other_chain.chain_id = 84532;
    assert_eq!(
        verify_authorization_signature(&auth, &other_chain).reason(),
        Some("authorization_signer_mismatch")
    );
}

#[test]
fn test_recovery_id_forms() {
    let domain = usdc_base();
    let mut auth = signed(&payer(), &domain);
    auth.v -= 27;
    assert!(verify_authorization_signature(&auth, &domain).is_accepted());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_challenge_header_round_trip(
        payment_id in "[0-9a-f]{32}",
        resource_uri in "/[a-z0-9/]{0,40}",
        amount in any::<u64>(),
        currency in "[A-Z]{3,5}",
        network in "[a-z0-9:-]{1,20}",
        token in proptest::option::of("0x[0-9a-fA-F]{40}"),
        expires in any::<u64>(),
        nonce in "[0-9a-f]{64}",
    ) {
        let challenge = X402Challenge {
            payment_id,
            resource_uri,
            amount: amount.to_string(),
            currency,
            payee_address: "0x209693Bc6afc0C5328bA36FaF03C514EF312287C".into(),
            network,
            token_address: token,
            expires_at: UnixTimestamp::from_secs(expires),
            nonce,
        };
        let header = encode_challenge(&challenge).unwrap();
        prop_assert_eq!(decode_challenge(&header).unwrap(), challenge);
    }

    #[test]
    fn prop_payment_signature_round_trip(
        payment_id in "\\PC{0,40}",
        amount in any::<u64>(),
        nonce in "\\PC{0,64}",
        signature in "\\PC{0,132}",
    ) {
        let payload = X402PaymentPayload {
            payment_id,
            payer_address: "0x857b06519E91e3A54538791bDbb0E22373e36b66".into(),
            amount: amount.to_string(),
            nonce,
            signature,
        };
        let header = encode_payment_signature(&payload).unwrap();
        prop_assert_eq!(decode_payment_signature(&header).unwrap(), payload);
    }
}
