//! Property-based tests for pairwise key derivation and message encryption.
//!
//! Verifies the algebraic properties every conversation relies on:
//! - Key symmetry across the identity pair
//! - Round trip for any plaintext
//! - Records never open under a third party's pair, and never panic
//! - Fresh nonces give fresh ciphertexts

use proptest::prelude::*;
use securechat_crypto::{
    DECRYPTION_FAILED, KEY_MISSING, NONCE_SIZE, decrypt_text, derive_shared_key, encrypt_text,
    open_text,
};

fn identity() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,16}"
}

proptest! {
    #[test]
    fn prop_key_is_symmetric(a in ".*", b in ".*") {
        prop_assert_eq!(derive_shared_key(&a, &b), derive_shared_key(&b, &a));
    }

    #[test]
    fn prop_roundtrip(
        plaintext in ".*",
        a in identity(),
        b in identity(),
        nonce in any::<[u8; NONCE_SIZE]>(),
    ) {
        let encrypted = encrypt_text(&plaintext, &a, &b, nonce);
        let decrypted = decrypt_text(&encrypted.ciphertext, &encrypted.nonce, &a, &b);
        prop_assert_eq!(decrypted, Ok(plaintext));
    }

    #[test]
    fn prop_third_party_pair_yields_sentinel(
        plaintext in ".*",
        a in identity(),
        b in identity(),
        c in identity(),
        nonce in any::<[u8; NONCE_SIZE]>(),
    ) {
        prop_assume!(c != a && c != b);

        let encrypted = encrypt_text(&plaintext, &a, &b, nonce);
        let opened = open_text(&encrypted.ciphertext, &encrypted.nonce, &a, &c);
        prop_assert_eq!(opened, DECRYPTION_FAILED);
    }

    #[test]
    fn prop_fresh_nonce_fresh_ciphertext(
        plaintext in ".+",
        a in identity(),
        b in identity(),
        nonce1 in any::<[u8; NONCE_SIZE]>(),
        nonce2 in any::<[u8; NONCE_SIZE]>(),
    ) {
        prop_assume!(nonce1 != nonce2);

        let encrypted1 = encrypt_text(&plaintext, &a, &b, nonce1);
        let encrypted2 = encrypt_text(&plaintext, &a, &b, nonce2);
        prop_assert_ne!(encrypted1.ciphertext, encrypted2.ciphertext);
    }

    #[test]
    fn prop_open_never_panics_on_garbage(
        ciphertext in prop::collection::vec(any::<u8>(), 0..64),
        nonce in prop::collection::vec(any::<u8>(), 0..32),
        sender in ".{0,8}",
        receiver in ".{0,8}",
    ) {
        let opened = open_text(&ciphertext, &nonce, &sender, &receiver);
        if sender.is_empty() || receiver.is_empty() {
            prop_assert_eq!(opened, KEY_MISSING);
        } else {
            // 2^-128 chance that garbage authenticates
            prop_assert_eq!(opened, DECRYPTION_FAILED);
        }
    }
}
