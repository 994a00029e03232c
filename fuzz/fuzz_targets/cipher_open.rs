//! Fuzz target for message decryption
//!
//! Opens arbitrary ciphertext/nonce/identity combinations:
//! - Nonces of every length
//! - Ciphertexts shorter than the tag
//! - Empty sender or receiver
//!
//! The fuzzer should NEVER panic. Every failure must be one of the two
//! sentinels, and a payload sealed by the fuzzer itself must open.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use securechat_crypto::{DECRYPTION_FAILED, KEY_MISSING, decrypt_text, encrypt_text, open_text};

#[derive(Debug, Arbitrary)]
struct Input {
    ciphertext: Vec<u8>,
    nonce: Vec<u8>,
    sender: String,
    receiver: String,
    plaintext: String,
    sealing_nonce: [u8; 12],
}

fuzz_target!(|input: Input| {
    let opened = open_text(&input.ciphertext, &input.nonce, &input.sender, &input.receiver);
    if let Err(err) = decrypt_text(&input.ciphertext, &input.nonce, &input.sender, &input.receiver)
    {
        assert!(opened == DECRYPTION_FAILED || opened == KEY_MISSING, "{err}");
    }

    if input.sender.is_empty() || input.receiver.is_empty() {
        return;
    }

    let sealed = encrypt_text(&input.plaintext, &input.sender, &input.receiver, input.sealing_nonce);
    assert_eq!(
        open_text(&sealed.ciphertext, &sealed.nonce, &input.receiver, &input.sender),
        input.plaintext
    );
});
