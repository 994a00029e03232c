//! Message encryption using AES-256-GCM
//!
//! [`encrypt_text`] and [`decrypt_text`] are pure; the nonce is supplied by
//! the caller. [`open_text`] is the rendering boundary: it never fails and
//! turns every decryption error into a fixed sentinel string.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{CipherError, derive_shared_key};

/// AES-GCM nonce size (96 bits)
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size, appended to the ciphertext
pub const TAG_SIZE: usize = 16;

/// Rendered in place of a message that fails to decrypt.
pub const DECRYPTION_FAILED: &str = "[Decryption Failed]";

/// Rendered in place of a message whose sender or receiver is empty.
pub const KEY_MISSING: &str = "[Key Missing]";

/// Ciphertext (with tag) and the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedText {
    /// AES-GCM ciphertext including the 16-byte tag
    pub ciphertext: Vec<u8>,
    /// The 12-byte nonce
    pub nonce: [u8; NONCE_SIZE],
}

/// Encrypt `plaintext` under the key shared by `self_id` and `partner_id`.
///
/// # Security
///
/// Caller MUST provide a fresh, cryptographically random nonce for every
/// call. Reusing a nonce under the same pair leaks the XOR of the two
/// plaintexts and allows tag forgery.
pub fn encrypt_text(
    plaintext: &str,
    self_id: &str,
    partner_id: &str,
    nonce: [u8; NONCE_SIZE],
) -> EncryptedText {
    let key = derive_shared_key(self_id, partner_id);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes()) else {
        unreachable!("AES-256-GCM encryption cannot fail for messages under 64 GiB");
    };

    EncryptedText { ciphertext, nonce }
}

/// Decrypt a payload sealed for the `(sender, receiver)` pair.
///
/// The key is derived from the record's own sender and receiver, so the
/// result does not depend on which side of the conversation is reading.
/// Invalid UTF-8 in an authenticated plaintext is replaced, not rejected.
///
/// # Errors
///
/// - `KeyMissing`: sender or receiver is empty (checked before any crypto)
/// - `MalformedNonce`: nonce is not [`NONCE_SIZE`] bytes
/// - `Truncated`: ciphertext cannot even hold a tag
/// - `AuthenticationFailed`: wrong pair or tampered payload
pub fn decrypt_text(
    ciphertext: &[u8],
    nonce: &[u8],
    sender: &str,
    receiver: &str,
) -> Result<String, CipherError> {
    if sender.is_empty() || receiver.is_empty() {
        return Err(CipherError::KeyMissing);
    }

    if nonce.len() != NONCE_SIZE {
        return Err(CipherError::MalformedNonce { expected: NONCE_SIZE, actual: nonce.len() });
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(CipherError::Truncated { len: ciphertext.len() });
    }

    let key = derive_shared_key(sender, receiver);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)?;

    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}

/// Decrypt for display. Never fails.
///
/// Returns the plaintext, [`KEY_MISSING`] when an identity is empty, or
/// [`DECRYPTION_FAILED`] for every other error.
pub fn open_text(ciphertext: &[u8], nonce: &[u8], sender: &str, receiver: &str) -> String {
    decrypt_text(ciphertext, nonce, sender, receiver)
        .unwrap_or_else(|err| err.sentinel().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: [u8; NONCE_SIZE] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let encrypted = encrypt_text("Hello, World!", "alice", "bob", NONCE);
        let decrypted = decrypt_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "bob");
        assert_eq!(decrypted.as_deref(), Ok("Hello, World!"));
    }

    #[test]
    fn receiver_decrypts_with_record_fields() {
        // Bob reads a record Alice wrote: sender/receiver come from the record
        let encrypted = encrypt_text("hi", "alice", "bob", NONCE);
        let opened = open_text(&encrypted.ciphertext, &encrypted.nonce, "bob", "alice");
        assert_eq!(opened, "hi");
    }

    #[test]
    fn known_answer_matches_webcrypto_output() {
        // AES-256-GCM("hi") under SHA-512("alice:bob")[..32], nonce 00..0b
        let encrypted = encrypt_text("hi", "alice", "bob", NONCE);
        let expected: [u8; 18] = [
            0x4d, 0xd6, 0x09, 0xea, 0x81, 0x36, 0xb2, 0x29, 0xe1, 0x82, 0xad, 0xef, 0xc6, 0xb4,
            0x4b, 0x4b, 0xf8, 0xdc,
        ];
        assert_eq!(encrypted.ciphertext, expected);
    }

    #[test]
    fn encrypt_decrypt_empty_message() {
        let encrypted = encrypt_text("", "alice", "bob", NONCE);
        assert_eq!(encrypted.ciphertext.len(), TAG_SIZE);
        assert_eq!(open_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "bob"), "");
    }

    #[test]
    fn ciphertext_is_larger_than_plaintext() {
        let encrypted = encrypt_text("test message", "alice", "bob", NONCE);
        assert_eq!(encrypted.ciphertext.len(), "test message".len() + TAG_SIZE);
    }

    #[test]
    fn different_nonces_produce_different_ciphertexts() {
        let encrypted1 = encrypt_text("test", "alice", "bob", [0x00; NONCE_SIZE]);
        let encrypted2 = encrypt_text("test", "alice", "bob", [0xFF; NONCE_SIZE]);
        assert_ne!(encrypted1.ciphertext, encrypted2.ciphertext);
    }

    #[test]
    fn wrong_pair_yields_failure_sentinel() {
        let encrypted = encrypt_text("secret message", "alice", "bob", NONCE);

        let result = decrypt_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "carol");
        assert_eq!(result, Err(CipherError::AuthenticationFailed));

        let opened = open_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "carol");
        assert_eq!(opened, DECRYPTION_FAILED);
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let mut encrypted = encrypt_text("original message", "alice", "bob", NONCE);
        encrypted.ciphertext[0] ^= 0xFF;

        let result = decrypt_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "bob");
        assert_eq!(result, Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn tampered_tag_fails_decryption() {
        let mut encrypted = encrypt_text("original message", "alice", "bob", NONCE);
        let last = encrypted.ciphertext.len() - 1;
        encrypted.ciphertext[last] ^= 0x01;

        assert_eq!(
            open_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "bob"),
            DECRYPTION_FAILED
        );
    }

    #[test]
    fn empty_identity_short_circuits_to_key_missing() {
        let encrypted = encrypt_text("hi", "alice", "bob", NONCE);

        assert_eq!(
            decrypt_text(&encrypted.ciphertext, &encrypted.nonce, "", "bob"),
            Err(CipherError::KeyMissing)
        );
        assert_eq!(open_text(&encrypted.ciphertext, &encrypted.nonce, "alice", ""), KEY_MISSING);
    }

    #[test]
    fn malformed_nonce_is_rejected_without_panicking() {
        let encrypted = encrypt_text("hi", "alice", "bob", NONCE);

        let result = decrypt_text(&encrypted.ciphertext, &[0u8; 8], "alice", "bob");
        assert_eq!(result, Err(CipherError::MalformedNonce { expected: NONCE_SIZE, actual: 8 }));
        assert_eq!(open_text(&encrypted.ciphertext, &[], "alice", "bob"), DECRYPTION_FAILED);
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let result = decrypt_text(&[1, 2, 3], &NONCE, "alice", "bob");
        assert_eq!(result, Err(CipherError::Truncated { len: 3 }));
    }

    #[test]
    fn unicode_roundtrip() {
        let text = "héllo 👋 नमस्ते";
        let encrypted = encrypt_text(text, "alice", "bob", NONCE);
        assert_eq!(open_text(&encrypted.ciphertext, &encrypted.nonce, "alice", "bob"), text);
    }
}
