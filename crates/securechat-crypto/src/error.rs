//! Error types for message encryption

use thiserror::Error;

/// Errors from decrypting a message payload.
///
/// Encryption itself cannot fail for well-formed inputs, so every variant
/// describes why a stored record could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Sender or receiver identity is empty, so no key can be derived
    #[error("key missing: sender or receiver identity is empty")]
    KeyMissing,

    /// Nonce has the wrong length for AES-GCM
    #[error("malformed nonce: expected {expected} bytes, got {actual}")]
    MalformedNonce {
        /// Required nonce length
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Ciphertext is shorter than the authentication tag
    #[error("truncated ciphertext: {len} bytes")]
    Truncated {
        /// Length of the supplied ciphertext
        len: usize,
    },

    /// Authentication tag mismatch (wrong key or tampered payload)
    #[error("decryption failed: authentication failed")]
    AuthenticationFailed,
}

impl CipherError {
    /// Sentinel text rendered in place of the message for this error.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::KeyMissing => crate::KEY_MISSING,
            Self::MalformedNonce { .. } | Self::Truncated { .. } | Self::AuthenticationFailed => {
                crate::DECRYPTION_FAILED
            },
        }
    }
}
