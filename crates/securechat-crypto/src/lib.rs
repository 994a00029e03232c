//! SecureChat Cryptographic Primitives
//!
//! Key derivation and authenticated encryption for two-party conversations.
//! Pure functions with deterministic outputs. Callers provide the nonce bytes
//! so encryption can be replayed exactly in tests.
//!
//! # Key Lifecycle
//!
//! ```text
//! (identity a, identity b)
//!        │
//!        ▼ sort, join with ':'
//! SHA-512 → first 32 bytes
//!        │
//!        ▼
//! SharedKey (lives for one encrypt/decrypt call)
//!        │
//!        ▼
//! AES-256-GCM (96-bit nonce) → ciphertext || tag
//! ```
//!
//! # Security
//!
//! The pairwise key is static and saltless. Anyone who knows both identities
//! can recompute it, and it never rotates. There is no forward secrecy and no
//! post-compromise recovery. The scheme is kept bit-compatible with the
//! records already stored in existing conversation logs; any hardening has to
//! ship as a new record version rather than a silent change here.
//!
//! What the AEAD does provide:
//! - Tamper detection: a flipped bit in ciphertext or tag fails decryption
//! - Pair binding: a record only opens under the key of its own
//!   (sender, receiver) pair
//! - Nonce freshness: every encryption takes a fresh random nonce from the
//!   caller

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cipher;
mod derivation;
mod error;

pub use cipher::{
    DECRYPTION_FAILED, EncryptedText, KEY_MISSING, NONCE_SIZE, TAG_SIZE, decrypt_text,
    encrypt_text, open_text,
};
pub use derivation::{KEY_SIZE, PAIR_SEPARATOR, SharedKey, derive_shared_key};
pub use error::CipherError;
