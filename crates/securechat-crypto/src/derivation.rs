//! Pairwise key derivation using SHA-512

use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

/// Separator placed between the two sorted identities before hashing.
pub const PAIR_SEPARATOR: &str = ":";

/// Size of the derived symmetric key (AES-256).
pub const KEY_SIZE: usize = 32;

/// Symmetric key shared by exactly one identity pair.
///
/// Zeroized on drop. Never persisted: callers derive it, use it for a single
/// encrypt or decrypt, and let it go.
pub struct SharedKey(Zeroizing<[u8; KEY_SIZE]>);

impl SharedKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SharedKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SharedKey {}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey([REDACTED])")
    }
}

/// Derive the symmetric key for the unordered pair `(a, b)`.
///
/// The pair is sorted, joined with [`PAIR_SEPARATOR`], hashed with SHA-512,
/// and the first [`KEY_SIZE`] bytes of the digest become the key.
///
/// # Security
///
/// - Symmetric: `derive_shared_key(a, b) == derive_shared_key(b, a)`
/// - Deterministic: no salt, no counter, no rotation
/// - Empty identities are accepted and still produce a key. Callers that must
///   reject them do so before deriving (see [`crate::decrypt_text`])
pub fn derive_shared_key(a: &str, b: &str) -> SharedKey {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Sha512::new();
    hasher.update(first.as_bytes());
    hasher.update(PAIR_SEPARATOR.as_bytes());
    hasher.update(second.as_bytes());
    let digest = hasher.finalize();

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&digest[..KEY_SIZE]);
    SharedKey(key)
}
