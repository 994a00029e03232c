//! Production Environment implementation using the OS RNG.
//!
//! `SystemEnv` draws every nonce and local message id from getrandom. Not
//! reproducible; simulations use a seeded environment instead.

use securechat_core::env::Environment;

/// Production environment using cryptographic RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. Sealing a message under a predictable nonce
/// would break confidentiality for the whole pair, so there is no fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - nonces would be predictable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn system_env_fills_nonce_sized_buffers() {
        let env = SystemEnv::new();

        let nonces: Vec<[u8; 12]> = (0..4)
            .map(|_| {
                let mut nonce = [0u8; 12];
                env.random_bytes(&mut nonce);
                nonce
            })
            .collect();

        for (i, a) in nonces.iter().enumerate() {
            for b in &nonces[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
