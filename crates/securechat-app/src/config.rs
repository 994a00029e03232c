//! Session configuration.

use securechat_core::Identity;

/// Tunables for decoding and sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Sender shown for legacy records that carry none.
    pub unknown_sender: Identity,
    /// Trim surrounding whitespace from outgoing text before encrypting.
    pub trim_outgoing: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { unknown_sender: Identity::new("unknown"), trim_outgoing: true }
    }
}
