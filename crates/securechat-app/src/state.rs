//! Observable session state types.
//!
//! The data a UI renders from a [`crate::ConversationSession`]: the session
//! phase and the decoded message list. Nothing here holds key material.

use std::fmt;

use securechat_core::{Identity, RecordId, ServerTimestamp};
use uuid::Uuid;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No conversation open. Initial state.
    #[default]
    Closed,
    /// Subscription requested, no batch delivered yet.
    Loading,
    /// At least one batch delivered for the current conversation.
    Active,
}

/// Tag of one subscription request made by a session.
///
/// Increases with every `open`. Batches carrying an old tag belong to a
/// conversation the session has left and are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw tag.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw tag.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Id of a decoded message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Record stored in the log.
    Record(RecordId),
    /// Optimistic entry added by `send`, not (yet) seen in a log batch.
    Local(Uuid),
}

/// A message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Log record id, or a local id for optimistic entries.
    pub id: MessageId,
    /// Author.
    pub sender: Identity,
    /// Plaintext, or a failure sentinel.
    pub text: String,
    /// Log order key. `None` for optimistic entries.
    pub timestamp: Option<ServerTimestamp>,
}

impl DecodedMessage {
    /// True for an optimistic entry that has no log record behind it.
    ///
    /// Optimistic entries are never reconciled with the stored record; the
    /// next delivered batch replaces the whole list.
    pub fn is_local_only(&self) -> bool {
        matches!(self.id, MessageId::Local(_))
    }
}
