//! Message log abstraction for SecureChat
//!
//! The log is the only shared state between two participants: an
//! append-only, per-conversation sequence of record documents, ordered by a
//! timestamp the log assigns, with live subscriptions that push the full
//! ordered snapshot every time the conversation changes.
//!
//! The log offers no multi-record atomicity. Bulk operations (deleting a
//! conversation) are a sequence of single-record calls and may stop halfway.
//!
//! # Implementations
//!
//! - [`MemoryLog`]: in-process log for tests and simulation
//! - [`ChaoticLog`]: wrapper that injects failures for fault testing

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chaotic;
mod error;
mod memory;
mod subscription;

use async_trait::async_trait;
pub use chaotic::ChaoticLog;
pub use error::LogError;
pub use memory::{ConversationMetadata, MemoryLog};
use securechat_core::{ConversationId, LogEntry, RecordDocument, RecordId};
pub use subscription::{Subscription, SubscriptionSender};

/// Append-only, live-subscribable storage of conversation records.
///
/// Must be Clone (shared by a session runtime and its deletion coordinator)
/// and Send + Sync. Implementations typically share internal state via Arc,
/// so clones access the same underlying log.
#[async_trait]
pub trait MessageLog: Clone + Send + Sync + 'static {
    /// Append a record to the conversation.
    ///
    /// # Invariants
    ///
    /// - Post: the returned entry carries a timestamp strictly greater than
    ///   every timestamp previously assigned in this conversation
    /// - Post: every live subscription to the conversation receives a new
    ///   snapshot including the entry
    async fn append(
        &self,
        conversation: &ConversationId,
        document: RecordDocument,
    ) -> Result<LogEntry, LogError>;

    /// Subscribe to the conversation's ordered snapshots.
    ///
    /// The current snapshot (possibly empty) is delivered immediately. Every
    /// later batch is again the complete conversation, ascending by
    /// timestamp. The subscription lives until [`Subscription::cancel`] or
    /// drop.
    async fn subscribe(&self, conversation: &ConversationId) -> Result<Subscription, LogError>;

    /// All records in the conversation, ascending by timestamp.
    ///
    /// Returns an empty list for a conversation that has never been written.
    async fn list_all(&self, conversation: &ConversationId) -> Result<Vec<LogEntry>, LogError>;

    /// Delete a single record.
    async fn delete(&self, conversation: &ConversationId, record: &RecordId)
    -> Result<(), LogError>;

    /// Delete the conversation's parent metadata record.
    ///
    /// Returns `Ok(false)` if there was none; absence is not an error.
    async fn delete_parent(&self, conversation: &ConversationId) -> Result<bool, LogError>;
}
