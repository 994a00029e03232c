//! Message log error types.
//!
//! Defines errors that can occur during log operations:
//! - `NotFound`: Record to delete does not exist
//! - `Io`: Underlying storage system errors

use securechat_core::{ConversationId, RecordId};
use thiserror::Error;

/// Errors that can occur during message log operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Record not found in the conversation
    #[error("record not found: conversation {conversation}, record {record}")]
    NotFound {
        /// Conversation that was searched
        conversation: ConversationId,
        /// Record that was not found
        record: RecordId,
    },

    /// I/O error in the backing store
    #[error("I/O error: {0}")]
    Io(String),
}

impl LogError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
