//! Session input events.
//!
//! Everything the runtime reports back to the [`crate::ConversationSession`]
//! after executing its actions: delivered batches, subscriptions the log ended,
//! and the outcome of subscribe and append calls.

use securechat_core::{LogEntry, RecordId};
use uuid::Uuid;

use crate::SubscriptionId;

/// Events processed by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A full, ordered snapshot arrived on a subscription.
    BatchDelivered {
        /// Subscription the batch arrived on.
        subscription: SubscriptionId,
        /// Entries ascending by server timestamp.
        entries: Vec<LogEntry>,
    },

    /// The log refused a subscription.
    SubscribeFailed {
        /// Subscription that was requested.
        subscription: SubscriptionId,
        /// Error description.
        reason: String,
    },

    /// The log ended a subscription it had accepted.
    SubscriptionClosed {
        /// Subscription the log ended.
        subscription: SubscriptionId,
    },

    /// The log stored an appended record.
    AppendAcknowledged {
        /// Optimistic entry the record backs.
        local_id: Uuid,
        /// Log-assigned record id.
        record: RecordId,
    },

    /// The log rejected an append.
    AppendFailed {
        /// Optimistic entry the record backs.
        local_id: Uuid,
        /// Error description.
        reason: String,
    },
}
