//! Session side-effects.
//!
//! [`SessionAction`]s are instructions produced by the
//! [`crate::ConversationSession`] state machine for the runtime to execute,
//! in order, against the message log.

use securechat_core::{ConversationId, EncryptedRecord};
use uuid::Uuid;

use crate::SubscriptionId;

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Cancel a live subscription.
    ///
    /// Always emitted before the `Subscribe` that replaces it. The runtime
    /// must complete the cancel before executing anything that follows.
    CancelSubscription {
        /// Subscription to cancel.
        subscription: SubscriptionId,
    },

    /// Subscribe to a conversation's ordered snapshots.
    Subscribe {
        /// Tag for batches delivered on this subscription.
        subscription: SubscriptionId,
        /// Conversation to follow.
        conversation: ConversationId,
    },

    /// Append an encrypted record to the log.
    Append {
        /// Target conversation, fixed at send time.
        conversation: ConversationId,
        /// Id of the optimistic entry this record backs.
        local_id: Uuid,
        /// Record to store.
        record: EncryptedRecord,
    },
}
