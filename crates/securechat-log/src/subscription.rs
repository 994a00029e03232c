//! Cancellable live subscription handle.

use securechat_core::{ConversationId, LogEntry};
use tokio::sync::mpsc;

/// Receiving end of a live subscription.
///
/// Each received batch is the full ordered snapshot of the conversation.
/// Cancelling closes the channel synchronously: once [`Subscription::cancel`]
/// returns, no batch from this subscription can be observed again, including
/// batches already queued.
#[derive(Debug)]
pub struct Subscription {
    conversation: ConversationId,
    batches: mpsc::UnboundedReceiver<Vec<LogEntry>>,
}

/// Sending end held by the log.
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
    batches: mpsc::UnboundedSender<Vec<LogEntry>>,
}

impl Subscription {
    /// Create a connected sender/subscription pair for `conversation`.
    pub fn channel(conversation: ConversationId) -> (SubscriptionSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubscriptionSender { batches: tx }, Self { conversation, batches: rx })
    }

    /// Conversation this subscription follows.
    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// Wait for the next batch. `None` once the log dropped the sender.
    pub async fn next_batch(&mut self) -> Option<Vec<LogEntry>> {
        self.batches.recv().await
    }

    /// Next batch if one is already queued.
    pub fn try_next_batch(&mut self) -> Option<Vec<LogEntry>> {
        self.batches.try_recv().ok()
    }

    /// Stop the subscription.
    ///
    /// Consumes the handle, so a cancelled subscription cannot be polled.
    pub fn cancel(mut self) {
        self.batches.close();
        tracing::debug!(conversation = %self.conversation, "subscription cancelled");
    }
}

impl SubscriptionSender {
    /// Push a batch. Returns `false` if the subscription is gone.
    pub fn deliver(&self, batch: Vec<LogEntry>) -> bool {
        self.batches.send(batch).is_ok()
    }

    /// True once the subscription was cancelled or dropped.
    pub fn is_closed(&self) -> bool {
        self.batches.is_closed()
    }
}
