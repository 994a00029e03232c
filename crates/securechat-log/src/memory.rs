//! In-memory message log.
//!
//! Conversations live in one shared map behind a mutex. Every change pushes
//! the full ordered snapshot to the conversation's subscribers.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use securechat_core::{ConversationId, LogEntry, RecordDocument, RecordId, ServerTimestamp};

use super::{LogError, MessageLog, Subscription, SubscriptionSender};

/// Parent metadata record of a conversation.
///
/// Created on the first append and kept until deleted explicitly, so it may
/// outlive every message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationMetadata {
    /// Timestamp of the first record ever appended.
    pub created_at: ServerTimestamp,
}

/// In-memory message log for testing and simulation
///
/// Uses `HashMap` per conversation and Vec for ordered entries. All state is
/// wrapped in Arc<Mutex<>> to allow Clone and concurrent access. Uses
/// `lock().expect()` which will panic if the mutex is poisoned - acceptable
/// for test code. No lock is ever held across an await point.
///
/// Timestamps come from a single counter shared by all conversations, so
/// they are strictly increasing in append order.
#[derive(Clone)]
pub struct MemoryLog {
    inner: Arc<Mutex<MemoryLogInner>>,
}

struct MemoryLogInner {
    /// Entries per conversation, in timestamp order
    conversations: HashMap<ConversationId, Vec<LogEntry>>,

    /// Parent metadata per conversation
    parents: HashMap<ConversationId, ConversationMetadata>,

    /// Live subscribers per conversation
    subscribers: HashMap<ConversationId, Vec<SubscriptionSender>>,

    /// Last assigned timestamp
    clock: u64,
}

impl MemoryLogInner {
    fn snapshot(&self, conversation: &ConversationId) -> Vec<LogEntry> {
        self.conversations.get(conversation).cloned().unwrap_or_default()
    }

    /// Push the current snapshot to every live subscriber, pruning closed ones.
    fn publish(&mut self, conversation: &ConversationId) {
        let snapshot = self.snapshot(conversation);
        if let Some(subscribers) = self.subscribers.get_mut(conversation) {
            subscribers.retain(|subscriber| subscriber.deliver(snapshot.clone()));
        }
    }
}

impl MemoryLog {
    /// Create a new empty `MemoryLog`
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryLogInner {
                conversations: HashMap::new(),
                parents: HashMap::new(),
                subscribers: HashMap::new(),
                clock: 0,
            })),
        }
    }

    /// Number of records in a conversation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    pub fn record_count(&self, conversation: &ConversationId) -> usize {
        self.inner.lock().expect("Mutex poisoned").conversations.get(conversation).map_or(0, Vec::len)
    }

    /// Number of subscriptions to a conversation that are still open.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    pub fn live_subscriptions(&self, conversation: &ConversationId) -> usize {
        let inner = self.inner.lock().expect("Mutex poisoned");
        inner
            .subscribers
            .get(conversation)
            .map_or(0, |subscribers| subscribers.iter().filter(|s| !s.is_closed()).count())
    }

    /// Parent metadata of a conversation. `None` if absent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    pub fn parent(&self, conversation: &ConversationId) -> Option<ConversationMetadata> {
        self.inner.lock().expect("Mutex poisoned").parents.get(conversation).copied()
    }

    /// Store a raw document in a conversation, bypassing any writer.
    ///
    /// Used to seed legacy or malformed records that current writers never
    /// produce.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    pub fn insert_document(
        &self,
        conversation: &ConversationId,
        document: RecordDocument,
    ) -> LogEntry {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        inner.clock += 1;
        let timestamp = ServerTimestamp::new(inner.clock);
        let entry = LogEntry {
            id: RecordId::new(format!("rec-{:06}", inner.clock)),
            timestamp,
            document,
        };

        let entries = inner.conversations.entry(conversation.clone()).or_default();
        debug_assert!(entries.last().is_none_or(|last| last.timestamp < timestamp));
        entries.push(entry.clone());

        inner
            .parents
            .entry(conversation.clone())
            .or_insert(ConversationMetadata { created_at: timestamp });

        inner.publish(conversation);
        entry
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageLog for MemoryLog {
    async fn append(
        &self,
        conversation: &ConversationId,
        document: RecordDocument,
    ) -> Result<LogEntry, LogError> {
        Ok(self.insert_document(conversation, document))
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    async fn subscribe(&self, conversation: &ConversationId) -> Result<Subscription, LogError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let (sender, subscription) = Subscription::channel(conversation.clone());
        sender.deliver(inner.snapshot(conversation));

        let subscribers = inner.subscribers.entry(conversation.clone()).or_default();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.push(sender);

        Ok(subscription)
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    async fn list_all(&self, conversation: &ConversationId) -> Result<Vec<LogEntry>, LogError> {
        Ok(self.inner.lock().expect("Mutex poisoned").snapshot(conversation))
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    async fn delete(
        &self,
        conversation: &ConversationId,
        record: &RecordId,
    ) -> Result<(), LogError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let not_found =
            || LogError::NotFound { conversation: conversation.clone(), record: record.clone() };

        let entries = inner.conversations.get_mut(conversation).ok_or_else(not_found)?;
        let position = entries.iter().position(|e| &e.id == record).ok_or_else(not_found)?;
        entries.remove(position);

        inner.publish(conversation);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    async fn delete_parent(&self, conversation: &ConversationId) -> Result<bool, LogError> {
        Ok(self.inner.lock().expect("Mutex poisoned").parents.remove(conversation).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> ConversationId {
        ConversationId::from_raw("alice_bob")
    }

    fn legacy(message: &str) -> RecordDocument {
        RecordDocument {
            sender: Some("alice".to_string()),
            message: Some(message.to_string()),
            ..RecordDocument::default()
        }
    }

    #[tokio::test]
    async fn new_log_is_empty() {
        let log = MemoryLog::new();
        assert_eq!(log.record_count(&conversation()), 0);
        assert!(log.list_all(&conversation()).await.unwrap().is_empty());
        assert_eq!(log.parent(&conversation()), None);
    }

    #[tokio::test]
    async fn append_assigns_increasing_timestamps() {
        let log = MemoryLog::new();

        let first = log.append(&conversation(), legacy("one")).await.unwrap();
        let second = log.append(&conversation(), legacy("two")).await.unwrap();

        assert!(first.timestamp < second.timestamp);
        assert_ne!(first.id, second.id);

        let entries = log.list_all(&conversation()).await.unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[tokio::test]
    async fn first_append_creates_parent() {
        let log = MemoryLog::new();
        let entry = log.append(&conversation(), legacy("one")).await.unwrap();
        log.append(&conversation(), legacy("two")).await.unwrap();

        assert_eq!(
            log.parent(&conversation()),
            Some(ConversationMetadata { created_at: entry.timestamp })
        );
    }

    #[tokio::test]
    async fn subscribe_delivers_current_snapshot_immediately() {
        let log = MemoryLog::new();
        log.append(&conversation(), legacy("one")).await.unwrap();

        let mut sub = log.subscribe(&conversation()).await.unwrap();
        let batch = sub.try_next_batch().unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].document.message.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn empty_conversation_still_delivers_a_snapshot() {
        let log = MemoryLog::new();
        let mut sub = log.subscribe(&conversation()).await.unwrap();
        assert_eq!(sub.try_next_batch(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn subscribers_receive_full_snapshot_on_every_change() {
        let log = MemoryLog::new();
        let mut sub = log.subscribe(&conversation()).await.unwrap();
        let _ = sub.try_next_batch();

        log.append(&conversation(), legacy("one")).await.unwrap();
        log.append(&conversation(), legacy("two")).await.unwrap();

        assert_eq!(sub.try_next_batch().map(|b| b.len()), Some(1));
        assert_eq!(sub.try_next_batch().map(|b| b.len()), Some(2));
    }

    #[tokio::test]
    async fn other_conversations_are_not_delivered() {
        let log = MemoryLog::new();
        let mut sub = log.subscribe(&conversation()).await.unwrap();
        let _ = sub.try_next_batch();

        log.append(&ConversationId::from_raw("alice_carol"), legacy("hi")).await.unwrap();

        assert_eq!(sub.try_next_batch(), None);
    }

    #[tokio::test]
    async fn cancelled_subscriptions_are_pruned() {
        let log = MemoryLog::new();
        let sub = log.subscribe(&conversation()).await.unwrap();
        assert_eq!(log.live_subscriptions(&conversation()), 1);

        sub.cancel();
        assert_eq!(log.live_subscriptions(&conversation()), 0);

        // Publishing to a cancelled subscriber is harmless
        log.append(&conversation(), legacy("after")).await.unwrap();
        assert_eq!(log.live_subscriptions(&conversation()), 0);
    }

    #[tokio::test]
    async fn resubscribing_without_writes_does_not_accumulate_senders() {
        let log = MemoryLog::new();
        for _ in 0..100 {
            log.subscribe(&conversation()).await.unwrap().cancel();
        }
        let _live = log.subscribe(&conversation()).await.unwrap();

        let inner = log.inner.lock().unwrap();
        assert_eq!(inner.subscribers[&conversation()].len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_single_record() {
        let log = MemoryLog::new();
        let first = log.append(&conversation(), legacy("one")).await.unwrap();
        let second = log.append(&conversation(), legacy("two")).await.unwrap();

        log.delete(&conversation(), &first.id).await.unwrap();

        assert_eq!(log.list_all(&conversation()).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let log = MemoryLog::new();
        let result = log.delete(&conversation(), &RecordId::new("rec-999999")).await;
        assert!(matches!(result, Err(LogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_parent_reports_absence() {
        let log = MemoryLog::new();
        assert!(!log.delete_parent(&conversation()).await.unwrap());

        log.append(&conversation(), legacy("one")).await.unwrap();
        assert!(log.delete_parent(&conversation()).await.unwrap());
        assert!(!log.delete_parent(&conversation()).await.unwrap());
    }
}
