//! Generic runtime for session orchestration.
//!
//! The Runtime executes [`SessionAction`]s against a [`MessageLog`] and feeds
//! the outcomes back to the [`ConversationSession`] as [`SessionEvent`]s. It
//! owns the single live [`Subscription`] handle.

use std::collections::VecDeque;

use securechat_core::{ConversationId, Identity, LogEntry, env::Environment};
use securechat_log::{MessageLog, Subscription};

use crate::{
    ConversationSession, DeletionCoordinator, DeletionIncomplete, DeletionReport, SessionAction,
    SessionEvent, SubscriptionId,
};

/// Generic runtime that drives a session against a message log.
///
/// # Type Parameters
///
/// - `L`: Message log backend
/// - `E`: Environment for nonces and local ids
pub struct Runtime<L, E>
where
    L: MessageLog,
    E: Environment,
{
    log: L,
    session: ConversationSession<E>,
    coordinator: DeletionCoordinator<L>,
    /// Live subscription and the tag its batches carry.
    live: Option<(SubscriptionId, Subscription)>,
}

impl<L, E> Runtime<L, E>
where
    L: MessageLog,
    E: Environment,
{
    /// Create a runtime driving `session` against `log`.
    pub fn new(log: L, session: ConversationSession<E>) -> Self {
        let coordinator = DeletionCoordinator::new(log.clone());
        Self { log, session, coordinator, live: None }
    }

    /// Open the conversation with `partner` and subscribe to it.
    pub async fn open(&mut self, partner: Identity) {
        let actions = self.session.open(partner);
        self.execute(actions).await;
    }

    /// Close the current conversation.
    pub async fn close(&mut self) {
        let actions = self.session.close();
        self.execute(actions).await;
    }

    /// Send `text` in the current conversation.
    ///
    /// Returns once the log acknowledged or rejected the append. Rejection
    /// is logged; the optimistic entry stays.
    pub async fn send(&mut self, text: &str) {
        let actions = self.session.send(text);
        self.execute(actions).await;
    }

    /// Delete `conversation`, closing the session if it is bound to it.
    ///
    /// # Errors
    ///
    /// `DeletionIncomplete` if any record could not be deleted.
    pub async fn delete_conversation(
        &mut self,
        conversation: &ConversationId,
    ) -> Result<DeletionReport, DeletionIncomplete> {
        let outcome = self.coordinator.delete_for_session(conversation, &mut self.session).await;
        self.execute(outcome.actions).await;
        outcome.result
    }

    /// Wait for the next batch on the live subscription and apply it.
    ///
    /// Returns `false` without waiting if there is no live subscription, or
    /// once the log closed it.
    pub async fn next_batch(&mut self) -> bool {
        let Some((subscription, handle)) = self.live.as_mut() else {
            return false;
        };
        let subscription = *subscription;
        let batch = handle.next_batch().await;

        match batch {
            Some(entries) => {
                self.deliver(subscription, entries).await;
                true
            },
            None => {
                tracing::warn!(%subscription, "subscription closed by log");
                self.live = None;
                let actions = self.session.handle(SessionEvent::SubscriptionClosed { subscription });
                self.execute(actions).await;
                false
            },
        }
    }

    /// Apply every batch already queued on the live subscription.
    ///
    /// Returns the number of batches applied.
    pub async fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some((subscription, handle)) = self.live.as_mut() else {
                return applied;
            };
            let subscription = *subscription;
            let Some(entries) = handle.try_next_batch() else {
                return applied;
            };

            self.deliver(subscription, entries).await;
            applied += 1;
        }
    }

    async fn deliver(&mut self, subscription: SubscriptionId, entries: Vec<LogEntry>) {
        let actions = self.session.handle(SessionEvent::BatchDelivered { subscription, entries });
        self.execute(actions).await;
    }

    /// Execute actions in order, including those produced while handling
    /// their outcomes.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut pending: VecDeque<_> = actions.into();

        while let Some(action) = pending.pop_front() {
            let events = match action {
                SessionAction::CancelSubscription { subscription } => {
                    self.cancel(subscription);
                    vec![]
                },
                SessionAction::Subscribe { subscription, conversation } => {
                    self.subscribe(subscription, &conversation).await
                },
                SessionAction::Append { conversation, local_id, record } => {
                    match self.log.append(&conversation, record.to_document()).await {
                        Ok(entry) => {
                            vec![SessionEvent::AppendAcknowledged { local_id, record: entry.id }]
                        },
                        Err(error) => {
                            vec![SessionEvent::AppendFailed { local_id, reason: error.to_string() }]
                        },
                    }
                },
            };

            for event in events {
                pending.extend(self.session.handle(event));
            }
        }
    }

    fn cancel(&mut self, subscription: SubscriptionId) {
        match self.live.take() {
            Some((live, handle)) if live == subscription => handle.cancel(),
            Some(other) => {
                tracing::warn!(%subscription, live = %other.0, "cancel for unknown subscription");
                self.live = Some(other);
            },
            None => {},
        }
    }

    async fn subscribe(
        &mut self,
        subscription: SubscriptionId,
        conversation: &ConversationId,
    ) -> Vec<SessionEvent> {
        // Never hold two handles, even if the session skipped a cancel
        if let Some((stale, handle)) = self.live.take() {
            tracing::warn!(%stale, "replacing subscription that was not cancelled");
            handle.cancel();
        }

        match self.log.subscribe(conversation).await {
            Ok(handle) => {
                self.live = Some((subscription, handle));
                vec![]
            },
            Err(error) => {
                vec![SessionEvent::SubscribeFailed { subscription, reason: error.to_string() }]
            },
        }
    }

    /// Session state machine.
    pub fn session(&self) -> &ConversationSession<E> {
        &self.session
    }

    /// Tag of the live subscription. `None` if none is held.
    pub fn live_subscription(&self) -> Option<SubscriptionId> {
        self.live.as_ref().map(|(subscription, _)| *subscription)
    }
}
