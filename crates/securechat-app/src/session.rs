//! Conversation session state machine.
//!
//! One [`ConversationSession`] is one authenticated user's view of at most
//! one conversation at a time. It is a pure state machine: methods and
//! [`ConversationSession::handle`] return [`SessionAction`]s, and the
//! runtime executes them and feeds the outcome back as [`SessionEvent`]s.
//!
//! # State machine
//!
//! ```text
//! Closed --open--> Loading --batch--> Active
//!   ^                 |                  |
//!   |                 +------open--------+--open--> Loading (new partner)
//!   +------close------+------------------+
//! ```
//!
//! # Invariants
//!
//! - At most one live subscription. Every `Subscribe` is preceded by a
//!   `CancelSubscription` for the previous one, if any.
//! - Only batches tagged with the current [`SubscriptionId`] reach
//!   `messages`.
//! - The self identity never changes after construction.

use securechat_core::{ConversationId, EncryptedRecord, Identity, env::Environment};
use securechat_crypto::{NONCE_SIZE, encrypt_text};
use uuid::Builder;

use crate::{
    AuthContext, ChatConfig, DecodedMessage, MessageId, SessionAction, SessionEvent, SessionState,
    SubscriptionId, decode_batch,
};

/// Conversation session state machine.
///
/// # Type Parameters
///
/// - `E`: Environment supplying nonces and local message ids
#[derive(Debug, Clone)]
pub struct ConversationSession<E: Environment> {
    env: E,
    config: ChatConfig,
    /// Authenticated user. `None` if nobody is signed in.
    self_identity: Option<Identity>,
    /// Current partner. `None` while closed.
    partner: Option<Identity>,
    /// Current conversation. `None` while closed.
    conversation: Option<ConversationId>,
    state: SessionState,
    /// Decoded messages, ascending by server timestamp, optimistic entries
    /// appended at the end.
    messages: Vec<DecodedMessage>,
    /// Live subscription. `None` if none is held.
    subscription: Option<SubscriptionId>,
    /// Last issued subscription tag.
    last_subscription: u64,
}

impl<E: Environment> ConversationSession<E> {
    /// Create a closed session for `self_identity`.
    pub fn new(env: E, self_identity: Option<Identity>, config: ChatConfig) -> Self {
        Self {
            env,
            config,
            self_identity: self_identity.filter(|identity| !identity.is_empty()),
            partner: None,
            conversation: None,
            state: SessionState::Closed,
            messages: Vec::new(),
            subscription: None,
            last_subscription: 0,
        }
    }

    /// Create a closed session for whoever `auth` reports as signed in.
    pub fn from_auth(env: E, auth: &impl AuthContext, config: ChatConfig) -> Self {
        Self::new(env, auth.current_identity(), config)
    }

    /// Open the conversation with `partner`.
    ///
    /// Valid from every state; reopening the current partner resubscribes.
    /// Refused (no actions, no state change) without a self identity or
    /// with an empty partner.
    pub fn open(&mut self, partner: Identity) -> Vec<SessionAction> {
        let Some(self_identity) = &self.self_identity else {
            tracing::warn!(%partner, "open refused: no authenticated identity");
            return vec![];
        };
        if partner.is_empty() {
            tracing::warn!("open refused: empty partner");
            return vec![];
        }

        let conversation = ConversationId::between(self_identity, &partner);
        let mut actions = self.release_subscription();

        self.last_subscription += 1;
        let subscription = SubscriptionId::new(self.last_subscription);

        tracing::debug!(%conversation, %subscription, from = ?self.state, "opening conversation");

        self.partner = Some(partner);
        self.conversation = Some(conversation.clone());
        self.messages.clear();
        self.state = SessionState::Loading;
        self.subscription = Some(subscription);

        actions.push(SessionAction::Subscribe { subscription, conversation });
        actions
    }

    /// Close the current conversation. Valid from every state.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let actions = self.release_subscription();

        if self.state != SessionState::Closed {
            tracing::debug!(conversation = ?self.conversation, "closing conversation");
        }

        self.partner = None;
        self.conversation = None;
        self.messages.clear();
        self.state = SessionState::Closed;
        actions
    }

    /// Send `text` to the current partner.
    ///
    /// Only valid while `Active`. Empty or whitespace-only text is refused.
    /// On acceptance an optimistic entry is appended to `messages`
    /// immediately and an `Append` action carries the encrypted record.
    pub fn send(&mut self, text: &str) -> Vec<SessionAction> {
        if self.state != SessionState::Active {
            tracing::debug!(state = ?self.state, "send refused: session not active");
            return vec![];
        }
        if text.trim().is_empty() {
            return vec![];
        }
        let (Some(self_identity), Some(partner), Some(conversation)) =
            (&self.self_identity, &self.partner, &self.conversation)
        else {
            tracing::warn!("send refused: conversation not bound");
            return vec![];
        };

        let text = if self.config.trim_outgoing { text.trim() } else { text };
        let local_id = Builder::from_random_bytes(self.env.random_16()).into_uuid();

        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce);
        let sealed = encrypt_text(text, self_identity.as_str(), partner.as_str(), nonce);

        let record = EncryptedRecord {
            sender: self_identity.clone(),
            receiver: partner.clone(),
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce.to_vec(),
        };
        let action =
            SessionAction::Append { conversation: conversation.clone(), local_id, record };

        self.messages.push(DecodedMessage {
            id: MessageId::Local(local_id),
            sender: self_identity.clone(),
            text: text.to_string(),
            timestamp: None,
        });

        vec![action]
    }

    /// Process an event reported by the runtime.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::BatchDelivered { subscription, entries } => {
                if self.subscription != Some(subscription) {
                    tracing::debug!(%subscription, "discarding batch from stale subscription");
                    return vec![];
                }

                self.messages = decode_batch(&entries, &self.config);
                if self.state == SessionState::Loading {
                    tracing::debug!(conversation = ?self.conversation, "conversation active");
                }
                self.state = SessionState::Active;
                vec![]
            },
            SessionEvent::SubscribeFailed { subscription, reason } => {
                if self.subscription == Some(subscription) {
                    tracing::warn!(%subscription, %reason, "subscribe failed");
                    self.subscription = None;
                }
                vec![]
            },
            SessionEvent::SubscriptionClosed { subscription } => {
                // Messages already shown stay; a later open resubscribes
                if self.subscription == Some(subscription) {
                    tracing::warn!(%subscription, "subscription ended by log");
                    self.subscription = None;
                }
                vec![]
            },
            SessionEvent::AppendAcknowledged { local_id, record } => {
                tracing::debug!(%local_id, %record, "append acknowledged");
                vec![]
            },
            SessionEvent::AppendFailed { local_id, reason } => {
                // Optimistic entry stays as it is
                tracing::error!(%local_id, %reason, "append failed");
                vec![]
            },
        }
    }

    /// Cancel action for the held subscription, if any.
    fn release_subscription(&mut self) -> Vec<SessionAction> {
        self.subscription
            .take()
            .map(|subscription| SessionAction::CancelSubscription { subscription })
            .into_iter()
            .collect()
    }

    /// Current phase.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Authenticated identity. `None` if nobody is signed in.
    pub fn self_identity(&self) -> Option<&Identity> {
        self.self_identity.as_ref()
    }

    /// Current partner. `None` while closed.
    pub fn partner(&self) -> Option<&Identity> {
        self.partner.as_ref()
    }

    /// Current conversation. `None` while closed.
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// Decoded messages in display order.
    pub fn messages(&self) -> &[DecodedMessage] {
        &self.messages
    }

    /// Live subscription tag. `None` if no subscription is held.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }
}
