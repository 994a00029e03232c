//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what a user could observe at one point in time: the
//! session phase, its bindings, the rendered messages, and how many live
//! subscriptions the log holds. Invariants run against snapshots rather
//! than live state so every check sees the same moment.

use std::collections::BTreeMap;

use securechat_app::{Runtime, SessionState, SubscriptionId};
use securechat_core::{ConversationId, Identity, ServerTimestamp, env::Environment};
use securechat_log::{MemoryLog, MessageLog};

/// Snapshot of every simulated session plus the log's subscriber counts.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-session snapshots.
    pub sessions: Vec<SessionSnapshot>,
    /// Live log subscriptions per conversation some session is bound to.
    pub log_subscriptions: BTreeMap<ConversationId, usize>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no sessions).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture every runtime and the subscriber counts of `log`.
    pub fn capture<L, E>(runtimes: &[Runtime<L, E>], log: &MemoryLog) -> Self
    where
        L: MessageLog,
        E: Environment,
    {
        let sessions: Vec<_> = runtimes.iter().map(SessionSnapshot::from_runtime).collect();
        let log_subscriptions = sessions
            .iter()
            .filter_map(|session| session.conversation.clone())
            .map(|conversation| {
                let live = log.live_subscriptions(&conversation);
                (conversation, live)
            })
            .collect();

        Self { sessions, log_subscriptions }
    }
}

/// Snapshot of one session and the runtime driving it.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Authenticated identity. `None` if signed out.
    pub identity: Option<Identity>,
    /// Session phase.
    pub state: SessionState,
    /// Current partner.
    pub partner: Option<Identity>,
    /// Current conversation.
    pub conversation: Option<ConversationId>,
    /// Subscription the session believes is live.
    pub session_subscription: Option<SubscriptionId>,
    /// Subscription the runtime actually holds.
    pub runtime_subscription: Option<SubscriptionId>,
    /// Rendered messages in display order.
    pub messages: Vec<MessageSnapshot>,
}

impl SessionSnapshot {
    /// Capture a runtime's session.
    pub fn from_runtime<L, E>(runtime: &Runtime<L, E>) -> Self
    where
        L: MessageLog,
        E: Environment,
    {
        let session = runtime.session();
        Self {
            identity: session.self_identity().cloned(),
            state: session.state(),
            partner: session.partner().cloned(),
            conversation: session.conversation().cloned(),
            session_subscription: session.subscription(),
            runtime_subscription: runtime.live_subscription(),
            messages: session
                .messages()
                .iter()
                .map(|message| MessageSnapshot {
                    sender: message.sender.clone(),
                    text: message.text.clone(),
                    timestamp: message.timestamp,
                    local: message.is_local_only(),
                })
                .collect(),
        }
    }

    /// Messages backed by a log record, as `(sender, text)` pairs.
    pub fn stored_history(&self) -> Vec<(&Identity, &str)> {
        self.messages
            .iter()
            .filter(|message| !message.local)
            .map(|message| (&message.sender, message.text.as_str()))
            .collect()
    }
}

/// Snapshot of one rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Author.
    pub sender: Identity,
    /// Rendered text or sentinel.
    pub text: String,
    /// Log order key. `None` for optimistic entries.
    pub timestamp: Option<ServerTimestamp>,
    /// True for an optimistic entry.
    pub local: bool,
}
