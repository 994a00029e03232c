//! Concrete checks over subscription handles, message order, conversation
//! binding and cross-session history.

use std::collections::BTreeMap;

use securechat_app::SessionState;
use securechat_core::ConversationId;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// A session holds at most one live subscription, and only while open.
///
/// The runtime's handle matches the session's tag, a closed session holds
/// none, and the log never has more live subscriptions for a conversation
/// than there are sessions bound to it.
pub struct SingleSubscription;

impl Invariant for SingleSubscription {
    fn name(&self) -> &'static str {
        "single_subscription"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut bound: BTreeMap<&ConversationId, usize> = BTreeMap::new();

        for (index, session) in state.sessions.iter().enumerate() {
            if session.session_subscription != session.runtime_subscription {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "session {index}: session holds {:?}, runtime holds {:?}",
                        session.session_subscription, session.runtime_subscription
                    ),
                });
            }
            if session.state == SessionState::Closed && session.runtime_subscription.is_some() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("session {index}: closed but subscribed"),
                });
            }
            if let Some(conversation) = &session.conversation {
                *bound.entry(conversation).or_default() += 1;
            }
        }

        for (conversation, live) in &state.log_subscriptions {
            let sessions = bound.get(conversation).copied().unwrap_or(0);
            if *live > sessions {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "conversation {conversation}: {live} live subscriptions for {sessions} sessions"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Stored messages are in non-decreasing timestamp order, and optimistic
/// entries only follow them.
pub struct TimestampOrdering;

impl Invariant for TimestampOrdering {
    fn name(&self) -> &'static str {
        "timestamp_ordering"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (index, session) in state.sessions.iter().enumerate() {
            for pair in session.messages.windows(2) {
                let ordered = match (pair[0].timestamp, pair[1].timestamp) {
                    (Some(a), Some(b)) => a <= b,
                    (None, Some(_)) => false,
                    _ => true,
                };
                if !ordered {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "session {index}: {:?} rendered before {:?}",
                            pair[0].timestamp, pair[1].timestamp
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A session's conversation is the one shared with its partner, and exists
/// exactly while the session is open.
pub struct ConversationBinding;

impl Invariant for ConversationBinding {
    fn name(&self) -> &'static str {
        "conversation_binding"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (index, session) in state.sessions.iter().enumerate() {
            let violation = |message: String| Violation { invariant: self.name(), message };

            match (&session.identity, &session.partner, &session.conversation) {
                (_, None, None) if session.state == SessionState::Closed => {
                    if !session.messages.is_empty() {
                        return Err(violation(format!("session {index}: closed with messages")));
                    }
                },
                (Some(me), Some(partner), Some(conversation))
                    if session.state != SessionState::Closed =>
                {
                    let expected = ConversationId::between(me, partner);
                    if conversation != &expected {
                        return Err(violation(format!(
                            "session {index}: bound to {conversation}, expected {expected}"
                        )));
                    }
                },
                _ => {
                    return Err(violation(format!(
                        "session {index}: state {:?} with partner {:?} and conversation {:?}",
                        session.state, session.partner, session.conversation
                    )));
                },
            }
        }
        Ok(())
    }
}

/// Active sessions on the same conversation render the same stored history.
///
/// Only meaningful once every subscription has been drained.
pub struct HistoryConvergence;

impl Invariant for HistoryConvergence {
    fn name(&self) -> &'static str {
        "history_convergence"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut by_conversation = BTreeMap::new();

        for (index, session) in state.sessions.iter().enumerate() {
            let Some(conversation) = &session.conversation else {
                continue;
            };
            if session.state != SessionState::Active {
                continue;
            }

            let history = session.stored_history();
            match by_conversation.get(conversation) {
                None => {
                    by_conversation.insert(conversation, (index, history));
                },
                Some((first, expected)) if expected != &history => {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "conversation {conversation}: session {first} sees {} messages, \
                             session {index} sees {}",
                            expected.len(),
                            history.len()
                        ),
                    });
                },
                Some(_) => {},
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use securechat_app::SubscriptionId;
    use securechat_core::{Identity, ServerTimestamp};

    use super::*;
    use crate::invariants::{MessageSnapshot, SessionSnapshot};

    fn active(me: &str, partner: &str) -> SessionSnapshot {
        let me = Identity::new(me);
        let partner = Identity::new(partner);
        SessionSnapshot {
            conversation: Some(ConversationId::between(&me, &partner)),
            identity: Some(me),
            partner: Some(partner),
            state: SessionState::Active,
            session_subscription: Some(SubscriptionId::new(1)),
            runtime_subscription: Some(SubscriptionId::new(1)),
            messages: vec![],
        }
    }

    fn message(text: &str, timestamp: Option<u64>) -> MessageSnapshot {
        MessageSnapshot {
            sender: Identity::new("alice"),
            text: text.to_string(),
            timestamp: timestamp.map(ServerTimestamp::new),
            local: timestamp.is_none(),
        }
    }

    fn snapshot(sessions: Vec<SessionSnapshot>) -> SystemSnapshot {
        SystemSnapshot { sessions, ..SystemSnapshot::default() }
    }

    #[test]
    fn mismatched_handles_violate_single_subscription() {
        let mut session = active("alice", "bob");
        session.runtime_subscription = Some(SubscriptionId::new(2));

        assert!(SingleSubscription.check(&snapshot(vec![session])).is_err());
    }

    #[test]
    fn extra_log_subscriptions_are_detected() {
        let mut state = snapshot(vec![active("alice", "bob")]);
        state.log_subscriptions.insert(ConversationId::from_raw("alice_bob"), 2);

        assert!(SingleSubscription.check(&state).is_err());
    }

    #[test]
    fn optimistic_entries_may_trail_stored_ones() {
        let mut session = active("alice", "bob");
        session.messages = vec![message("a", Some(1)), message("b", Some(2)), message("c", None)];

        assert!(TimestampOrdering.check(&snapshot(vec![session])).is_ok());
    }

    #[test]
    fn out_of_order_messages_are_detected() {
        let mut session = active("alice", "bob");
        session.messages = vec![message("b", Some(2)), message("a", Some(1))];

        assert!(TimestampOrdering.check(&snapshot(vec![session])).is_err());
    }

    #[test]
    fn wrong_conversation_is_detected() {
        let mut session = active("alice", "bob");
        session.conversation = Some(ConversationId::from_raw("alice_carol"));

        assert!(ConversationBinding.check(&snapshot(vec![session])).is_err());
    }

    #[test]
    fn closed_session_must_be_unbound() {
        let mut session = active("alice", "bob");
        session.state = SessionState::Closed;

        assert!(ConversationBinding.check(&snapshot(vec![session])).is_err());
    }

    #[test]
    fn diverging_histories_are_detected() {
        let mut alice = active("alice", "bob");
        let mut bob = active("bob", "alice");
        alice.messages = vec![message("hi", Some(1))];
        bob.messages = vec![];

        assert!(HistoryConvergence.check(&snapshot(vec![alice.clone(), bob.clone()])).is_err());

        bob.messages = alice.messages.clone();
        assert!(HistoryConvergence.check(&snapshot(vec![alice, bob])).is_ok());
    }
}
