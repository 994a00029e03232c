//! Fuzz target for the conversation session state machine
//!
//! Applies arbitrary sequences of opens, closes, sends and runtime events,
//! including batches tagged with stale or never-issued subscription ids.
//!
//! # Invariants
//!
//! - The session NEVER panics
//! - Every `Subscribe` is preceded by a cancel of the held subscription
//! - A closed session holds no subscription and no messages
//! - Stale batches never change the message list

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use securechat_app::{
    ChatConfig, ConversationSession, SessionAction, SessionEvent, SessionState, SubscriptionId,
};
use securechat_core::{Identity, LogEntry, RecordDocument, RecordId, ServerTimestamp, env::Environment};
use uuid::Uuid;

#[derive(Clone)]
struct ByteEnv(u8);

impl Environment for ByteEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.0);
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    Open(u8),
    Close,
    Send(String),
    Batch { subscription: u8, messages: Vec<String> },
    SubscribeFailed(u8),
    SubscriptionClosed(u8),
    AppendFailed,
}

const PARTNERS: [&str; 3] = ["bob", "carol", ""];

fuzz_target!(|input: (u8, Vec<Op>)| {
    let (seed, ops) = input;
    let mut session =
        ConversationSession::new(ByteEnv(seed), Some(Identity::new("alice")), ChatConfig::default());

    for op in ops {
        let held = session.subscription();
        let before = session.messages().to_vec();

        let actions = match op {
            Op::Open(partner) => {
                session.open(Identity::new(PARTNERS[usize::from(partner) % PARTNERS.len()]))
            },
            Op::Close => session.close(),
            Op::Send(text) => session.send(&text),
            Op::Batch { subscription, messages } => {
                let subscription = SubscriptionId::new(u64::from(subscription));
                let entries = messages
                    .into_iter()
                    .zip(1u64..)
                    .map(|(message, n)| LogEntry {
                        id: RecordId::new(n.to_string()),
                        timestamp: ServerTimestamp::new(n),
                        document: RecordDocument {
                            sender: Some("bob".to_string()),
                            message: Some(message),
                            ..RecordDocument::default()
                        },
                    })
                    .collect();
                let stale = Some(subscription) != held;
                let actions = session.handle(SessionEvent::BatchDelivered { subscription, entries });
                if stale {
                    assert_eq!(session.messages(), before.as_slice());
                }
                actions
            },
            Op::SubscribeFailed(subscription) => session.handle(SessionEvent::SubscribeFailed {
                subscription: SubscriptionId::new(u64::from(subscription)),
                reason: "fuzz".to_string(),
            }),
            Op::SubscriptionClosed(subscription) => session.handle(SessionEvent::SubscriptionClosed {
                subscription: SubscriptionId::new(u64::from(subscription)),
            }),
            Op::AppendFailed => session.handle(SessionEvent::AppendFailed {
                local_id: Uuid::nil(),
                reason: "fuzz".to_string(),
            }),
        };

        let mut live = held;
        for action in &actions {
            match action {
                SessionAction::CancelSubscription { subscription } => {
                    assert_eq!(live, Some(*subscription));
                    live = None;
                },
                SessionAction::Subscribe { subscription, .. } => {
                    assert_eq!(live, None);
                    live = Some(*subscription);
                },
                SessionAction::Append { .. } => {},
            }
        }

        if session.state() == SessionState::Closed {
            assert_eq!(session.subscription(), None);
            assert!(session.messages().is_empty());
        }
    }
});
