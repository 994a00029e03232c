//! Cross-session invariants for chat simulations.
//!
//! A [`SystemSnapshot`] freezes every simulated session, the subscription
//! handle its runtime holds, and the log's live subscriber counts. Each
//! [`Invariant`] inspects one snapshot and reports the first broken rule.
//!
//! Two registries exist because message history only converges once every
//! queued batch has been applied: [`InvariantRegistry::standard`] is safe
//! mid-run, [`InvariantRegistry::quiescent`] after the world has settled.
//!
//! ```ignore
//! let snapshot = SystemSnapshot::capture(&runtimes, &log);
//! InvariantRegistry::standard().check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{ConversationBinding, HistoryConvergence, SingleSubscription, TimestampOrdering};
pub use snapshot::{MessageSnapshot, SessionSnapshot, SystemSnapshot};

/// Outcome of a single invariant check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant and what the snapshot showed.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Invariant that failed.
    pub invariant: &'static str,
    /// Offending session or conversation.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Rule over a [`SystemSnapshot`].
pub trait Invariant: Send + Sync {
    /// Stable snake_case name, reported in [`Violation::invariant`].
    fn name(&self) -> &'static str;

    /// `Err` with the first offending session or conversation.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of invariants run against each snapshot.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Checks valid between any two simulation steps: subscription
    /// bookkeeping, message order and conversation binding.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleSubscription);
        registry.add(TimestampOrdering);
        registry.add(ConversationBinding);
        registry
    }

    /// [`InvariantRegistry::standard`] plus history convergence between the
    /// two sides of each open conversation.
    pub fn quiescent() -> Self {
        let mut registry = Self::standard();
        registry.add(HistoryConvergence);
        registry
    }

    /// Register another check. Checks run in registration order.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check. `Err` carries one violation per failing invariant.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Panic listing every violation, labelled with `context`.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Names of the registered checks, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|invariant| invariant.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use securechat_app::{SessionState, SubscriptionId};
    use securechat_core::{ConversationId, Identity};

    use super::*;

    fn active_session() -> SessionSnapshot {
        let subscription = Some(SubscriptionId::new(1));
        SessionSnapshot {
            identity: Some(Identity::new("alice")),
            state: SessionState::Active,
            partner: Some(Identity::new("bob")),
            conversation: Some(ConversationId::from_raw("alice_bob")),
            session_subscription: subscription,
            runtime_subscription: subscription,
            messages: Vec::new(),
        }
    }

    #[test]
    fn quiescent_extends_standard() {
        assert_eq!(
            InvariantRegistry::standard().names(),
            ["single_subscription", "timestamp_ordering", "conversation_binding"]
        );
        assert_eq!(
            InvariantRegistry::quiescent().names().last(),
            Some(&"history_convergence")
        );
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::quiescent();
        let snapshot = SystemSnapshot::empty();
        assert!(registry.check_all(&snapshot).is_ok());
    }

    #[test]
    fn session_holding_a_handle_the_runtime_lost_is_flagged() {
        let mut session = active_session();
        session.runtime_subscription = None;
        let snapshot = SystemSnapshot { sessions: vec![session], ..SystemSnapshot::empty() };

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invariant, "single_subscription");
    }
}
