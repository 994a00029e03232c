//! Chaotic log wrapper for fault injection testing
//!
//! Delegates to another [`MessageLog`] and fails operations either at a
//! seeded random rate or at one chosen delete call. Used to drive partial
//! conversation deletion and subscription failures deterministically.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use securechat_core::{ConversationId, LogEntry, RecordDocument, RecordId};

use super::{LogError, MessageLog, Subscription};

const INJECTED: &str = "chaotic failure injection";

/// Log wrapper that injects failures
///
/// Clones share RNG state and counters, so a wrapper handed to several
/// components fails a single, reproducible sequence of operations.
#[derive(Clone)]
pub struct ChaoticLog<L: MessageLog> {
    inner: L,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// 1-based index of the single delete call to fail, if any
    failing_delete: Option<usize>,
    rng: Arc<Mutex<ChaoticRng>>,
    counters: Arc<Mutex<Counters>>,
}

#[derive(Default)]
struct Counters {
    operations: usize,
    deletes: usize,
}

/// Linear congruential generator, reproducible from the seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<L: MessageLog> ChaoticLog<L> {
    /// Wrap `inner`, failing each operation with probability `failure_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: L, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Same as [`ChaoticLog::new`] with an explicit seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: L, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            failing_delete: None,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    /// Wrap `inner` so that only the `n`th delete call (1-based) fails.
    pub fn failing_nth_delete(inner: L, n: usize) -> Self {
        let mut log = Self::with_seed(inner, 0.0, 0);
        log.failing_delete = Some(n);
        log
    }

    /// Underlying log (for checking state after chaos).
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Total number of log operations attempted.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        self.counters.lock().expect("counters mutex poisoned").operations
    }

    /// Count an operation and decide whether it fails.
    fn inject(&self, is_delete: bool) -> Result<(), LogError> {
        #[allow(clippy::expect_used)]
        let mut counters = self.counters.lock().expect("counters mutex poisoned");
        counters.operations += 1;

        if is_delete {
            counters.deletes += 1;
            if self.failing_delete == Some(counters.deletes) {
                tracing::debug!(delete = counters.deletes, "injecting delete failure");
                return Err(LogError::Io(INJECTED.to_string()));
            }
        }
        drop(counters);

        #[allow(clippy::expect_used)]
        let fail = self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate);
        if fail {
            return Err(LogError::Io(INJECTED.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<L: MessageLog> MessageLog for ChaoticLog<L> {
    async fn append(
        &self,
        conversation: &ConversationId,
        document: RecordDocument,
    ) -> Result<LogEntry, LogError> {
        self.inject(false)?;
        self.inner.append(conversation, document).await
    }

    async fn subscribe(&self, conversation: &ConversationId) -> Result<Subscription, LogError> {
        self.inject(false)?;
        self.inner.subscribe(conversation).await
    }

    async fn list_all(&self, conversation: &ConversationId) -> Result<Vec<LogEntry>, LogError> {
        self.inject(false)?;
        self.inner.list_all(conversation).await
    }

    async fn delete(
        &self,
        conversation: &ConversationId,
        record: &RecordId,
    ) -> Result<(), LogError> {
        self.inject(true)?;
        self.inner.delete(conversation, record).await
    }

    async fn delete_parent(&self, conversation: &ConversationId) -> Result<bool, LogError> {
        self.inject(false)?;
        self.inner.delete_parent(conversation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLog;

    fn conversation() -> ConversationId {
        ConversationId::from_raw("alice_bob")
    }

    fn document() -> RecordDocument {
        RecordDocument { message: Some("hello".to_string()), ..RecordDocument::default() }
    }

    #[tokio::test]
    async fn zero_rate_never_fails() {
        let log = ChaoticLog::new(MemoryLog::new(), 0.0);
        for _ in 0..50 {
            log.append(&conversation(), document()).await.unwrap();
        }
        assert_eq!(log.inner().record_count(&conversation()), 50);
        assert_eq!(log.operation_count(), 50);
    }

    #[tokio::test]
    async fn full_rate_always_fails() {
        let log = ChaoticLog::new(MemoryLog::new(), 1.0);
        let result = log.append(&conversation(), document()).await;
        assert!(matches!(result, Err(LogError::Io(_))));
        assert_eq!(log.inner().record_count(&conversation()), 0);
    }

    #[tokio::test]
    async fn same_seed_fails_same_operations() {
        let a = ChaoticLog::with_seed(MemoryLog::new(), 0.5, 42);
        let b = ChaoticLog::with_seed(MemoryLog::new(), 0.5, 42);

        for _ in 0..20 {
            let ra = a.append(&conversation(), document()).await.is_ok();
            let rb = b.append(&conversation(), document()).await.is_ok();
            assert_eq!(ra, rb);
        }
    }

    #[tokio::test]
    async fn only_the_nth_delete_fails() {
        let log = ChaoticLog::failing_nth_delete(MemoryLog::new(), 2);
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(log.append(&conversation(), document()).await.unwrap().id);
        }

        assert!(log.delete(&conversation(), &ids[0]).await.is_ok());
        assert!(matches!(log.delete(&conversation(), &ids[1]).await, Err(LogError::Io(_))));
        assert!(log.delete(&conversation(), &ids[1]).await.is_ok());
        assert!(log.delete(&conversation(), &ids[2]).await.is_ok());
        assert_eq!(log.inner().record_count(&conversation()), 0);
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn rejects_out_of_range_rate() {
        let _ = ChaoticLog::new(MemoryLog::new(), 1.5);
    }
}
