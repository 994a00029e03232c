//! Multi-participant scenarios over one shared log.
//!
//! A [`ChatWorld`] wires several runtimes to the same in-memory log behind a
//! fault-injecting wrapper. [`run_simulation`] drives a seeded random
//! workload through it, checking invariants after every step.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use securechat_app::{ChatConfig, ConversationSession, DeletionIncomplete, DeletionReport, Runtime};
use securechat_core::{ConversationId, Identity};
use securechat_crypto::DECRYPTION_FAILED;
use securechat_log::{ChaoticLog, MemoryLog};
use serde::Serialize;

use crate::{InvariantRegistry, SimEnv, SystemSnapshot, Violation};

/// Log type every participant in a [`ChatWorld`] talks to.
pub type WorldLog = ChaoticLog<MemoryLog>;

/// Several participants sharing one log.
pub struct ChatWorld {
    memory: MemoryLog,
    participants: Vec<Runtime<WorldLog, SimEnv>>,
}

impl ChatWorld {
    /// Create one participant per identity.
    ///
    /// Every log operation fails with probability `failure_rate`.
    /// Participant environments are derived from `seed`, so the whole world
    /// replays identically for the same arguments.
    pub fn new(seed: u64, failure_rate: f64, identities: &[&str]) -> Self {
        let memory = MemoryLog::new();
        let log = ChaoticLog::with_seed(memory.clone(), failure_rate, seed);

        let participants = identities
            .iter()
            .zip(0u64..)
            .map(|(identity, index)| {
                let session = ConversationSession::new(
                    SimEnv::with_seed(seed.wrapping_add(index)),
                    Some(Identity::new(identity)),
                    ChatConfig::default(),
                );
                Runtime::new(log.clone(), session)
            })
            .collect();

        Self { memory, participants }
    }

    /// Fault-free view of the shared log.
    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    /// Participant by index.
    pub fn participant(&self, who: usize) -> &Runtime<WorldLog, SimEnv> {
        &self.participants[who]
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True if the world has no participants.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participant `who` opens the conversation with `partner`.
    pub async fn open(&mut self, who: usize, partner: &str) {
        self.participants[who].open(Identity::new(partner)).await;
    }

    /// Participant `who` closes its conversation.
    pub async fn close(&mut self, who: usize) {
        self.participants[who].close().await;
    }

    /// Participant `who` sends `text`.
    pub async fn send(&mut self, who: usize, text: &str) {
        self.participants[who].send(text).await;
    }

    /// Participant `who` deletes `conversation`.
    pub async fn delete(
        &mut self,
        who: usize,
        conversation: &ConversationId,
    ) -> Result<DeletionReport, DeletionIncomplete> {
        self.participants[who].delete_conversation(conversation).await
    }

    /// Apply every queued batch on every participant.
    pub async fn settle(&mut self) {
        for participant in &mut self.participants {
            participant.drain_ready().await;
        }
    }

    /// Capture the current observable state.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::capture(&self.participants, &self.memory)
    }
}

/// Parameters of a simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Seed for the workload, the environments and fault injection.
    pub seed: u64,
    /// Number of workload steps.
    pub messages: usize,
    /// Probability that any single log operation fails.
    pub failure_rate: f64,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    /// Seed the run used.
    pub seed: u64,
    /// Records stored in the alice/bob conversation before deletion.
    pub stored: usize,
    /// Rendered messages that failed to decrypt.
    pub decrypt_failures: usize,
    /// Records removed by the final deletion.
    pub deleted: usize,
    /// True if the final deletion removed everything.
    pub deletion_complete: bool,
    /// Invariant violations, with the step they were found at.
    pub violations: Vec<String>,
}

const ALICE: usize = 0;
const BOB: usize = 1;
const CAROL: usize = 2;

/// Run a seeded random workload between alice, bob and carol.
///
/// Alice and bob chat while carol switches between them. The run ends with
/// alice deleting the alice/bob conversation.
pub async fn run_simulation(config: SimulationConfig) -> SimulationReport {
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
    let mut world = ChatWorld::new(config.seed, config.failure_rate, &["alice", "bob", "carol"]);
    let standard = InvariantRegistry::standard();
    tracing::debug!(seed = config.seed, invariants = ?standard.names(), "starting simulation");
    let mut report = SimulationReport { seed: config.seed, ..SimulationReport::default() };

    world.open(ALICE, "bob").await;
    world.open(BOB, "alice").await;
    world.open(CAROL, "alice").await;
    world.settle().await;

    for step in 0..config.messages {
        match rng.gen_range(0..10) {
            0..=6 => {
                let who = if rng.gen_bool(0.5) { ALICE } else { BOB };
                world.send(who, &format!("message {step}")).await;
            },
            7 => {
                let partner = if rng.gen_bool(0.5) { "alice" } else { "bob" };
                world.open(CAROL, partner).await;
            },
            8 => world.open(BOB, "alice").await,
            _ => world.close(CAROL).await,
        }

        if rng.gen_bool(0.5) {
            world.settle().await;
        }
        record(&mut report, step, standard.check_all(&world.snapshot()));
    }

    world.settle().await;
    let snapshot = world.snapshot();
    record(&mut report, config.messages, InvariantRegistry::quiescent().check_all(&snapshot));

    report.decrypt_failures = snapshot
        .sessions
        .iter()
        .flat_map(|session| &session.messages)
        .filter(|message| message.text == DECRYPTION_FAILED)
        .count();

    let conversation = ConversationId::from_raw("alice_bob");
    report.stored = world.memory().record_count(&conversation);

    match world.delete(ALICE, &conversation).await {
        Ok(deletion) => {
            report.deleted = deletion.deleted;
            report.deletion_complete = true;
        },
        Err(incomplete) => {
            tracing::warn!(error = %incomplete, "deletion incomplete");
            report.deleted = incomplete.deleted;
        },
    }
    world.settle().await;
    record(&mut report, config.messages + 1, standard.check_all(&world.snapshot()));

    report
}

fn record(report: &mut SimulationReport, step: usize, result: Result<(), Vec<Violation>>) {
    if let Err(violations) = result {
        report.violations.extend(violations.iter().map(|v| format!("step {step}: {v}")));
    }
}
