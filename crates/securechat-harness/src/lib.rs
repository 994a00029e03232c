//! Deterministic simulation harness for SecureChat session testing.
//!
//! Seeded implementations of the Environment trait plus multi-participant
//! scenarios over a shared, fault-injecting log, so every run is
//! reproducible from its seed.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] after every
//! step and [`InvariantRegistry::quiescent()`] once all sessions are drained.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_env;

pub use invariants::{
    ConversationBinding, HistoryConvergence, Invariant, InvariantRegistry, InvariantResult,
    MessageSnapshot, SessionSnapshot, SingleSubscription, SystemSnapshot, TimestampOrdering,
    Violation,
};
pub use scenario::{ChatWorld, SimulationConfig, SimulationReport, WorldLog, run_simulation};
pub use sim_env::SimEnv;
