//! Application layer for SecureChat
//!
//! Pure state machines plus a generic async runtime, so the exact code that
//! runs in production also runs under deterministic simulation.
//!
//! # Components
//!
//! - [`ConversationSession`]: state machine for one user's view of one
//!   conversation (open, switch, close, optimistic send, batch decoding)
//! - [`DeletionCoordinator`]: best-effort removal of a whole conversation
//! - [`Runtime`]: executes session actions against a [`MessageLog`] and owns
//!   the single live subscription
//! - [`Roster`]: partner candidates from the user directory
//!
//! [`MessageLog`]: securechat_log::MessageLog

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod decode;
mod deletion;
mod event;
mod roster;
mod runtime;
mod session;
mod state;
mod system_env;

pub use action::SessionAction;
pub use config::ChatConfig;
pub use decode::{decode_batch, decode_entry};
pub use deletion::{DeletionCoordinator, DeletionIncomplete, DeletionOutcome, DeletionReport};
pub use event::SessionEvent;
pub use roster::{AuthContext, DirectoryEntry, Roster, UserDirectory};
pub use runtime::Runtime;
pub use session::ConversationSession;
pub use state::{DecodedMessage, MessageId, SessionState, SubscriptionId};
pub use system_env::SystemEnv;
