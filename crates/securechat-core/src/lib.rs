//! SecureChat core types
//!
//! Everything the conversation engine and the message log agree on:
//!
//! - [`Identity`] and [`ConversationId`]: who is talking and which log
//!   partition their messages live in
//! - [`RecordDocument`]: the wire shape of a stored record, as loose as the
//!   backing store allows
//! - [`MessageRecord`]: the strict, tagged view of a document (current
//!   encrypted records and legacy plaintext ones)
//! - [`LogEntry`]: a document plus the id and timestamp the log assigned
//! - [`env::Environment`]: source of randomness, swappable for simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod error;
mod identity;
mod record;

pub use error::RecordError;
pub use identity::{CONVERSATION_SEPARATOR, ConversationId, Identity};
pub use record::{
    EncryptedRecord, LegacyRecord, LogEntry, MessageRecord, RecordDocument, RecordId,
    ServerTimestamp,
};
