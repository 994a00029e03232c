//! Identities and conversation ids.
//!
//! An [`Identity`] is an opaque, lowercased user handle. A [`ConversationId`]
//! names the log partition shared by exactly one unordered pair of
//! identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the two sorted identities in a [`ConversationId`].
///
/// Identities are assumed not to contain it; if they do, two distinct pairs
/// can map to the same conversation.
pub const CONVERSATION_SEPARATOR: char = '_';

/// Normalized user handle.
///
/// [`Identity::new`] trims and lowercases its input. Deserialization keeps
/// the stored value verbatim, since records in the log were written by
/// clients that already normalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a normalized identity.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// Wrap a value read from storage without normalizing it.
    pub fn verbatim(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identity. No key can be trusted for it.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical id of the conversation between two identities.
///
/// `ConversationId::between(a, b) == ConversationId::between(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Compute the id for the unordered pair `(a, b)`.
    ///
    /// Sorts the pair and joins it with [`CONVERSATION_SEPARATOR`].
    pub fn between(a: &Identity, b: &Identity) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{first}{CONVERSATION_SEPARATOR}{second}"))
    }

    /// Wrap an id received from outside (a log key, a UI selection).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
