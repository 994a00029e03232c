//! Partner selection.
//!
//! The user directory and the authentication context are owned elsewhere.
//! This module only consumes them: it lists everyone in the directory except
//! the signed-in user.

use std::collections::HashSet;

use securechat_core::{ConversationId, Identity};

/// Source of the currently authenticated identity.
pub trait AuthContext {
    /// Signed-in identity. `None` if nobody is signed in.
    fn current_identity(&self) -> Option<Identity>;
}

impl AuthContext for Identity {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

impl AuthContext for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        self.clone()
    }
}

/// One known user, as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Registered identity.
    pub identity: Identity,
    /// Encoded profile image. `None` if the user has none.
    pub avatar: Option<Vec<u8>>,
}

/// Source of known identities.
pub trait UserDirectory {
    /// Every registered user, in directory order.
    fn entries(&self) -> Vec<DirectoryEntry>;
}

impl UserDirectory for Vec<DirectoryEntry> {
    fn entries(&self) -> Vec<DirectoryEntry> {
        self.clone()
    }
}

/// Partner candidates for the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    self_identity: Option<Identity>,
    candidates: Vec<DirectoryEntry>,
}

impl Roster {
    /// Empty roster for whoever `auth` reports as signed in.
    pub fn new(auth: &impl AuthContext) -> Self {
        Self { self_identity: auth.current_identity(), candidates: Vec::new() }
    }

    /// Replace the candidate list with a fresh directory listing.
    ///
    /// Keeps directory order, drops the signed-in user and later duplicates
    /// of an identity.
    pub fn refresh(&mut self, directory: &impl UserDirectory) {
        self.set_entries(directory.entries());
    }

    /// Replace the candidate list with `entries`. Same filtering as
    /// [`Roster::refresh`].
    pub fn set_entries(&mut self, entries: impl IntoIterator<Item = DirectoryEntry>) {
        let mut seen = HashSet::new();
        self.candidates = entries
            .into_iter()
            .filter(|entry| Some(&entry.identity) != self.self_identity.as_ref())
            .filter(|entry| seen.insert(entry.identity.clone()))
            .collect();
    }

    /// Candidates in directory order.
    pub fn candidates(&self) -> &[DirectoryEntry] {
        &self.candidates
    }

    /// Avatar of a candidate. `None` if unknown or without avatar.
    pub fn avatar(&self, identity: &Identity) -> Option<&[u8]> {
        self.candidates
            .iter()
            .find(|entry| &entry.identity == identity)
            .and_then(|entry| entry.avatar.as_deref())
    }

    /// Conversation between the signed-in user and `partner`.
    ///
    /// `None` if nobody is signed in.
    pub fn conversation_with(&self, partner: &Identity) -> Option<ConversationId> {
        self.self_identity.as_ref().map(|me| ConversationId::between(me, partner))
    }
}
