//! Conversation deletion.
//!
//! The log has no multi-record transactions, so deleting a conversation is
//! a sequence of single-record deletes followed by removal of the parent
//! metadata record. The sequence stops at the first failing record and
//! never undoes what it already removed.

use securechat_core::{ConversationId, RecordId, env::Environment};
use securechat_log::{LogError, MessageLog};
use thiserror::Error;

use crate::{ConversationSession, SessionAction};

/// Outcome of a complete deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    /// Conversation that was deleted.
    pub conversation: ConversationId,
    /// Records removed.
    pub deleted: usize,
    /// True if a parent metadata record existed and was removed.
    pub parent_removed: bool,
}

/// A deletion that stopped before every record was removed.
///
/// Records removed before the failure stay removed.
#[derive(Error, Debug)]
#[error("conversation {conversation} not fully deleted ({deleted} records removed)")]
pub struct DeletionIncomplete {
    /// Conversation being deleted.
    pub conversation: ConversationId,
    /// Records removed before the failure.
    pub deleted: usize,
    /// Records left in the log. `None` if the records could not be listed.
    pub remaining: Option<usize>,
    /// Record whose deletion failed. `None` if listing failed.
    pub failed_record: Option<RecordId>,
    /// Log error that stopped the deletion.
    #[source]
    pub source: LogError,
}

impl DeletionIncomplete {
    /// True if at least one record was removed before the failure.
    pub fn is_partial(&self) -> bool {
        self.deleted > 0
    }

    /// Returns true if retrying the deletion may succeed.
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

/// Deletion result plus the session transition it triggered.
#[derive(Debug)]
pub struct DeletionOutcome {
    /// Aggregate result.
    pub result: Result<DeletionReport, DeletionIncomplete>,
    /// Actions from closing the session, if it was bound to the deleted
    /// conversation. Empty otherwise.
    pub actions: Vec<SessionAction>,
}

/// Deletes whole conversations from a message log.
#[derive(Debug, Clone)]
pub struct DeletionCoordinator<L: MessageLog> {
    log: L,
}

impl<L: MessageLog> DeletionCoordinator<L> {
    /// Create a coordinator over `log`.
    pub fn new(log: L) -> Self {
        Self { log }
    }

    /// Delete every record of `conversation`, then its parent record.
    ///
    /// A missing parent record is not an error. A failure deleting the
    /// parent is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// `DeletionIncomplete` if listing fails or any record delete fails.
    /// Deletion stops at the first failing record.
    pub async fn delete_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Result<DeletionReport, DeletionIncomplete> {
        let entries = self.log.list_all(conversation).await.map_err(|source| {
            tracing::error!(%conversation, error = %source, "listing records for deletion failed");
            DeletionIncomplete {
                conversation: conversation.clone(),
                deleted: 0,
                remaining: None,
                failed_record: None,
                source,
            }
        })?;

        let total = entries.len();
        for (deleted, entry) in entries.into_iter().enumerate() {
            if let Err(source) = self.log.delete(conversation, &entry.id).await {
                tracing::error!(
                    %conversation,
                    record = %entry.id,
                    deleted,
                    total,
                    error = %source,
                    "record deletion failed"
                );
                return Err(DeletionIncomplete {
                    conversation: conversation.clone(),
                    deleted,
                    remaining: Some(total - deleted),
                    failed_record: Some(entry.id),
                    source,
                });
            }
        }

        let parent_removed = match self.log.delete_parent(conversation).await {
            Ok(removed) => removed,
            Err(error) => {
                tracing::warn!(%conversation, %error, "parent record deletion failed");
                false
            },
        };

        tracing::debug!(%conversation, deleted = total, parent_removed, "conversation deleted");
        Ok(DeletionReport { conversation: conversation.clone(), deleted: total, parent_removed })
    }

    /// Delete `conversation` and close `session` if it is bound to it.
    ///
    /// The session is closed after a complete deletion and after a partial
    /// one that removed at least one record.
    pub async fn delete_for_session<E: Environment>(
        &self,
        conversation: &ConversationId,
        session: &mut ConversationSession<E>,
    ) -> DeletionOutcome {
        let result = self.delete_conversation(conversation).await;

        let removed_any = match &result {
            Ok(_) => true,
            Err(incomplete) => incomplete.is_partial(),
        };
        let actions = if removed_any && session.conversation() == Some(conversation) {
            session.close()
        } else {
            vec![]
        };

        DeletionOutcome { result, actions }
    }
}
