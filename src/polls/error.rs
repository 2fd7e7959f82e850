//! Poll lifecycle errors

use super::catalog::CatalogError;
use super::store::StoreError;
use crate::channels::{ChatError, MessageRef};

/// Errors raised while opening or closing a poll.
///
/// Unknown poll names and ids are not errors; the announcer and closer
/// report them as ordinary outcomes.
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Posting failed after some messages for the poll were already posted.
    /// No instance record exists for them; they need manual cleanup.
    #[error("{source} (poll {poll_id} left partly announced, {} message(s) posted)", .posted.len())]
    PartialAnnouncement {
        poll_id: String,
        posted: Vec<MessageRef>,
        source: ChatError,
    },

    /// Every message was posted but the instance record could not be
    /// written, so the poll cannot be closed.
    #[error("{source} (poll {poll_id} left partly announced, {} message(s) posted)", .posted.len())]
    Unrecorded {
        poll_id: String,
        posted: Vec<MessageRef>,
        source: StoreError,
    },

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
}

impl VoteError {
    /// Whether the failure came from the chat platform
    pub fn is_chat_platform(&self) -> bool {
        matches!(
            self,
            VoteError::Chat(_) | VoteError::PartialAnnouncement { .. }
        )
    }
}
