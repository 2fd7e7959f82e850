//! Poll Closer
//!
//! Closes a poll: reads back the reactions on every option message, posts
//! the ranked tally and retires the instance record.

use super::claims::InFlight;
use super::error::VoteError;
use super::store::PollInstanceStore;
use super::tally::{format_results, TallyResult};
use crate::channels::{DynChatClient, MessageRef};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a close request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Results posted and record deleted
    Closed {
        tally: TallyResult,
        results: MessageRef,
    },
    /// No open poll has this id
    NotOpen(String),
}

impl CloseOutcome {
    /// Text for the requester; the posted results are the output of a
    /// successful close
    pub fn reply_text(&self) -> Option<String> {
        match self {
            CloseOutcome::Closed { .. } => None,
            CloseOutcome::NotOpen(id) => Some(format!("{} is not an open vote", id)),
        }
    }
}

/// Closes open polls
pub struct PollCloser {
    store: Arc<dyn PollInstanceStore>,
    chat: DynChatClient,
    in_flight: InFlight,
}

impl PollCloser {
    pub fn new(store: Arc<dyn PollInstanceStore>, chat: DynChatClient) -> Self {
        Self {
            store,
            chat,
            in_flight: InFlight::new(),
        }
    }

    /// Close `poll_id`, posting the results to `channel`.
    ///
    /// The record is deleted only after every option was read and the
    /// results were posted; any failure before that leaves the poll open so
    /// the close can be repeated. A close that overlaps another close of the
    /// same id is answered with `NotOpen`.
    pub async fn close(
        &self,
        poll_id: &str,
        user: &str,
        channel: &str,
    ) -> Result<CloseOutcome, VoteError> {
        let Some(_claim) = self.in_flight.claim(poll_id) else {
            info!(poll_id = %poll_id, "Close already in progress");
            return Ok(CloseOutcome::NotOpen(poll_id.to_string()));
        };

        debug!(poll_id = %poll_id, "Looking up poll");
        let instance = match self.store.get(poll_id).await? {
            Some(instance) => instance,
            None => {
                info!(poll_id = %poll_id, "Close requested for poll that is not open");
                return Ok(CloseOutcome::NotOpen(poll_id.to_string()));
            }
        };

        let mut tally = TallyResult::new();
        for message in &instance.option_messages {
            let read = self.chat.get_reactions(message).await?;
            tally.record_message(&read);
        }

        let text = format_results(user, &instance.id, &tally);
        let results = self.chat.post_message(channel, &text).await?;

        if !self.store.delete(&instance.id).await? {
            warn!(poll_id = %instance.id, "Poll record was already gone when closing");
        }

        info!(poll_id = %instance.id, total = tally.total(), "Poll closed");
        Ok(CloseOutcome::Closed { tally, results })
    }
}
