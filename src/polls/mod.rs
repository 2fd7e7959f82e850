//! Polling Module
//!
//! Reaction polls: a catalog of voteable topics, the open/close lifecycle
//! and the store of currently open polls.

pub mod announcer;
pub mod catalog;
pub mod claims;
pub mod closer;
pub mod error;
pub mod store;
pub mod tally;

pub use announcer::{poll_id, OpenOutcome, PollAnnouncer, DEFAULT_POST_INTERVAL};
pub use catalog::{
    CatalogError, FileCatalog, OptionCatalog, PollDefinition, StaticCatalog, DEFAULT_MARKER_EMOJI,
};
pub use closer::{CloseOutcome, PollCloser};
pub use error::VoteError;
pub use store::{
    FileInstanceStore, MemoryInstanceStore, PollInstance, PollInstanceStore, StoreError,
};
pub use tally::{format_results, short_name, TallyResult, BOT_MARKER_VOTE_OFFSET};
