//! Poll Announcer
//!
//! Opens a poll: posts the announcement, one message per option with the
//! marker reaction attached, then records the poll instance.

use super::catalog::OptionCatalog;
use super::claims::InFlight;
use super::error::VoteError;
use super::store::{PollInstance, PollInstanceStore, StoreError};
use crate::channels::{DynChatClient, MessageRef};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default pause between option posts, keeps bursts under the platform's
/// posting rate limit
pub const DEFAULT_POST_INTERVAL: Duration = Duration::from_millis(500);

/// Timestamp layout used in poll ids; sorts the same as chronological order
const POLL_ID_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Build the id of a poll opened at `opened_at`
pub fn poll_id(poll_name: &str, opened_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        poll_name,
        opened_at.format(POLL_ID_TIMESTAMP_FORMAT)
    )
}

/// Result of an open request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Poll announced and recorded
    Opened(PollInstance),
    /// The name is not in the catalog
    UnknownPoll(String),
    /// A poll with the same id is already open
    AlreadyOpen(String),
}

impl OpenOutcome {
    /// Text for the requester; the announcement itself is the output of a
    /// successful open
    pub fn reply_text(&self) -> Option<String> {
        match self {
            OpenOutcome::Opened(_) => None,
            OpenOutcome::UnknownPoll(name) => Some(format!("{} is not a valid selection", name)),
            OpenOutcome::AlreadyOpen(id) => Some(format!(
                "{} is already open, wait a second and try again",
                id
            )),
        }
    }
}

/// Opens polls from catalog definitions
pub struct PollAnnouncer {
    catalog: Arc<dyn OptionCatalog>,
    store: Arc<dyn PollInstanceStore>,
    chat: DynChatClient,
    post_interval: Duration,
    clock: fn() -> DateTime<Utc>,
    in_flight: InFlight,
}

impl PollAnnouncer {
    pub fn new(
        catalog: Arc<dyn OptionCatalog>,
        store: Arc<dyn PollInstanceStore>,
        chat: DynChatClient,
    ) -> Self {
        Self {
            catalog,
            store,
            chat,
            post_interval: DEFAULT_POST_INTERVAL,
            clock: Utc::now,
            in_flight: InFlight::new(),
        }
    }

    /// Set the pause between option posts
    pub fn with_post_interval(mut self, interval: Duration) -> Self {
        self.post_interval = interval;
        self
    }

    /// Replace the clock used to stamp poll ids
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Open `poll_name` in `channel` on behalf of `user`
    pub async fn open(
        &self,
        poll_name: &str,
        user: &str,
        channel: &str,
    ) -> Result<OpenOutcome, VoteError> {
        let definition = match self.catalog.lookup(poll_name).await? {
            Some(def) => def,
            None => {
                info!(poll = %poll_name, "Open requested for unknown poll");
                return Ok(OpenOutcome::UnknownPoll(poll_name.to_string()));
            }
        };
        debug!(poll = %poll_name, options = definition.options.len(), emoji = %definition.marker_emoji, "Retrieved poll definition");

        let id = poll_id(poll_name, (self.clock)());
        let Some(_claim) = self.in_flight.claim(&id) else {
            info!(poll_id = %id, "Poll is already being opened");
            return Ok(OpenOutcome::AlreadyOpen(id));
        };
        if self.store.get(&id).await?.is_some() {
            return Ok(OpenOutcome::AlreadyOpen(id));
        }

        let announcement_text = format!(
            "<!here> {} has opened voting for `{}`. Please vote by clicking on an emoji! \
             To close voting, please enter `votebot close {}`",
            user, poll_name, id
        );
        let announcement = self.chat.post_message(channel, &announcement_text).await?;

        let mut posted = vec![announcement.clone()];
        let mut option_messages = Vec::with_capacity(definition.options.len());

        for (idx, option) in definition.options.iter().enumerate() {
            if idx > 0 && !self.post_interval.is_zero() {
                tokio::time::sleep(self.post_interval).await;
            }

            let message = match self.chat.post_message(channel, option).await {
                Ok(message) => message,
                Err(source) => return Err(abandon(&id, posted, source)),
            };
            posted.push(message.clone());

            if let Err(source) = self
                .chat
                .add_reaction(&definition.marker_emoji, &message)
                .await
            {
                return Err(abandon(&id, posted, source));
            }
            option_messages.push(message);
        }

        let instance = PollInstance {
            id: id.clone(),
            channel: announcement.channel.clone(),
            option_messages,
        };

        if let Err(source) = self.store.insert(instance.clone()).await {
            return Err(unrecorded(&id, posted, source));
        }

        info!(poll_id = %id, channel = %instance.channel, options = instance.option_messages.len(), "Poll opened");
        Ok(OpenOutcome::Opened(instance))
    }
}

/// Log the orphaned messages of a half-announced poll and build its error
fn abandon(poll_id: &str, posted: Vec<MessageRef>, source: crate::channels::ChatError) -> VoteError {
    error!(
        poll_id = %poll_id,
        error = %source,
        orphaned = %join_refs(&posted),
        "Poll announcement failed part way; messages need manual cleanup"
    );
    VoteError::PartialAnnouncement {
        poll_id: poll_id.to_string(),
        posted,
        source,
    }
}

/// Log the messages of a poll that was announced but not recorded
fn unrecorded(poll_id: &str, posted: Vec<MessageRef>, source: StoreError) -> VoteError {
    error!(
        poll_id = %poll_id,
        error = %source,
        orphaned = %join_refs(&posted),
        "Poll announced but not recorded; messages need manual cleanup"
    );
    VoteError::Unrecorded {
        poll_id: poll_id.to_string(),
        posted,
        source,
    }
}

fn join_refs(refs: &[MessageRef]) -> String {
    refs.iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MemoryChatClient;
    use crate::polls::catalog::{PollDefinition, StaticCatalog};
    use crate::polls::store::MemoryInstanceStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Store that reads fine but refuses every write
    struct ReadOnlyStore;

    #[async_trait]
    impl PollInstanceStore for ReadOnlyStore {
        async fn get(&self, _id: &str) -> Result<Option<PollInstance>, StoreError> {
            Ok(None)
        }

        async fn insert(&self, _instance: PollInstance) -> Result<(), StoreError> {
            Err(StoreError::Storage("read-only file system".to_string()))
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn lunch_catalog() -> StaticCatalog {
        StaticCatalog::new(vec![PollDefinition::new(
            "lunch",
            vec![
                "Tacos / Crunchy shell with beef".to_string(),
                "Pho / Beef broth".to_string(),
                "Pizza / Cheese".to_string(),
            ],
        )
        .with_marker_emoji("fork_and_knife")])
        .unwrap()
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, 5).unwrap()
    }

    fn setup() -> (PollAnnouncer, Arc<MemoryChatClient>, Arc<MemoryInstanceStore>) {
        let chat = Arc::new(MemoryChatClient::new());
        let store = Arc::new(MemoryInstanceStore::new());
        let announcer = PollAnnouncer::new(Arc::new(lunch_catalog()), store.clone(), chat.clone())
            .with_post_interval(Duration::ZERO)
            .with_clock(fixed_clock);
        (announcer, chat, store)
    }

    #[test]
    fn test_poll_id_format() {
        assert_eq!(poll_id("lunch", fixed_clock()), "lunch-20261016-123005");
    }

    #[test]
    fn test_poll_ids_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2026, 9, 30, 23, 59, 59).unwrap();
        assert!(poll_id("lunch", earlier) < poll_id("lunch", fixed_clock()));
    }

    #[tokio::test]
    async fn test_open_posts_announcement_and_options() {
        let (announcer, chat, store) = setup();
        let outcome = announcer.open("lunch", "alice", "#food").await.unwrap();

        let instance = match outcome {
            OpenOutcome::Opened(instance) => instance,
            other => panic!("expected Opened, got {:?}", other),
        };
        assert_eq!(instance.id, "lunch-20261016-123005");
        assert_eq!(instance.channel, "food");
        assert_eq!(instance.option_messages.len(), 3);

        let posted = chat.posted();
        assert_eq!(posted.len(), 4);
        assert!(posted[0].text.contains("alice has opened voting for `lunch`"));
        assert!(posted[0].text.contains("`votebot close lunch-20261016-123005`"));
        assert_eq!(posted[1].text, "Tacos / Crunchy shell with beef");

        for message in &instance.option_messages {
            let reactions = chat.reactions_on(message);
            assert_eq!(reactions.len(), 1);
            assert_eq!(reactions[0].name, "fork_and_knife");
            assert_eq!(reactions[0].count, 1);
        }

        assert_eq!(store.get(&instance.id).await.unwrap(), Some(instance));
    }

    #[tokio::test]
    async fn test_open_unknown_poll() {
        let (announcer, chat, store) = setup();
        let outcome = announcer.open("dinner", "alice", "#food").await.unwrap();
        assert_eq!(outcome, OpenOutcome::UnknownPoll("dinner".to_string()));
        assert_eq!(
            outcome.reply_text().as_deref(),
            Some("dinner is not a valid selection")
        );
        assert!(chat.posted().is_empty());
        assert!(store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_same_second_rejected() {
        let (announcer, chat, _store) = setup();
        announcer.open("lunch", "alice", "#food").await.unwrap();
        let posts_before = chat.posted().len();

        let outcome = announcer.open("lunch", "bob", "#food").await.unwrap();
        assert!(matches!(outcome, OpenOutcome::AlreadyOpen(_)));
        assert_eq!(chat.posted().len(), posts_before);
    }

    #[tokio::test]
    async fn test_concurrent_opens_same_second_post_once() {
        let (announcer, chat, store) = setup();
        chat.yield_on_calls(true);

        let (a, b) = tokio::join!(
            announcer.open("lunch", "alice", "#food"),
            announcer.open("lunch", "bob", "#food")
        );

        let outcomes = [a.unwrap(), b.unwrap()];
        let opened = outcomes
            .iter()
            .filter(|o| matches!(o, OpenOutcome::Opened(_)))
            .count();
        assert_eq!(opened, 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, OpenOutcome::AlreadyOpen(id) if id == "lunch-20261016-123005")));
        // one announcement plus three options
        assert_eq!(chat.posted().len(), 4);
        assert_eq!(store.list_ids().await.unwrap(), vec!["lunch-20261016-123005"]);
    }

    #[tokio::test]
    async fn test_store_failure_reports_posted_messages() {
        let chat = Arc::new(MemoryChatClient::new());
        let announcer = PollAnnouncer::new(
            Arc::new(lunch_catalog()),
            Arc::new(ReadOnlyStore),
            chat.clone(),
        )
        .with_post_interval(Duration::ZERO)
        .with_clock(fixed_clock);

        let err = announcer.open("lunch", "alice", "#food").await.unwrap_err();

        match &err {
            VoteError::Unrecorded { poll_id, posted, .. } => {
                assert_eq!(poll_id, "lunch-20261016-123005");
                assert_eq!(posted.len(), 4);
            }
            other => panic!("expected Unrecorded, got {:?}", other),
        }
        assert!(err.to_string().contains("left partly announced"));
        assert!(!err.is_chat_platform());
        assert_eq!(chat.posted().len(), 4);
    }

    #[tokio::test]
    async fn test_open_partial_failure_leaves_no_record() {
        let (announcer, chat, store) = setup();
        chat.fail_posts_after(2);

        let err = announcer.open("lunch", "alice", "#food").await.unwrap_err();
        match err {
            VoteError::PartialAnnouncement { poll_id, posted, .. } => {
                assert_eq!(poll_id, "lunch-20261016-123005");
                assert_eq!(posted.len(), 2);
            }
            other => panic!("expected PartialAnnouncement, got {:?}", other),
        }
        assert!(store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_reaction_failure() {
        let (announcer, chat, store) = setup();
        chat.fail_reactions(true);

        let err = announcer.open("lunch", "alice", "#food").await.unwrap_err();
        assert!(err.is_chat_platform());
        assert!(matches!(err, VoteError::PartialAnnouncement { ref posted, .. } if posted.len() == 2));
        assert!(store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_announcement_failure_is_plain_chat_error() {
        let (announcer, chat, _store) = setup();
        chat.fail_posts_after(0);

        let err = announcer.open("lunch", "alice", "#food").await.unwrap_err();
        assert!(matches!(err, VoteError::Chat(_)));
    }

    #[tokio::test]
    async fn test_open_waits_between_option_posts() {
        let (announcer, _chat, _store) = setup();
        let announcer = announcer.with_post_interval(Duration::from_millis(20));

        let started = std::time::Instant::now();
        announcer.open("lunch", "alice", "#food").await.unwrap();
        // three options, two pauses
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
