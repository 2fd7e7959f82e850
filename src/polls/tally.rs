//! Vote tallying and result formatting.

use crate::channels::MessageReactions;
use std::collections::BTreeMap;

/// Reactions subtracted from every option to discount the marker the bot
/// attaches at open time.
///
/// This assumes the marker reaction is never itself a vote. If the marker
/// emoji ever becomes a valid user choice, one real vote per option is lost.
pub const BOT_MARKER_VOTE_OFFSET: u64 = 1;

/// Label used for an option in results: the text before the first `/`,
/// trimmed.
pub fn short_name(text: &str) -> &str {
    text.split_once('/').map_or(text, |(head, _)| head).trim()
}

/// Votes for one option after discounting the marker reaction
pub fn option_votes(message: &MessageReactions) -> u64 {
    message.total_count().saturating_sub(BOT_MARKER_VOTE_OFFSET)
}

/// Vote counts grouped by count, with ties kept in option order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyResult {
    groups: BTreeMap<u64, Vec<String>>,
    total: u64,
}

impl TallyResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one option's count; call in option order
    pub fn record(&mut self, short_name: impl Into<String>, count: u64) {
        self.groups.entry(count).or_default().push(short_name.into());
        self.total += count;
    }

    /// Record an option message as read back from the platform
    pub fn record_message(&mut self, message: &MessageReactions) {
        self.record(short_name(&message.text), option_votes(message));
    }

    /// Sum of every option's count
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Groups from the highest count to the lowest
    pub fn groups_descending(&self) -> impl Iterator<Item = (u64, &[String])> {
        self.groups
            .iter()
            .rev()
            .map(|(count, names)| (*count, names.as_slice()))
    }

    #[cfg(test)]
    fn count_for(&self, short_name: &str) -> Option<u64> {
        self.groups
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == short_name))
            .map(|(count, _)| *count)
    }

    /// The ranked body: one line per distinct count plus the total
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .groups_descending()
            .map(|(count, names)| format!("{} vote(s) each for {}", count, names.join(", ")))
            .collect();
        lines.push(format!("Total votes: {}", self.total));
        lines
    }
}

/// Channel message announcing the result of a closed poll
pub fn format_results(user: &str, poll_id: &str, tally: &TallyResult) -> String {
    let mut text = format!(
        "<!here> {} closed voting for {}! Results:\n```\n",
        user, poll_id
    );
    for line in tally.summary_lines() {
        text.push_str(&line);
        text.push('\n');
    }
    text.push_str("```");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Reaction;

    fn message(text: &str, count: u64) -> MessageReactions {
        MessageReactions {
            text: text.to_string(),
            reactions: vec![Reaction {
                name: "ballot_box_with_check".to_string(),
                count,
            }],
        }
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Tacos / Crunchy shell with beef"), "Tacos");
        assert_eq!(short_name("  Pho/Beef / Broth"), "Pho");
        assert_eq!(short_name("Pizza"), "Pizza");
        assert_eq!(short_name(" / nothing before"), "");
    }

    #[test]
    fn test_option_votes_subtracts_marker() {
        assert_eq!(option_votes(&message("A", 5)), 4);
        assert_eq!(option_votes(&message("A", 1)), 0);
    }

    #[test]
    fn test_option_votes_marker_removed() {
        let bare = MessageReactions {
            text: "A".to_string(),
            reactions: vec![],
        };
        assert_eq!(option_votes(&bare), 0);
    }

    #[test]
    fn test_option_votes_counts_every_emoji() {
        let mut msg = message("A", 2);
        msg.reactions.push(Reaction {
            name: "taco".to_string(),
            count: 3,
        });
        assert_eq!(option_votes(&msg), 4);
    }

    #[test]
    fn test_ties_grouped_descending() {
        let mut tally = TallyResult::new();
        for msg in [
            message("Tacos / Crunchy", 5),
            message("Pho / Broth", 5),
            message("Pizza / Cheese", 3),
        ] {
            tally.record_message(&msg);
        }

        assert_eq!(tally.total(), 10);
        let groups: Vec<(u64, Vec<String>)> = tally
            .groups_descending()
            .map(|(c, names)| (c, names.to_vec()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (4, vec!["Tacos".to_string(), "Pho".to_string()]),
                (2, vec!["Pizza".to_string()]),
            ]
        );
        assert_eq!(tally.count_for("Pizza"), Some(2));
        assert_eq!(tally.count_for("Sushi"), None);
    }

    #[test]
    fn test_tie_order_follows_record_order() {
        let mut tally = TallyResult::new();
        tally.record("Zebra", 1);
        tally.record("Apple", 1);
        assert_eq!(tally.summary_lines()[0], "1 vote(s) each for Zebra, Apple");
    }

    #[test]
    fn test_empty_tally() {
        let tally = TallyResult::new();
        assert_eq!(tally.summary_lines(), vec!["Total votes: 0"]);
    }

    #[test]
    fn test_format_results() {
        let mut tally = TallyResult::new();
        tally.record("Tacos", 4);
        tally.record("Pho", 4);
        tally.record("Pizza", 2);

        assert_eq!(
            format_results("alice", "lunch-20261016-120000", &tally),
            "<!here> alice closed voting for lunch-20261016-120000! Results:\n```\n\
             4 vote(s) each for Tacos, Pho\n\
             2 vote(s) each for Pizza\n\
             Total votes: 10\n```"
        );
    }
}
