//! Reaction statistics over a conversation's history.
//!
//! A [`StatsSession`] walks history backward from `latest`, one page at a time.
//! Each page's oldest message becomes the exclusive upper bound of the next
//! request, so every message is folded exactly once.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::directory::UserDirectory;
use crate::error::Result;
use crate::model::{Message, Page, Timestamp};
use crate::source::{HistoryQuery, MAX_PAGE_SIZE, RetryPolicy, SlackSource, fetch_page};

/// Aggregated usage of one emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmojiStats {
    /// Sum of Slack's reaction counts.
    pub count: u64,
    /// User name -> number of messages they reacted to with this emoji.
    pub by: HashMap<String, u64>,
    /// Author name -> reactions with this emoji their messages received.
    pub to: HashMap<String, u64>,
}

/// Emoji name -> statistics.
pub type ReactionTable = HashMap<String, EmojiStats>;

/// What to do after folding a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Fetch the messages strictly older than this timestamp next.
    Continue(Timestamp),
    /// No more history to read.
    Exhausted,
}

pub struct StatsSession {
    directory: UserDirectory,
    table: ReactionTable,
    latest: Timestamp,
    oldest: Option<Timestamp>,
    page_size: u16,
    pages_fetched: usize,
    messages_seen: usize,
}

impl StatsSession {
    /// Start a session reading from now back to `oldest` (or the beginning
    /// of the conversation).
    pub fn new(directory: UserDirectory, oldest: Option<Timestamp>) -> Self {
        Self {
            directory,
            table: ReactionTable::new(),
            latest: Timestamp::now(),
            oldest,
            page_size: MAX_PAGE_SIZE,
            pages_fetched: 0,
            messages_seen: 0,
        }
    }

    pub fn with_latest(mut self, latest: Timestamp) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_page_size(mut self, page_size: u16) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn latest(&self) -> &Timestamp {
        &self.latest
    }

    pub fn table(&self) -> &ReactionTable {
        &self.table
    }

    pub fn into_table(self) -> ReactionTable {
        self.table
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn messages_seen(&self) -> usize {
        self.messages_seen
    }

    /// Read history page by page until it is exhausted.
    pub async fn run<S: SlackSource>(
        &mut self,
        source: &S,
        conversation_id: &str,
        retry: &RetryPolicy,
    ) -> Result<()> {
        loop {
            let query = HistoryQuery {
                latest: self.latest.clone(),
                oldest: self.oldest.clone(),
                limit: self.page_size,
            };
            let page = fetch_page(source, conversation_id, &query, retry).await?;
            self.pages_fetched += 1;

            let outcome = self.fold_page(&page);
            debug!(
                page = self.pages_fetched,
                messages = page.messages.len(),
                has_more = page.has_more,
                latest = %self.latest,
                "folded history page"
            );

            if outcome == PageOutcome::Exhausted {
                break;
            }
        }

        info!(
            conversation = conversation_id,
            pages = self.pages_fetched,
            messages = self.messages_seen,
            emojis = self.table.len(),
            "finished reading history"
        );
        Ok(())
    }

    /// Add a page's reactions to the table and move the cursor to the page's
    /// oldest message.
    pub fn fold_page(&mut self, page: &Page) -> PageOutcome {
        for message in &page.messages {
            self.fold_message(message);
        }
        self.messages_seen += page.messages.len();

        // An empty page ends the walk even if the source claims more history,
        // otherwise the same request would be repeated forever.
        let Some(oldest_in_page) = page.messages.last() else {
            return PageOutcome::Exhausted;
        };
        if !page.has_more {
            return PageOutcome::Exhausted;
        }

        let next = oldest_in_page.ts.clone();
        if next >= self.latest {
            warn!(
                latest = %self.latest,
                next = %next,
                "history cursor did not move backward, stopping"
            );
            return PageOutcome::Exhausted;
        }

        self.latest = next.clone();
        PageOutcome::Continue(next)
    }

    fn fold_message(&mut self, message: &Message) {
        // Authors missing from the directory (deleted accounts, bots) are
        // still counted, under the empty name.
        let author = self.directory.lookup(&message.user).unwrap_or("");

        for reaction in &message.reactions {
            let stats = self.table.entry(reaction.name.clone()).or_default();
            stats.count += reaction.count;
            *stats.to.entry(author.to_string()).or_default() += reaction.count;

            for reactor in &reaction.users {
                if let Some(name) = self.directory.lookup(reactor) {
                    *stats.by.entry(name.to_string()).or_default() += 1;
                }
            }
        }
    }
}
