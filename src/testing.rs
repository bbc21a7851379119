//! In-memory `SlackSource` for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use crate::error::{AppError, Result};
use crate::model::{Conversation, ConversationKind, Message, Page, Reaction, Timestamp, UserEntry};
use crate::source::{HistoryQuery, SlackSource};

pub fn message(ts: &str, user: &str, reactions: Vec<Reaction>) -> Message {
    Message {
        ts: Timestamp::new(ts),
        user: user.to_string(),
        reactions,
    }
}

pub fn reaction(name: &str, count: u64, users: &[&str]) -> Reaction {
    Reaction {
        name: name.to_string(),
        count,
        users: users.iter().map(|u| u.to_string()).collect(),
    }
}

pub fn user(id: &str, name: &str) -> UserEntry {
    UserEntry {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// Serves history the way `conversations.history` does: newest first,
/// `latest` exclusive, `oldest` inclusive, at most `limit` messages.
#[derive(Default)]
pub struct MemorySource {
    users: Vec<UserEntry>,
    conversations: Vec<Conversation>,
    histories: HashMap<String, Vec<Message>>,
    scripted: RefCell<HashMap<String, VecDeque<Page>>>,
    fail_listings: bool,
    history_failures: Cell<u32>,
    queries: RefCell<Vec<HistoryQuery>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Vec<UserEntry>) -> Self {
        self.users = users;
        self
    }

    pub fn with_conversation(mut self, id: &str, name: &str, kind: ConversationKind) -> Self {
        self.conversations.push(Conversation {
            id: id.to_string(),
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn with_history(mut self, id: &str, mut messages: Vec<Message>) -> Self {
        messages.sort_by(|a, b| b.ts.cmp(&a.ts));
        self.histories.insert(id.to_string(), messages);
        self
    }

    /// Serve these pages verbatim, in order, ignoring the query.
    pub fn with_pages(self, id: &str, pages: Vec<Page>) -> Self {
        self.scripted
            .borrow_mut()
            .insert(id.to_string(), pages.into_iter().collect());
        self
    }

    pub fn with_failing_listings(mut self) -> Self {
        self.fail_listings = true;
        self
    }

    /// Fail the next `n` history calls with a transport error.
    pub fn with_history_failures(self, n: u32) -> Self {
        self.history_failures.set(n);
        self
    }

    pub fn history_calls(&self) -> usize {
        self.queries.borrow().len()
    }

    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.borrow().clone()
    }
}

impl SlackSource for MemorySource {
    async fn list_users(&self) -> Result<Vec<UserEntry>> {
        if self.fail_listings {
            return Err(AppError::SlackTransport("connection refused".to_string()));
        }
        Ok(self.users.clone())
    }

    async fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>> {
        if self.fail_listings {
            return Err(AppError::SlackTransport("connection refused".to_string()));
        }
        Ok(self
            .conversations
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect())
    }

    async fn fetch_history(&self, conversation_id: &str, query: &HistoryQuery) -> Result<Page> {
        self.queries.borrow_mut().push(query.clone());

        let remaining = self.history_failures.get();
        if remaining > 0 {
            self.history_failures.set(remaining - 1);
            return Err(AppError::SlackTransport("connection reset".to_string()));
        }

        if let Some(pages) = self.scripted.borrow_mut().get_mut(conversation_id) {
            return Ok(pages.pop_front().unwrap_or_default());
        }

        let Some(history) = self.histories.get(conversation_id) else {
            return Err(AppError::SlackApi("channel_not_found".to_string()));
        };

        let mut matching = history
            .iter()
            .filter(|m| m.ts < query.latest)
            .filter(|m| query.oldest.as_ref().is_none_or(|oldest| m.ts >= *oldest));

        let messages: Vec<Message> = matching.by_ref().take(query.limit as usize).cloned().collect();
        let has_more = matching.next().is_some();

        Ok(Page { messages, has_more })
    }
}
