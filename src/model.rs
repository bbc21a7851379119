use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A Slack message timestamp (e.g., "1767636991.559059").
///
/// Slack uses `ts` both as a message id and as a pagination boundary. Ordering
/// is numeric: seconds first, then the fractional part, so "99.9" sorts before
/// "100.0" even though it does not lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl Timestamp {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn now() -> Self {
        Self(format!("{}.000000", Utc::now().timestamp()))
    }

    /// Midnight UTC of the given day.
    pub fn from_date(date: NaiveDate) -> Self {
        let secs = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        Self(format!("{}.000000", secs))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The timestamp one microsecond earlier, the finest step Slack uses.
    ///
    /// Slack treats `oldest` as exclusive, so passing `ts.just_before()`
    /// makes a message stamped exactly `ts` part of the result.
    pub fn just_before(&self) -> Self {
        let (secs, micros) = self.sort_key();
        let (secs, micros) = match (secs, micros) {
            (0, 0) => (0, 0),
            (secs, 0) => (secs - 1, 999_999),
            (secs, micros) => (secs, micros - 1),
        };
        Self(format!("{}.{:06}", secs, micros))
    }

    fn sort_key(&self) -> (u64, u64) {
        let mut parts = self.0.splitn(2, '.');
        let secs = parts
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let micros = parts
            .next()
            .map(|frac| {
                let digits: String = frac.chars().take(6).collect();
                format!("{:0<6}", digits).parse().unwrap_or(0)
            })
            .unwrap_or(0);
        (secs, micros)
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One emoji reaction on a message.
///
/// `count` is what Slack reports as the total; `users` may be truncated by the
/// API for popular reactions, so the two are not required to agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u64,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub ts: Timestamp,
    /// Author user id, empty for messages without one (bots, system events).
    pub user: String,
    pub reactions: Vec<Reaction>,
}

/// One page of conversation history, newest message first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKind {
    /// Public channel
    Channel,
    /// Private channel (formerly "group")
    Group,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::Channel => f.write_str("channel"),
            ConversationKind::Group => f.write_str("group"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub id: String,
    pub name: String,
}
