use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::model::UserEntry;
use crate::source::SlackSource;

/// Snapshot of the workspace's user id to user name mapping.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    /// Fetch every user in the workspace. Failing here aborts the run:
    /// without names there is nothing to break the statistics down by.
    pub async fn load<S: SlackSource>(source: &S) -> Result<Self> {
        let users = source.list_users().await?;
        let directory = Self::from_entries(users);
        debug!(users = directory.len(), "loaded user directory");
        Ok(directory)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = UserEntry>) -> Self {
        let names = entries
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();
        Self { names }
    }

    pub fn lookup(&self, user_id: &str) -> Option<&str> {
        self.names.get(user_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
