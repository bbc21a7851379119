use crate::error::{AppError, Result};
use crate::model::{Conversation, ConversationKind};
use crate::source::SlackSource;

/// Which conversation the user asked for on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationSelector {
    Channel(String),
    Group(String),
}

impl ConversationSelector {
    pub fn name(&self) -> &str {
        match self {
            ConversationSelector::Channel(name) | ConversationSelector::Group(name) => name,
        }
    }
}

pub async fn resolve<S: SlackSource>(
    source: &S,
    selector: &ConversationSelector,
) -> Result<Conversation> {
    match selector {
        ConversationSelector::Channel(name) => resolve_channel(source, name).await,
        ConversationSelector::Group(name) => resolve_group(source, name).await,
    }
}

pub async fn resolve_channel<S: SlackSource>(source: &S, name: &str) -> Result<Conversation> {
    find_by_name(source, ConversationKind::Channel, name)
        .await?
        .ok_or_else(|| AppError::ChannelNotFound(name.to_string()))
}

pub async fn resolve_group<S: SlackSource>(source: &S, name: &str) -> Result<Conversation> {
    find_by_name(source, ConversationKind::Group, name)
        .await?
        .ok_or_else(|| AppError::GroupNotFound(name.to_string()))
}

// Workspaces have at most a few thousand conversations; a linear scan is enough.
async fn find_by_name<S: SlackSource>(
    source: &S,
    kind: ConversationKind,
    name: &str,
) -> Result<Option<Conversation>> {
    let conversations = source.list_conversations(kind).await?;
    Ok(conversations.into_iter().find(|c| c.name == name))
}
