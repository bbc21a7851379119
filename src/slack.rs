use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::model::{Conversation, ConversationKind, Message, Page, Reaction, Timestamp, UserEntry};
use crate::source::{HistoryQuery, SlackSource};

/// Page size for the listing endpoints (`users.list`, `conversations.list`).
const LIST_LIMIT: u16 = 200;

/// `SlackSource` backed by the Slack Web API.
pub struct SlackApiSource {
    client: SlackHyperClient,
    token: SlackApiToken,
}

impl SlackApiSource {
    pub fn new(token: &str) -> Result<Self> {
        let connector =
            SlackClientHyperConnector::new().map_err(|e| AppError::SlackTransport(e.to_string()))?;
        Ok(Self {
            client: SlackClient::new(connector),
            token: SlackApiToken::new(SlackApiTokenValue(token.to_string())),
        })
    }
}

impl SlackSource for SlackApiSource {
    async fn list_users(&self) -> Result<Vec<UserEntry>> {
        let session = self.client.open_session(&self.token);

        let mut all_users = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let request = SlackApiUsersListRequest::new()
                .with_limit(LIST_LIMIT)
                .opt_cursor(cursor);

            let response = session.users_list(&request).await.map_err(slack_error)?;

            all_users.extend(response.members.into_iter().filter_map(|user| {
                Some(UserEntry {
                    id: user.id.0,
                    name: user.name?,
                })
            }));

            match next_cursor(response.response_metadata) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all_users)
    }

    async fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>> {
        let session = self.client.open_session(&self.token);
        let conversation_type = match kind {
            ConversationKind::Channel => SlackConversationType::Public,
            ConversationKind::Group => SlackConversationType::Private,
        };

        let mut all_conversations = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let request = SlackApiConversationsListRequest::new()
                .with_limit(LIST_LIMIT)
                .with_types(vec![conversation_type.clone()])
                .opt_cursor(cursor);

            let response = session
                .conversations_list(&request)
                .await
                .map_err(slack_error)?;

            all_conversations.extend(response.channels.into_iter().filter_map(|channel| {
                Some(Conversation {
                    id: channel.id.0,
                    name: channel.name?,
                    kind,
                })
            }));

            match next_cursor(response.response_metadata) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(kind = %kind, count = all_conversations.len(), "listed conversations");
        Ok(all_conversations)
    }

    async fn fetch_history(&self, conversation_id: &str, query: &HistoryQuery) -> Result<Page> {
        let session = self.client.open_session(&self.token);
        let request = history_request(conversation_id, query);

        let response = session
            .conversations_history(&request)
            .await
            .map_err(slack_error)?;

        Ok(to_page(response.messages, response.has_more, &query.latest))
    }
}

/// Slack's `inclusive` flag applies to both bounds, and `latest` has to stay
/// exclusive. The inclusive lower bound is sent as an exclusive bound one
/// microsecond earlier instead.
fn history_request(conversation_id: &str, query: &HistoryQuery) -> SlackApiConversationsHistoryRequest {
    SlackApiConversationsHistoryRequest::new()
        .with_channel(SlackChannelId(conversation_id.to_string()))
        .with_latest(SlackTs(query.latest.0.clone()))
        .opt_oldest(query.oldest.as_ref().map(|ts| SlackTs(ts.just_before().0)))
        .with_limit(query.limit)
}

fn to_page(messages: Vec<SlackHistoryMessage>, has_more: Option<bool>, latest: &Timestamp) -> Page {
    Page {
        messages: messages
            .into_iter()
            .map(to_message)
            .filter(|message| message.ts < *latest)
            .collect(),
        has_more: has_more.unwrap_or(false),
    }
}

fn to_message(message: SlackHistoryMessage) -> Message {
    let reactions = message
        .content
        .reactions
        .unwrap_or_default()
        .into_iter()
        .map(|reaction| Reaction {
            name: reaction.name.0,
            count: reaction.count as u64,
            users: reaction.users.into_iter().map(|u| u.0).collect(),
        })
        .collect();

    Message {
        ts: Timestamp(message.origin.ts.0),
        user: message.sender.user.map(|u| u.0).unwrap_or_default(),
        reactions,
    }
}

fn next_cursor(metadata: Option<SlackResponseMetadata>) -> Option<SlackCursorId> {
    metadata
        .and_then(|meta| meta.next_cursor)
        .filter(|cursor| !cursor.0.is_empty())
}

fn slack_error(err: SlackClientError) -> AppError {
    match err {
        SlackClientError::ApiError(api) => AppError::SlackApi(api.code),
        SlackClientError::RateLimitError(rate) => AppError::SlackRateLimit {
            retry_after_secs: rate.retry_after.map(|d| d.as_secs()).unwrap_or(1),
        },
        other => AppError::SlackTransport(other.to_string()),
    }
}
