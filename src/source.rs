use std::time::Duration;

use tracing::warn;

use crate::error::{AppError, Result};
use crate::model::{Conversation, ConversationKind, Page, Timestamp, UserEntry};

/// Slack's maximum `limit` for `conversations.history`.
pub const MAX_PAGE_SIZE: u16 = 1000;

/// Parameters of a single history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Only messages strictly older than this are returned.
    pub latest: Timestamp,
    /// If set, no message older than this is returned.
    pub oldest: Option<Timestamp>,
    pub limit: u16,
}

/// The Slack calls the statistics need.
///
/// `SlackApiSource` talks to the real Web API; tests use an in-memory source.
#[allow(async_fn_in_trait)]
pub trait SlackSource {
    async fn list_users(&self) -> Result<Vec<UserEntry>>;

    async fn list_conversations(&self, kind: ConversationKind) -> Result<Vec<Conversation>>;

    /// Fetch one page of history, newest message first.
    async fn fetch_history(&self, conversation_id: &str, query: &HistoryQuery) -> Result<Page>;
}

/// Bounded exponential backoff around history fetches.
///
/// The default makes no retries: the first failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32, err: &AppError) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        match err {
            AppError::SlackRateLimit { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        }
    }
}

/// Fetch one history page, retrying transient failures per `retry`.
pub async fn fetch_page<S: SlackSource>(
    source: &S,
    conversation_id: &str,
    query: &HistoryQuery,
    retry: &RetryPolicy,
) -> Result<Page> {
    let mut attempt = 0;
    loop {
        match source.fetch_history(conversation_id, query).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_transient() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.delay_for(attempt, &e);
                warn!(
                    error = %e,
                    attempt,
                    max_retries = retry.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "history fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySource, message};

    fn query() -> HistoryQuery {
        HistoryQuery {
            latest: Timestamp::new("1000"),
            oldest: None,
            limit: 10,
        }
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_default_policy_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy, RetryPolicy::none());
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
        };
        let err = AppError::SlackTransport("reset".to_string());
        assert_eq!(policy.delay_for(1, &err), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2, &err), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4, &err), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_honours_rate_limit_hint() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        let err = AppError::SlackRateLimit { retry_after_secs: 7 };
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_fetch_page_passes_through() {
        let source = MemorySource::new().with_history("C1", vec![message("900", "U1", vec![])]);
        let page = fetch_page(&source, "C1", &query(), &RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 1);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_fetch_page_fails_fast_without_retry() {
        let source = MemorySource::new()
            .with_history("C1", vec![])
            .with_history_failures(1);
        let result = fetch_page(&source, "C1", &query(), &RetryPolicy::none()).await;
        assert!(matches!(result, Err(AppError::SlackTransport(_))));
        assert_eq!(source.history_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_page_retries_transient_errors() {
        let source = MemorySource::new()
            .with_history("C1", vec![message("900", "U1", vec![])])
            .with_history_failures(2);
        let page = fetch_page(&source, "C1", &query(), &fast_retry(2))
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(source.history_calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_page_gives_up_after_max_retries() {
        let source = MemorySource::new()
            .with_history("C1", vec![])
            .with_history_failures(5);
        let result = fetch_page(&source, "C1", &query(), &fast_retry(2)).await;
        assert!(result.is_err());
        assert_eq!(source.history_calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_page_does_not_retry_api_errors() {
        let source = MemorySource::new();
        let result = fetch_page(&source, "missing", &query(), &fast_retry(3)).await;
        assert!(matches!(result, Err(AppError::SlackApi(_))));
        assert_eq!(source.history_calls(), 1);
    }
}
