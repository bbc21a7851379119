use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("no Slack token: pass --token, set SLACK_TOKEN or add it to settings.toml")]
    MissingToken,

    #[error("must pass at least one channel or group")]
    MissingConversation,

    #[error("only one channel or group allowed")]
    ConflictingConversation,

    #[error("invalid date format: {0} (expected YYYYMMDD)")]
    InvalidDate(String),

    #[error("invalid page size: {0} (expected 1 to 1000)")]
    InvalidPageSize(u32),

    #[error("no such channel: {0}")]
    ChannelNotFound(String),

    #[error("no such group: {0}")]
    GroupNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Slack transport error: {0}")]
    SlackTransport(String),

    #[error("Slack rate limit error: retry after {retry_after_secs}s")]
    SlackRateLimit { retry_after_secs: u64 },

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl AppError {
    /// Whether retrying the same request could succeed.
    ///
    /// Slack API errors (`channel_not_found`, `invalid_auth`, ...) are answers,
    /// not failures to get one, so they are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::SlackTransport(_) | AppError::SlackRateLimit { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
