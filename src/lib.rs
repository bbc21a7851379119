use std::io::{self, Write};

use chrono::NaiveDate;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod directory;
pub mod error;
pub mod model;
pub mod report;
pub mod resolver;
pub mod settings;
pub mod slack;
pub mod source;
pub mod stats;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use error::{AppError, Result};

use directory::UserDirectory;
use model::Timestamp;
use report::OutputFormat;
use resolver::ConversationSelector;
use settings::Settings;
use slack::SlackApiSource;
use source::{RetryPolicy, SlackSource};
use stats::StatsSession;

pub fn load_token() -> Result<String> {
    std::env::var("SLACK_TOKEN").map_err(|_| AppError::MissingToken)
}

/// Parse a `YYYYMMDD` date into the timestamp of its first second (UTC).
pub fn parse_since(s: &str) -> Result<Timestamp> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map(Timestamp::from_date)
        .map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "slack_react_stats=debug,slack_morphism=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

/// Everything a run needs, validated before any request is made.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub token: String,
    pub selector: ConversationSelector,
    pub since: Option<Timestamp>,
    pub emoji: Option<String>,
    pub format: OutputFormat,
    pub page_size: u16,
    pub retry: RetryPolicy,
}

impl RunOptions {
    /// Combine command line, environment token and settings. The token is
    /// taken from the first of `--token`, `env_token` and the settings file.
    pub fn resolve(cli: &Cli, settings: &Settings, env_token: Option<String>) -> Result<Self> {
        let token = non_empty(cli.token.as_deref())
            .map(str::to_string)
            .or_else(|| env_token.filter(|t| !t.trim().is_empty()))
            .or_else(|| settings.token().map(str::to_string))
            .ok_or(AppError::MissingToken)?;

        let selector = match (non_empty(cli.channel.as_deref()), non_empty(cli.group.as_deref())) {
            (Some(channel), None) => ConversationSelector::Channel(channel.to_string()),
            (None, Some(group)) => ConversationSelector::Group(group.to_string()),
            (None, None) => return Err(AppError::MissingConversation),
            (Some(_), Some(_)) => return Err(AppError::ConflictingConversation),
        };

        let since = non_empty(cli.since.as_deref()).map(parse_since).transpose()?;

        Ok(Self {
            token,
            selector,
            since,
            emoji: non_empty(cli.emoji.as_deref()).map(str::to_string),
            format: cli.format,
            page_size: settings.history.page_size()?,
            retry: settings.history.retry_policy(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Load users, find the conversation, read its history and render the report.
pub async fn run_report<S: SlackSource>(source: &S, options: &RunOptions) -> Result<String> {
    let directory = UserDirectory::load(source).await?;
    debug!(name = options.selector.name(), "resolving conversation");
    let conversation = resolver::resolve(source, &options.selector).await?;

    info!(
        kind = %conversation.kind,
        name = %conversation.name,
        id = %conversation.id,
        since = ?options.since.as_ref().map(Timestamp::as_str),
        "reading reactions"
    );

    let mut session =
        StatsSession::new(directory, options.since.clone()).with_page_size(options.page_size);
    session.run(source, &conversation.id, &options.retry).await?;

    report::render_as(session.table(), options.emoji.as_deref(), options.format)
}

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.config)?;
    let options = RunOptions::resolve(&cli, &settings, load_token().ok())?;

    let source = SlackApiSource::new(&options.token)?;
    let report = run_report(&source, &options).await?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    if !report.is_empty() && !report.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
