use std::path::PathBuf;

use clap::Parser;

use crate::report::OutputFormat;
use crate::settings::SETTINGS_FILE;

#[derive(Parser, Debug)]
#[command(name = "slack-react-stats")]
#[command(about = "Reaction emoji statistics for a Slack channel or group")]
pub struct Cli {
    /// Slack token, defaults to SLACK_TOKEN or the settings file
    #[arg(short, long)]
    pub token: Option<String>,

    /// Public channel to read reactions from
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Private group to read reactions from
    #[arg(short, long)]
    pub group: Option<String>,

    /// Log each request to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Only report this emoji (name without ':')
    #[arg(short, long)]
    pub emoji: Option<String>,

    /// Only count messages since this date (YYYYMMDD, UTC)
    #[arg(short, long)]
    pub since: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Settings file path
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,
}
