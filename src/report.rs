use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::stats::{EmojiStats, ReactionTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented plain text
    #[default]
    Text,
    /// Pretty printed JSON array
    Json,
}

/// JSON shape of one emoji's statistics
#[derive(Debug, Serialize)]
struct EmojiReport<'a> {
    emoji: &'a str,
    glyph: Option<String>,
    count: u64,
    by: BTreeMap<&'a str, u64>,
    to: BTreeMap<&'a str, u64>,
}

pub fn render_as(table: &ReactionTable, filter: Option<&str>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render(table, filter)),
        OutputFormat::Json => render_json(table, filter),
    }
}

/// Render the table as text:
///
/// ```text
/// emoji: +1
///     count: 4
///     BY
///         alice 1
///     TO
///         bob 3
/// ```
///
/// Indentation is tabs. Emojis and users are sorted by name.
pub fn render(table: &ReactionTable, filter: Option<&str>) -> String {
    let mut out = String::new();

    for (name, stats) in selected(table, filter) {
        out.push_str(&format!("emoji: {}\n", name));
        out.push_str(&format!("\tcount: {}\n", stats.count));
        out.push_str("\tBY\n");
        for (user, count) in sorted(&stats.by) {
            out.push_str(&format!("\t\t{} {}\n", user, count));
        }
        out.push_str("\tTO\n");
        for (user, count) in sorted(&stats.to) {
            out.push_str(&format!("\t\t{} {}\n", user, count));
        }
    }

    out
}

pub fn render_json(table: &ReactionTable, filter: Option<&str>) -> Result<String> {
    let reports: Vec<EmojiReport> = selected(table, filter)
        .into_iter()
        .map(|(name, stats)| EmojiReport {
            emoji: name,
            glyph: emoji_glyph(name),
            count: stats.count,
            by: sorted(&stats.by),
            to: sorted(&stats.to),
        })
        .collect();

    serde_json::to_string_pretty(&reports).map_err(|e| AppError::JsonSerialize(e.to_string()))
}

/// Unicode rendering of a reaction name such as `thumbsup` or
/// `wave::skin-tone-3`. Custom workspace emoji have none.
pub fn emoji_glyph(name: &str) -> Option<String> {
    let mut parts = name.split("::skin-tone-");
    let emoji = emojis::get_by_shortcode(parts.next()?)?;

    let Some(skin_tone) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
        return Some(emoji.to_string());
    };
    let skinned = emoji
        .skin_tones()
        .and_then(|mut tones| tones.nth(skin_tone.checked_sub(1)?));

    Some(skinned.unwrap_or(emoji).to_string())
}

fn selected<'a>(table: &'a ReactionTable, filter: Option<&str>) -> Vec<(&'a str, &'a EmojiStats)> {
    let mut entries: Vec<(&str, &EmojiStats)> = table
        .iter()
        .filter(|(name, _)| filter.is_none_or(|f| f == name.as_str()))
        .map(|(name, stats)| (name.as_str(), stats))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn sorted(counts: &std::collections::HashMap<String, u64>) -> BTreeMap<&str, u64> {
    counts.iter().map(|(k, v)| (k.as_str(), *v)).collect()
}
