use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use memo_core::config::EngineConfig;
use memo_core::models::Log;
use memo_core::sync::MergeOutcome;
use memo_core::{MemoService, SyncConflict};
use serde::Serialize;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "engine.json";

#[derive(Debug, Serialize)]
pub struct LogListItem {
    pub id: i64,
    pub title: String,
    pub preview: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
    pub tags: Vec<String>,
    pub thread_id: Option<String>,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("MEMO_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memo")
        .join("memo.db")
}

/// Explicit flag, then `MEMO_CONFIG`, then the per-user file when it exists
pub fn resolve_config_path(cli_config: Option<PathBuf>) -> Option<PathBuf> {
    cli_config
        .or_else(|| env::var_os("MEMO_CONFIG").map(PathBuf::from))
        .or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("memo").join(CONFIG_FILE_NAME))
                .filter(|path| path.exists())
        })
}

pub async fn open_service(
    db_path: &Path,
    config_path: Option<&Path>,
) -> Result<MemoService, CliError> {
    let service = MemoService::open_path(db_path).await?;
    match config_path {
        Some(path) => Ok(service.with_config(EngineConfig::load(path)?)?),
        None => Ok(service),
    }
}

pub fn format_log_lines(logs: &[Log]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    logs.iter()
        .map(|log| {
            let id = log.id.to_string();
            let preview = log_preview(log, 40);
            let relative_time = format_relative_time(log.updated_at, now_ms);
            let tags = render_tags(&log.tags);

            if tags.is_empty() {
                format!("{id:>6}  {preview:<40}  {relative_time}")
            } else {
                format!("{id:>6}  {preview:<40}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

pub fn log_to_list_item(log: &Log) -> LogListItem {
    let now_ms = Utc::now().timestamp_millis();
    LogListItem {
        id: log.id.get(),
        title: log.title.clone(),
        preview: log_preview(log, 80),
        created_at: log.created_at,
        updated_at: log.updated_at,
        relative_time: format_relative_time(log.updated_at, now_ms),
        tags: log.tags.clone(),
        thread_id: log.thread_id.clone(),
    }
}

/// Title when present, otherwise the first line of content
pub fn log_preview(log: &Log, max_chars: usize) -> String {
    let source = if log.title.trim().is_empty() {
        log.content.lines().next().unwrap_or("")
    } else {
        log.title.as_str()
    };
    truncate_chars(source.trim(), max_chars)
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn render_tags(tags: &[String]) -> String {
    let mut tags = tags.to_vec();
    tags.sort();
    tags.into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let newer = if conflict.remote_is_newer() {
                "remote"
            } else {
                "local"
            };
            format!(
                "log={:<6}  {:<40}  local={}  remote={}  newer={newer}",
                conflict.local_id,
                truncate_chars(&conflict.title, 40),
                format_timestamp(conflict.local_updated_at),
                format_timestamp(conflict.remote_updated_at),
            )
        })
        .collect()
}

pub fn format_outcome_lines(outcome: &MergeOutcome) -> Vec<String> {
    if outcome.is_noop() {
        return vec!["Nothing to merge; the store already holds this snapshot.".to_string()];
    }

    let mut lines = vec![
        format!(
            "Logs: {} created, {} updated",
            outcome.logs_created, outcome.logs_updated
        ),
        format!(
            "Folders: {} created, {} updated",
            outcome.folders_created, outcome.folders_updated
        ),
        format!("Models: {} created", outcome.models_created),
        format!(
            "Comments: {} added, {} skipped",
            outcome.comments_added, outcome.comments_skipped
        ),
    ];
    if !outcome.mirror_ids.is_empty() {
        let ids = outcome
            .mirror_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Mirror ids: {ids}"));
    }
    lines
}
