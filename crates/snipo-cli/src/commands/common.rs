use chrono::Utc;
use serde::Serialize;
use snipo_core::models::{SyncConfig, SyncConflict, SyncLogEntry, SyncMapping};
use snipo_core::SnippetId;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub enabled: bool,
    pub github_username: Option<String>,
    pub has_token: bool,
    pub auto_sync: bool,
    pub sync_interval_minutes: u32,
    pub conflict_strategy: String,
    pub last_full_sync_at: Option<i64>,
    pub last_full_sync_at_iso: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MappingItem {
    pub snippet_id: String,
    pub gist_id: String,
    pub gist_url: String,
    pub sync_enabled: bool,
    pub status: String,
    pub error_message: Option<String>,
    pub last_synced_at: Option<i64>,
    pub last_synced_relative: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictItem {
    pub id: i64,
    pub snippet_id: String,
    pub gist_id: String,
    pub created_at: i64,
    pub created_at_iso: String,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LogItem {
    pub id: i64,
    pub snippet_id: Option<String>,
    pub gist_id: Option<String>,
    pub operation: String,
    pub status: String,
    pub message: String,
    pub created_at: i64,
    pub created_at_iso: String,
}

pub fn parse_snippet_id(value: &str) -> Result<SnippetId, CliError> {
    value
        .trim()
        .parse::<SnippetId>()
        .map_err(|_| CliError::InvalidSnippetId(value.to_string()))
}

pub fn config_to_view(config: &SyncConfig) -> ConfigView {
    ConfigView {
        enabled: config.enabled,
        github_username: config.github_username.clone(),
        has_token: config.has_credential(),
        auto_sync: config.auto_sync,
        sync_interval_minutes: config.sync_interval_minutes,
        conflict_strategy: config.conflict_strategy.to_string(),
        last_full_sync_at: config.last_full_sync_at,
        last_full_sync_at_iso: config.last_full_sync_at.map(format_sync_timestamp),
    }
}

pub fn format_config_lines(view: &ConfigView) -> Vec<String> {
    vec![
        format!("enabled:         {}", view.enabled),
        format!(
            "github user:     {}",
            view.github_username.as_deref().unwrap_or("(none)")
        ),
        format!("token stored:    {}", view.has_token),
        format!("auto sync:       {}", view.auto_sync),
        format!("interval:        {} min", view.sync_interval_minutes),
        format!("strategy:        {}", view.conflict_strategy),
        format!(
            "last full sync:  {}",
            view.last_full_sync_at_iso.as_deref().unwrap_or("never")
        ),
    ]
}

pub fn mapping_to_item(mapping: &SyncMapping, now_ms: i64) -> MappingItem {
    MappingItem {
        snippet_id: mapping.snippet_id.to_string(),
        gist_id: mapping.gist_id.clone(),
        gist_url: mapping.gist_url.clone(),
        sync_enabled: mapping.sync_enabled,
        status: mapping.status.to_string(),
        error_message: mapping.error_message.clone(),
        last_synced_at: mapping.last_synced_at,
        last_synced_relative: mapping
            .last_synced_at
            .map(|timestamp| format_relative_time(timestamp, now_ms)),
    }
}

pub fn format_mapping_lines(items: &[MappingItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let mut line = format!(
                "{}  {:<8}  {:<8}  gist={}  synced={}",
                item.snippet_id,
                item.status,
                if item.sync_enabled { "enabled" } else { "disabled" },
                item.gist_id,
                item.last_synced_relative.as_deref().unwrap_or("never")
            );
            if let Some(error) = &item.error_message {
                line.push_str("  error=");
                line.push_str(error);
            }
            line
        })
        .collect()
}

pub fn conflict_to_item(conflict: &SyncConflict) -> ConflictItem {
    ConflictItem {
        id: conflict.id,
        snippet_id: conflict.snippet_id.to_string(),
        gist_id: conflict.gist_id.clone(),
        created_at: conflict.created_at,
        created_at_iso: format_sync_timestamp(conflict.created_at),
        resolved: conflict.resolved,
        resolution: conflict.resolution.map(|strategy| strategy.to_string()),
        resolved_at: conflict.resolved_at,
    }
}

pub fn format_conflict_lines(items: &[ConflictItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let state = match (item.resolved, item.resolution.as_deref()) {
                (false, _) => "open".to_string(),
                (true, Some(resolution)) => format!("resolved ({resolution})"),
                (true, None) => "closed (unlinked)".to_string(),
            };
            format!(
                "#{:<4}  {}  snippet={}  gist={}  {state}",
                item.id, item.created_at_iso, item.snippet_id, item.gist_id
            )
        })
        .collect()
}

pub fn log_entry_to_item(entry: &SyncLogEntry) -> LogItem {
    LogItem {
        id: entry.id,
        snippet_id: entry.snippet_id.map(|id| id.to_string()),
        gist_id: entry.gist_id.clone(),
        operation: entry.operation.as_str().to_string(),
        status: entry.status.as_str().to_string(),
        message: entry.message.clone(),
        created_at: entry.created_at,
        created_at_iso: format_sync_timestamp(entry.created_at),
    }
}

pub fn format_log_lines(items: &[LogItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let target = item
                .snippet_id
                .as_deref()
                .map_or_else(String::new, |id| format!("  snippet={id}"));
            format!(
                "{}  {:<7}  {:<8}  {}{target}",
                item.created_at_iso, item.status, item.operation, item.message
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}

pub fn current_time_ms() -> i64 {
    Utc::now().timestamp_millis()
}
