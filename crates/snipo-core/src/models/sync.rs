//! Sync configuration, mapping, conflict, and audit-log models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::gist::Gist;
use super::snippet::{Snippet, SnippetId};

/// Smallest allowed automatic sync interval
pub const MIN_SYNC_INTERVAL_MINUTES: u32 = 5;

const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 15;

/// How a detected conflict is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Leave the conflict for an explicit caller choice
    #[default]
    Manual,
    LocalWins,
    RemoteWins,
    /// Keep whichever side was modified most recently
    NewestWins,
}

impl ConflictStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::LocalWins => "local-wins",
            Self::RemoteWins => "remote-wins",
            Self::NewestWins => "newest-wins",
        }
    }

    /// Pick the winning side for a conflict between `local` and `remote`.
    ///
    /// Returns `None` for [`ConflictStrategy::Manual`]. Newest-wins compares
    /// the local `updated_at` with the gist's `updated_at`; a tie or a gist
    /// without a timestamp keeps the local version.
    pub fn choose(self, local: &Snippet, remote: &Gist) -> Option<ConflictResolution> {
        match self {
            Self::Manual => None,
            Self::LocalWins => Some(ConflictResolution::LocalWins),
            Self::RemoteWins => Some(ConflictResolution::RemoteWins),
            Self::NewestWins => match remote.updated_at_ms() {
                Some(remote_updated_at) if remote_updated_at > local.updated_at => {
                    Some(ConflictResolution::RemoteWins)
                }
                _ => Some(ConflictResolution::LocalWins),
            },
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "local-wins" | "local_wins" => Ok(Self::LocalWins),
            "remote-wins" | "remote_wins" => Ok(Self::RemoteWins),
            "newest-wins" | "newest_wins" => Ok(Self::NewestWins),
            other => Err(format!(
                "unknown conflict strategy '{other}' (expected manual, local-wins, remote-wins, or newest-wins)"
            )),
        }
    }
}

/// Side chosen when a conflict is resolved by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    LocalWins,
    RemoteWins,
}

impl From<ConflictResolution> for ConflictStrategy {
    fn from(value: ConflictResolution) -> Self {
        match value {
            ConflictResolution::LocalWins => Self::LocalWins,
            ConflictResolution::RemoteWins => Self::RemoteWins,
        }
    }
}

impl FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "local-wins" | "local_wins" => Ok(Self::LocalWins),
            "remote" | "remote-wins" | "remote_wins" => Ok(Self::RemoteWins),
            other => Err(format!(
                "unknown resolution '{other}' (expected local-wins or remote-wins)"
            )),
        }
    }
}

/// Process-wide sync configuration (single row)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub enabled: bool,
    /// base64(nonce || ciphertext) of the GitHub token
    pub github_token_encrypted: Option<String>,
    pub github_username: Option<String>,
    pub auto_sync: bool,
    pub sync_interval_minutes: u32,
    pub conflict_strategy: ConflictStrategy,
    /// Last completed full pass (Unix ms)
    pub last_full_sync_at: Option<i64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            github_token_encrypted: None,
            github_username: None,
            auto_sync: false,
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            conflict_strategy: ConflictStrategy::Manual,
            last_full_sync_at: None,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncConfig")
            .field("enabled", &self.enabled)
            .field(
                "github_token_encrypted",
                &self.github_token_encrypted.as_ref().map(|_| "[REDACTED]"),
            )
            .field("github_username", &self.github_username)
            .field("auto_sync", &self.auto_sync)
            .field("sync_interval_minutes", &self.sync_interval_minutes)
            .field("conflict_strategy", &self.conflict_strategy)
            .field("last_full_sync_at", &self.last_full_sync_at)
            .finish()
    }
}

impl SyncConfig {
    pub const fn has_credential(&self) -> bool {
        self.github_token_encrypted.is_some()
    }

    /// Whether the scheduler should run a full pass at `now_ms`
    pub fn is_auto_sync_due(&self, now_ms: i64) -> bool {
        if !self.enabled || !self.auto_sync || !self.has_credential() {
            return false;
        }
        let interval_ms = i64::from(self.sync_interval_minutes) * 60_000;
        self.last_full_sync_at
            .map_or(true, |last| now_ms >= last.saturating_add(interval_ms))
    }
}

/// Partial update of [`SyncConfig`]; `None` leaves a field unchanged
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SyncConfigUpdate {
    pub enabled: Option<bool>,
    /// Plaintext token; encrypted before it is stored
    pub github_token: Option<String>,
    pub auto_sync: Option<bool>,
    pub sync_interval_minutes: Option<u32>,
    pub conflict_strategy: Option<ConflictStrategy>,
}

impl fmt::Debug for SyncConfigUpdate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncConfigUpdate")
            .field("enabled", &self.enabled)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("auto_sync", &self.auto_sync)
            .field("sync_interval_minutes", &self.sync_interval_minutes)
            .field("conflict_strategy", &self.conflict_strategy)
            .finish()
    }
}

/// Durable per-mapping status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Pending,
    Conflict,
    Error,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Conflict => "conflict",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "pending" => Ok(Self::Pending),
            "conflict" => Ok(Self::Conflict),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown sync status '{other}'")),
        }
    }
}

/// Link between one local snippet and one gist
///
/// The two checksums describe both sides as of the last successful sync and
/// are the baseline for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMapping {
    pub id: i64,
    pub snippet_id: SnippetId,
    pub gist_id: String,
    pub gist_url: String,
    pub sync_enabled: bool,
    pub last_synced_at: Option<i64>,
    pub snippet_checksum: String,
    pub gist_checksum: String,
    pub status: SyncStatus,
    pub error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Both versions captured when local and remote diverged in the same pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict {
    pub id: i64,
    pub snippet_id: SnippetId,
    pub gist_id: String,
    /// Serialized [`Snippet`] at detection time
    pub local_snapshot: String,
    /// Serialized [`Gist`] at detection time
    pub remote_snapshot: String,
    pub resolved: bool,
    pub resolution: Option<ConflictStrategy>,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
    Sync,
    Conflict,
}

impl SyncOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Sync => "sync",
            Self::Conflict => "conflict",
        }
    }
}

impl FromStr for SyncOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "sync" => Ok(Self::Sync),
            "conflict" => Ok(Self::Conflict),
            other => Err(format!("unknown sync operation '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
}

impl LogStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown log status '{other}'")),
        }
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub snippet_id: Option<SnippetId>,
    pub gist_id: Option<String>,
    pub operation: SyncOperation,
    pub status: LogStatus,
    pub message: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gist_updated_at(rfc3339: Option<&str>) -> Gist {
        let updated = rfc3339.map_or("null".to_string(), |value| format!("\"{value}\""));
        serde_json::from_str(&format!(r#"{{"id":"g1","updated_at":{updated}}}"#)).unwrap()
    }

    #[test]
    fn strategy_parse_roundtrip() {
        for strategy in [
            ConflictStrategy::Manual,
            ConflictStrategy::LocalWins,
            ConflictStrategy::RemoteWins,
            ConflictStrategy::NewestWins,
        ] {
            assert_eq!(strategy.as_str().parse::<ConflictStrategy>(), Ok(strategy));
        }
        assert!("oldest-wins".parse::<ConflictStrategy>().is_err());
    }

    #[test]
    fn manual_strategy_chooses_nothing() {
        let snippet = Snippet::new("t", "c");
        let gist = gist_updated_at(None);
        assert_eq!(ConflictStrategy::Manual.choose(&snippet, &gist), None);
    }

    #[test]
    fn newest_wins_compares_timestamps() {
        let mut snippet = Snippet::new("t", "c");

        snippet.updated_at = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .timestamp_millis();
        let newer_remote = gist_updated_at(Some("2024-06-01T00:00:00Z"));
        assert_eq!(
            ConflictStrategy::NewestWins.choose(&snippet, &newer_remote),
            Some(ConflictResolution::RemoteWins)
        );

        let older_remote = gist_updated_at(Some("2023-06-01T00:00:00Z"));
        assert_eq!(
            ConflictStrategy::NewestWins.choose(&snippet, &older_remote),
            Some(ConflictResolution::LocalWins)
        );

        let undated_remote = gist_updated_at(None);
        assert_eq!(
            ConflictStrategy::NewestWins.choose(&snippet, &undated_remote),
            Some(ConflictResolution::LocalWins)
        );
    }

    #[test]
    fn auto_sync_due_respects_flags_and_interval() {
        let mut config = SyncConfig {
            enabled: true,
            auto_sync: true,
            github_token_encrypted: Some("ciphertext".to_string()),
            sync_interval_minutes: 5,
            ..SyncConfig::default()
        };
        assert!(config.is_auto_sync_due(1_000));

        config.last_full_sync_at = Some(1_000);
        assert!(!config.is_auto_sync_due(1_000 + 4 * 60_000));
        assert!(config.is_auto_sync_due(1_000 + 5 * 60_000));

        config.auto_sync = false;
        assert!(!config.is_auto_sync_due(i64::MAX));

        config.auto_sync = true;
        config.github_token_encrypted = None;
        assert!(!config.is_auto_sync_due(i64::MAX));
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = SyncConfig {
            github_token_encrypted: Some("secret-ciphertext".to_string()),
            ..SyncConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-ciphertext"));
        assert!(debug.contains("[REDACTED]"));

        let update = SyncConfigUpdate {
            github_token: Some("ghp_secret".to_string()),
            ..SyncConfigUpdate::default()
        };
        assert!(!format!("{update:?}").contains("ghp_secret"));
    }
}
