//! Sync state repository: config row, mappings, conflicts, and audit log

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{
    ConflictStrategy, LogStatus, SnippetId, SyncConfig, SyncConflict, SyncLogEntry, SyncMapping,
    SyncOperation, SyncStatus,
};
use crate::util::now_ms;

/// Values for a freshly linked snippet/gist pair
#[derive(Debug, Clone)]
pub struct NewMapping<'a> {
    pub snippet_id: &'a SnippetId,
    pub gist_id: &'a str,
    pub gist_url: &'a str,
    pub snippet_checksum: &'a str,
    pub gist_checksum: &'a str,
}

/// Both sides captured at conflict-detection time
#[derive(Debug, Clone)]
pub struct NewConflict {
    pub snippet_id: SnippetId,
    pub gist_id: String,
    pub local_snapshot: String,
    pub remote_snapshot: String,
}

/// An audit-log line to append
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub snippet_id: Option<SnippetId>,
    pub gist_id: Option<String>,
    pub operation: SyncOperation,
    pub status: LogStatus,
    pub message: String,
}

impl NewLogEntry {
    pub fn success(operation: SyncOperation, message: impl Into<String>) -> Self {
        Self {
            snippet_id: None,
            gist_id: None,
            operation,
            status: LogStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(operation: SyncOperation, message: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Failed,
            ..Self::success(operation, message)
        }
    }

    /// Attach the snippet and (when known) gist the entry refers to
    #[must_use]
    pub fn for_item(mut self, snippet_id: SnippetId, gist_id: Option<&str>) -> Self {
        self.snippet_id = Some(snippet_id);
        self.gist_id = gist_id.map(str::to_string);
        self
    }
}

/// Trait for sync state storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SyncRepository {
    async fn load_config(&self) -> Result<SyncConfig>;
    async fn save_config(&self, config: &SyncConfig) -> Result<()>;
    /// Reset the config row to defaults, dropping the stored credential
    async fn clear_config(&self) -> Result<()>;
    async fn set_last_full_sync_at(&self, timestamp: i64) -> Result<()>;

    async fn get_mapping(&self, snippet_id: &SnippetId) -> Result<Option<SyncMapping>>;
    async fn list_mappings(&self) -> Result<Vec<SyncMapping>>;
    /// Mappings with `sync_enabled` set, in insertion order
    async fn list_enabled_mappings(&self) -> Result<Vec<SyncMapping>>;
    async fn insert_mapping(&self, mapping: NewMapping<'_>) -> Result<SyncMapping>;
    /// Store fresh baseline checksums and mark the mapping `synced`
    async fn record_sync_success(
        &self,
        snippet_id: &SnippetId,
        snippet_checksum: &str,
        gist_checksum: &str,
    ) -> Result<()>;
    async fn set_mapping_status(
        &self,
        snippet_id: &SnippetId,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<()>;
    async fn set_mapping_enabled(
        &self,
        snippet_id: &SnippetId,
        enabled: bool,
        status: SyncStatus,
    ) -> Result<()>;
    /// Remove a mapping and close the snippet's open conflicts; returns
    /// whether a mapping existed
    async fn delete_mapping(&self, snippet_id: &SnippetId) -> Result<bool>;

    async fn insert_conflict(&self, conflict: NewConflict) -> Result<SyncConflict>;
    async fn get_conflict(&self, id: i64) -> Result<Option<SyncConflict>>;
    /// Newest unresolved conflict recorded against this snippet/gist pair
    async fn find_open_conflict(
        &self,
        snippet_id: &SnippetId,
        gist_id: &str,
    ) -> Result<Option<SyncConflict>>;
    async fn list_conflicts(&self, include_resolved: bool) -> Result<Vec<SyncConflict>>;
    async fn mark_conflict_resolved(&self, id: i64, resolution: ConflictStrategy) -> Result<()>;

    async fn append_log(&self, entry: NewLogEntry) -> Result<()>;
    /// Newest entries first
    async fn list_log(&self, limit: usize) -> Result<Vec<SyncLogEntry>>;
}

/// libSQL implementation of `SyncRepository`
pub struct LibSqlSyncRepository<'a> {
    conn: &'a Connection,
}

const MAPPING_COLUMNS: &str = "id, snippet_id, gist_id, gist_url, sync_enabled, last_synced_at, \
     snippet_checksum, gist_checksum, status, error_message, created_at, updated_at";

const CONFLICT_COLUMNS: &str = "id, snippet_id, gist_id, local_snapshot, remote_snapshot, \
     resolved, resolution, created_at, resolved_at";

impl<'a> LibSqlSyncRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_snippet_id(raw: &str) -> Result<SnippetId> {
        raw.parse()
            .map_err(|_| Error::Database(format!("Invalid snippet id in storage: {raw}")))
    }

    fn parse_mapping(row: &libsql::Row) -> Result<SyncMapping> {
        let snippet_id: String = row.get(1)?;
        let status: String = row.get(8)?;
        Ok(SyncMapping {
            id: row.get(0)?,
            snippet_id: Self::parse_snippet_id(&snippet_id)?,
            gist_id: row.get(2)?,
            gist_url: row.get(3)?,
            sync_enabled: row.get::<i64>(4)? != 0,
            last_synced_at: row.get(5)?,
            snippet_checksum: row.get(6)?,
            gist_checksum: row.get(7)?,
            status: status.parse().map_err(Error::Database)?,
            error_message: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn parse_conflict(row: &libsql::Row) -> Result<SyncConflict> {
        let snippet_id: String = row.get(1)?;
        let resolution: Option<String> = row.get(6)?;
        Ok(SyncConflict {
            id: row.get(0)?,
            snippet_id: Self::parse_snippet_id(&snippet_id)?,
            gist_id: row.get(2)?,
            local_snapshot: row.get(3)?,
            remote_snapshot: row.get(4)?,
            resolved: row.get::<i64>(5)? != 0,
            resolution: resolution
                .map(|value| value.parse::<ConflictStrategy>())
                .transpose()
                .map_err(Error::Database)?,
            created_at: row.get(7)?,
            resolved_at: row.get(8)?,
        })
    }

    fn parse_log_entry(row: &libsql::Row) -> Result<SyncLogEntry> {
        let snippet_id: Option<String> = row.get(1)?;
        let operation: String = row.get(3)?;
        let status: String = row.get(4)?;
        Ok(SyncLogEntry {
            id: row.get(0)?,
            snippet_id: snippet_id
                .as_deref()
                .map(Self::parse_snippet_id)
                .transpose()?,
            gist_id: row.get(2)?,
            operation: operation.parse().map_err(Error::Database)?,
            status: status.parse().map_err(Error::Database)?,
            message: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    async fn query_mappings(&self, sql: &str) -> Result<Vec<SyncMapping>> {
        let mut rows = self.conn.query(sql, ()).await?;
        let mut mappings = Vec::new();
        while let Some(row) = rows.next().await? {
            mappings.push(Self::parse_mapping(&row)?);
        }
        Ok(mappings)
    }
}

impl SyncRepository for LibSqlSyncRepository<'_> {
    async fn load_config(&self) -> Result<SyncConfig> {
        let mut rows = self
            .conn
            .query(
                "SELECT enabled, github_token_encrypted, github_username, auto_sync,
                    sync_interval_minutes, conflict_strategy, last_full_sync_at
                 FROM sync_config WHERE id = 1",
                (),
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(SyncConfig::default());
        };

        let strategy: String = row.get(5)?;
        let interval: i64 = row.get(4)?;
        Ok(SyncConfig {
            enabled: row.get::<i64>(0)? != 0,
            github_token_encrypted: row.get(1)?,
            github_username: row.get(2)?,
            auto_sync: row.get::<i64>(3)? != 0,
            sync_interval_minutes: u32::try_from(interval).map_err(|_| {
                Error::Database(format!("Invalid sync interval in storage: {interval}"))
            })?,
            conflict_strategy: strategy.parse().map_err(Error::Database)?,
            last_full_sync_at: row.get(6)?,
        })
    }

    async fn save_config(&self, config: &SyncConfig) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO sync_config (id, enabled, github_token_encrypted,
                    github_username, auto_sync, sync_interval_minutes, conflict_strategy,
                    last_full_sync_at)
                 VALUES (1, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    i64::from(config.enabled),
                    config.github_token_encrypted.clone(),
                    config.github_username.clone(),
                    i64::from(config.auto_sync),
                    i64::from(config.sync_interval_minutes),
                    config.conflict_strategy.as_str(),
                    config.last_full_sync_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn clear_config(&self) -> Result<()> {
        self.save_config(&SyncConfig::default()).await
    }

    async fn set_last_full_sync_at(&self, timestamp: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_config SET last_full_sync_at = ? WHERE id = 1",
                params![timestamp],
            )
            .await?;
        Ok(())
    }

    async fn get_mapping(&self, snippet_id: &SnippetId) -> Result<Option<SyncMapping>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {MAPPING_COLUMNS} FROM sync_mappings WHERE snippet_id = ?"),
                [snippet_id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_mapping(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_mappings(&self) -> Result<Vec<SyncMapping>> {
        self.query_mappings(&format!(
            "SELECT {MAPPING_COLUMNS} FROM sync_mappings ORDER BY id ASC"
        ))
        .await
    }

    async fn list_enabled_mappings(&self) -> Result<Vec<SyncMapping>> {
        self.query_mappings(&format!(
            "SELECT {MAPPING_COLUMNS} FROM sync_mappings WHERE sync_enabled = 1 ORDER BY id ASC"
        ))
        .await
    }

    async fn insert_mapping(&self, mapping: NewMapping<'_>) -> Result<SyncMapping> {
        let now = now_ms();
        self.conn
            .execute(
                "INSERT INTO sync_mappings (snippet_id, gist_id, gist_url, sync_enabled,
                    last_synced_at, snippet_checksum, gist_checksum, status, error_message,
                    created_at, updated_at)
                 VALUES (?, ?, ?, 1, ?, ?, ?, 'synced', NULL, ?, ?)",
                params![
                    mapping.snippet_id.as_str(),
                    mapping.gist_id,
                    mapping.gist_url,
                    now,
                    mapping.snippet_checksum,
                    mapping.gist_checksum,
                    now,
                    now
                ],
            )
            .await?;

        self.get_mapping(mapping.snippet_id)
            .await?
            .ok_or_else(|| Error::NotFound(mapping.snippet_id.to_string()))
    }

    async fn record_sync_success(
        &self,
        snippet_id: &SnippetId,
        snippet_checksum: &str,
        gist_checksum: &str,
    ) -> Result<()> {
        let now = now_ms();
        let rows = self
            .conn
            .execute(
                "UPDATE sync_mappings SET snippet_checksum = ?, gist_checksum = ?,
                    status = 'synced', error_message = NULL, last_synced_at = ?, updated_at = ?
                 WHERE snippet_id = ?",
                params![snippet_checksum, gist_checksum, now, now, snippet_id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("sync mapping for {snippet_id}")));
        }
        Ok(())
    }

    async fn set_mapping_status(
        &self,
        snippet_id: &SnippetId,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_mappings SET status = ?, error_message = ?, updated_at = ?
                 WHERE snippet_id = ?",
                params![status.as_str(), error_message, now_ms(), snippet_id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn set_mapping_enabled(
        &self,
        snippet_id: &SnippetId,
        enabled: bool,
        status: SyncStatus,
    ) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE sync_mappings SET sync_enabled = ?, status = ?, updated_at = ?
                 WHERE snippet_id = ?",
                params![
                    i64::from(enabled),
                    status.as_str(),
                    now_ms(),
                    snippet_id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("sync mapping for {snippet_id}")));
        }
        Ok(())
    }

    async fn delete_mapping(&self, snippet_id: &SnippetId) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM sync_mappings WHERE snippet_id = ?",
                [snippet_id.as_str()],
            )
            .await?;

        // Closed without a resolution: neither side was applied.
        self.conn
            .execute(
                "UPDATE sync_conflicts SET resolved = 1, resolved_at = ?
                 WHERE snippet_id = ? AND resolved = 0",
                params![now_ms(), snippet_id.as_str()],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn insert_conflict(&self, conflict: NewConflict) -> Result<SyncConflict> {
        self.conn
            .execute(
                "INSERT INTO sync_conflicts (snippet_id, gist_id, local_snapshot,
                    remote_snapshot, resolved, created_at)
                 VALUES (?, ?, ?, ?, 0, ?)",
                params![
                    conflict.snippet_id.as_str(),
                    conflict.gist_id.as_str(),
                    conflict.local_snapshot.as_str(),
                    conflict.remote_snapshot.as_str(),
                    now_ms()
                ],
            )
            .await?;

        let id = self.conn.last_insert_rowid();
        self.get_conflict(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync conflict {id}")))
    }

    async fn get_conflict(&self, id: i64) -> Result<Option<SyncConflict>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CONFLICT_COLUMNS} FROM sync_conflicts WHERE id = ?"),
                params![id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_conflict(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_open_conflict(
        &self,
        snippet_id: &SnippetId,
        gist_id: &str,
    ) -> Result<Option<SyncConflict>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {CONFLICT_COLUMNS} FROM sync_conflicts
                     WHERE snippet_id = ? AND gist_id = ? AND resolved = 0
                     ORDER BY id DESC LIMIT 1"
                ),
                params![snippet_id.as_str(), gist_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_conflict(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_conflicts(&self, include_resolved: bool) -> Result<Vec<SyncConflict>> {
        let filter = if include_resolved {
            ""
        } else {
            "WHERE resolved = 0"
        };
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CONFLICT_COLUMNS} FROM sync_conflicts {filter} ORDER BY id DESC"),
                (),
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }

    async fn mark_conflict_resolved(&self, id: i64, resolution: ConflictStrategy) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE sync_conflicts SET resolved = 1, resolution = ?, resolved_at = ?
                 WHERE id = ? AND resolved = 0",
                params![resolution.as_str(), now_ms(), id],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("unresolved sync conflict {id}")));
        }
        Ok(())
    }

    async fn append_log(&self, entry: NewLogEntry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_log (snippet_id, gist_id, operation, status, message, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    entry.snippet_id.map(|id| id.as_str()),
                    entry.gist_id,
                    entry.operation.as_str(),
                    entry.status.as_str(),
                    entry.message,
                    now_ms()
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_log(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, snippet_id, gist_id, operation, status, message, created_at
                 FROM sync_log ORDER BY id DESC LIMIT ?",
                params![limit as i64],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(Self::parse_log_entry(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn new_mapping<'a>(snippet_id: &'a SnippetId, gist_id: &'a str) -> NewMapping<'a> {
        NewMapping {
            snippet_id,
            gist_id,
            gist_url: "https://gist.github.com/abc",
            snippet_checksum: "local-0",
            gist_checksum: "remote-0",
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_default_config() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());

        let config = repo.load_config().await.unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_load_and_clear_config() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());

        let config = SyncConfig {
            enabled: true,
            github_token_encrypted: Some("cipher".to_string()),
            github_username: Some("octocat".to_string()),
            auto_sync: true,
            sync_interval_minutes: 30,
            conflict_strategy: ConflictStrategy::NewestWins,
            last_full_sync_at: None,
        };
        repo.save_config(&config).await.unwrap();
        repo.set_last_full_sync_at(1234).await.unwrap();

        let loaded = repo.load_config().await.unwrap();
        assert_eq!(
            loaded,
            SyncConfig {
                last_full_sync_at: Some(1234),
                ..config
            }
        );

        repo.clear_config().await.unwrap();
        assert_eq!(repo.load_config().await.unwrap(), SyncConfig::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mapping_lifecycle() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());
        let snippet_id = SnippetId::new();

        let mapping = repo
            .insert_mapping(new_mapping(&snippet_id, "gist-1"))
            .await
            .unwrap();
        assert_eq!(mapping.status, SyncStatus::Synced);
        assert!(mapping.sync_enabled);
        assert!(mapping.last_synced_at.is_some());

        repo.set_mapping_status(&snippet_id, SyncStatus::Error, Some("boom"))
            .await
            .unwrap();
        let errored = repo.get_mapping(&snippet_id).await.unwrap().unwrap();
        assert_eq!(errored.status, SyncStatus::Error);
        assert_eq!(errored.error_message.as_deref(), Some("boom"));

        repo.record_sync_success(&snippet_id, "local-1", "remote-1")
            .await
            .unwrap();
        let synced = repo.get_mapping(&snippet_id).await.unwrap().unwrap();
        assert_eq!(synced.status, SyncStatus::Synced);
        assert_eq!(synced.error_message, None);
        assert_eq!(synced.snippet_checksum, "local-1");
        assert_eq!(synced.gist_checksum, "remote-1");

        repo.set_mapping_enabled(&snippet_id, false, SyncStatus::Pending)
            .await
            .unwrap();
        assert!(repo.list_enabled_mappings().await.unwrap().is_empty());
        assert_eq!(repo.list_mappings().await.unwrap().len(), 1);

        assert!(repo.delete_mapping(&snippet_id).await.unwrap());
        assert!(!repo.delete_mapping(&snippet_id).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mapping_uniqueness() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());
        let first = SnippetId::new();
        let second = SnippetId::new();

        repo.insert_mapping(new_mapping(&first, "gist-1"))
            .await
            .unwrap();
        // Same gist for another snippet
        assert!(repo
            .insert_mapping(new_mapping(&second, "gist-1"))
            .await
            .is_err());
        // Same snippet for another gist
        assert!(repo
            .insert_mapping(new_mapping(&first, "gist-2"))
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_conflict_lifecycle() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());
        let snippet_id = SnippetId::new();

        let conflict = repo
            .insert_conflict(NewConflict {
                snippet_id,
                gist_id: "gist-1".to_string(),
                local_snapshot: "{}".to_string(),
                remote_snapshot: "{}".to_string(),
            })
            .await
            .unwrap();
        assert!(!conflict.resolved);
        assert_eq!(
            repo.find_open_conflict(&snippet_id, "gist-1").await.unwrap(),
            Some(conflict.clone())
        );
        assert!(repo
            .find_open_conflict(&snippet_id, "gist-2")
            .await
            .unwrap()
            .is_none());

        repo.mark_conflict_resolved(conflict.id, ConflictStrategy::LocalWins)
            .await
            .unwrap();
        let resolved = repo.get_conflict(conflict.id).await.unwrap().unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolution, Some(ConflictStrategy::LocalWins));
        assert!(resolved.resolved_at.is_some());

        assert!(repo
            .find_open_conflict(&snippet_id, "gist-1")
            .await
            .unwrap()
            .is_none());
        assert!(repo.list_conflicts(false).await.unwrap().is_empty());
        assert_eq!(repo.list_conflicts(true).await.unwrap().len(), 1);

        // Resolving twice is rejected
        assert!(repo
            .mark_conflict_resolved(conflict.id, ConflictStrategy::RemoteWins)
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_mapping_closes_open_conflicts() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());
        let snippet_id = SnippetId::new();

        repo.insert_mapping(new_mapping(&snippet_id, "gist-1"))
            .await
            .unwrap();
        let conflict = repo
            .insert_conflict(NewConflict {
                snippet_id,
                gist_id: "gist-1".to_string(),
                local_snapshot: "{}".to_string(),
                remote_snapshot: "{}".to_string(),
            })
            .await
            .unwrap();

        assert!(repo.delete_mapping(&snippet_id).await.unwrap());

        let closed = repo.get_conflict(conflict.id).await.unwrap().unwrap();
        assert!(closed.resolved);
        assert_eq!(closed.resolution, None);
        assert!(closed.resolved_at.is_some());
        assert!(repo.list_conflicts(false).await.unwrap().is_empty());
        assert!(repo
            .find_open_conflict(&snippet_id, "gist-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_log_newest_first() {
        let db = setup().await;
        let repo = LibSqlSyncRepository::new(db.connection());
        let snippet_id = SnippetId::new();

        repo.append_log(NewLogEntry::success(SyncOperation::Sync, "pass finished"))
            .await
            .unwrap();
        repo.append_log(
            NewLogEntry::failed(SyncOperation::Update, "HTTP 502").for_item(snippet_id, Some("g")),
        )
        .await
        .unwrap();

        let entries = repo.list_log(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, SyncOperation::Update);
        assert_eq!(entries[0].status, LogStatus::Failed);
        assert_eq!(entries[0].snippet_id, Some(snippet_id));
        assert_eq!(entries[0].gist_id.as_deref(), Some("g"));
        assert_eq!(entries[1].snippet_id, None);

        assert_eq!(repo.list_log(1).await.unwrap().len(), 1);
    }
}
