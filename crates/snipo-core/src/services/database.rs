//! Shared database service wrapper used across clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlSnippetRepository, LibSqlSyncRepository, NewConflict, NewLogEntry, NewMapping,
    SnippetRepository, SyncRepository,
};
use crate::models::{
    ConflictStrategy, Folder, Snippet, SyncConfig, SyncConflict, SyncLogEntry, SyncMapping,
    SyncStatus,
};
use crate::{Result, SnippetId};

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::info!("Opened snippet database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Create a new snippet.
    pub async fn create_snippet(&self, snippet: &Snippet) -> Result<Snippet> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .create(snippet)
            .await
    }

    /// Fetch a snippet by id.
    pub async fn get_snippet(&self, id: &SnippetId) -> Result<Option<Snippet>> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection()).get(id).await
    }

    /// List snippets newest-first.
    pub async fn list_snippets(&self, limit: usize, offset: usize) -> Result<Vec<Snippet>> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .list(limit, offset)
            .await
    }

    /// Ids of every stored snippet, oldest first.
    pub async fn list_snippet_ids(&self) -> Result<Vec<SnippetId>> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .list_ids()
            .await
    }

    /// Replace a snippet's fields, files, tags, and folders.
    pub async fn update_snippet(&self, snippet: &Snippet) -> Result<Snippet> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .update(snippet)
            .await
    }

    /// Delete a snippet.
    pub async fn delete_snippet(&self, id: &SnippetId) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .delete(id)
            .await
    }

    pub async fn create_folder(&self, name: &str) -> Result<Folder> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .create_folder(name)
            .await
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let db = self.db.lock().await;
        LibSqlSnippetRepository::new(db.connection())
            .list_folders()
            .await
    }

    /// Load the sync configuration row.
    pub async fn load_sync_config(&self) -> Result<SyncConfig> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .load_config()
            .await
    }

    /// Save the sync configuration row.
    pub async fn save_sync_config(&self, config: &SyncConfig) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .save_config(config)
            .await
    }

    /// Reset sync configuration to defaults.
    pub async fn clear_sync_config(&self) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .clear_config()
            .await
    }

    pub async fn set_last_full_sync_at(&self, timestamp: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .set_last_full_sync_at(timestamp)
            .await
    }

    pub async fn get_mapping(&self, snippet_id: &SnippetId) -> Result<Option<SyncMapping>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .get_mapping(snippet_id)
            .await
    }

    pub async fn list_mappings(&self) -> Result<Vec<SyncMapping>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .list_mappings()
            .await
    }

    pub async fn list_enabled_mappings(&self) -> Result<Vec<SyncMapping>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .list_enabled_mappings()
            .await
    }

    pub async fn insert_mapping(&self, mapping: NewMapping<'_>) -> Result<SyncMapping> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .insert_mapping(mapping)
            .await
    }

    /// Store new baseline checksums and mark the mapping synced.
    pub async fn record_sync_success(
        &self,
        snippet_id: &SnippetId,
        snippet_checksum: &str,
        gist_checksum: &str,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .record_sync_success(snippet_id, snippet_checksum, gist_checksum)
            .await
    }

    pub async fn set_mapping_status(
        &self,
        snippet_id: &SnippetId,
        status: SyncStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .set_mapping_status(snippet_id, status, error_message)
            .await
    }

    pub async fn set_mapping_enabled(
        &self,
        snippet_id: &SnippetId,
        enabled: bool,
        status: SyncStatus,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .set_mapping_enabled(snippet_id, enabled, status)
            .await
    }

    /// Remove a mapping without touching the snippet or the gist.
    pub async fn delete_mapping(&self, snippet_id: &SnippetId) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .delete_mapping(snippet_id)
            .await
    }

    pub async fn insert_conflict(&self, conflict: NewConflict) -> Result<SyncConflict> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .insert_conflict(conflict)
            .await
    }

    pub async fn get_conflict(&self, id: i64) -> Result<Option<SyncConflict>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .get_conflict(id)
            .await
    }

    pub async fn find_open_conflict(
        &self,
        snippet_id: &SnippetId,
        gist_id: &str,
    ) -> Result<Option<SyncConflict>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .find_open_conflict(snippet_id, gist_id)
            .await
    }

    pub async fn list_conflicts(&self, include_resolved: bool) -> Result<Vec<SyncConflict>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .list_conflicts(include_resolved)
            .await
    }

    pub async fn mark_conflict_resolved(
        &self,
        id: i64,
        resolution: ConflictStrategy,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .mark_conflict_resolved(id, resolution)
            .await
    }

    /// Append an audit-log entry.
    pub async fn append_log(&self, entry: NewLogEntry) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .append_log(entry)
            .await
    }

    /// Most recent audit-log entries, newest first.
    pub async fn list_log(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let db = self.db.lock().await;
        LibSqlSyncRepository::new(db.connection())
            .list_log(limit)
            .await
    }
}
