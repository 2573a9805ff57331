//! Administrative surface over the sync engine and sync state store

use std::sync::Arc;

use super::engine::{EnableAllReport, ItemOutcome, SyncEngine, SyncReport};
use super::locks::SyncLocks;
use crate::crypto::CredentialCipher;
use crate::db::NewLogEntry;
use crate::error::{Error, Result};
use crate::gist::{MirrorClient, MirrorClientFactory};
use crate::models::{
    ConflictResolution, SnippetId, SyncConfig, SyncConfigUpdate, SyncConflict, SyncLogEntry,
    SyncMapping, SyncOperation, MIN_SYNC_INTERVAL_MINUTES,
};
use crate::services::DatabaseService;
use crate::util::{non_blank, now_ms};

/// Entry point for configuration, manual sync, and sync state queries.
///
/// Clones share the database handle and the per-snippet locks, so the
/// scheduler and foreground callers never sync the same snippet at once.
#[derive(Clone)]
pub struct SyncService {
    db: DatabaseService,
    cipher: Option<CredentialCipher>,
    factory: Arc<dyn MirrorClientFactory>,
    locks: SyncLocks,
}

impl SyncService {
    pub fn new(
        db: DatabaseService,
        cipher: Option<CredentialCipher>,
        factory: Arc<dyn MirrorClientFactory>,
    ) -> Self {
        Self {
            db,
            cipher,
            factory,
            locks: SyncLocks::new(),
        }
    }

    pub fn database(&self) -> &DatabaseService {
        &self.db
    }

    fn cipher(&self) -> Result<&CredentialCipher> {
        self.cipher.as_ref().ok_or_else(|| {
            Error::InvalidInput("No secret key configured for credential encryption".to_string())
        })
    }

    pub async fn get_config(&self) -> Result<SyncConfig> {
        self.db.load_sync_config().await
    }

    /// Apply a partial update. A new token is verified against the API and
    /// stored encrypted together with the account login.
    pub async fn update_config(&self, update: SyncConfigUpdate) -> Result<SyncConfig> {
        let mut config = self.db.load_sync_config().await?;

        if let Some(minutes) = update.sync_interval_minutes {
            if minutes < MIN_SYNC_INTERVAL_MINUTES {
                return Err(Error::InvalidInput(format!(
                    "Sync interval must be at least {MIN_SYNC_INTERVAL_MINUTES} minutes"
                )));
            }
            config.sync_interval_minutes = minutes;
        }
        if let Some(strategy) = update.conflict_strategy {
            config.conflict_strategy = strategy;
        }
        if let Some(auto_sync) = update.auto_sync {
            config.auto_sync = auto_sync;
        }
        if let Some(token) = update.github_token {
            let token = non_blank(&token)
                .ok_or_else(|| Error::InvalidInput("GitHub token must not be empty".to_string()))?
                .to_string();
            let sealed = self.cipher()?.encrypt(&token)?;
            let login = self.test_credential(&token).await?;
            config.github_token_encrypted = Some(sealed);
            config.github_username = Some(login);
        }
        if let Some(enabled) = update.enabled {
            if enabled && !config.has_credential() {
                return Err(Error::InvalidInput(
                    "Configure a GitHub token before enabling sync".to_string(),
                ));
            }
            config.enabled = enabled;
        }

        self.db.save_sync_config(&config).await?;
        tracing::info!(
            enabled = config.enabled,
            auto_sync = config.auto_sync,
            interval_minutes = config.sync_interval_minutes,
            strategy = %config.conflict_strategy,
            "Updated sync configuration"
        );
        Ok(config)
    }

    /// Forget the credential and reset all settings. Mappings are kept.
    pub async fn clear_config(&self) -> Result<()> {
        self.db.clear_sync_config().await?;
        tracing::info!("Cleared sync configuration");
        Ok(())
    }

    /// Check a token by asking the API who it belongs to
    pub async fn test_credential(&self, token: &str) -> Result<String> {
        let client = self.factory.connect(token)?;
        Ok(client.whoami().await?)
    }

    /// Build an engine from the stored configuration
    pub async fn engine(&self) -> Result<SyncEngine> {
        let config = self.db.load_sync_config().await?;
        if !config.enabled {
            return Err(Error::InvalidInput("Sync is disabled".to_string()));
        }
        let client = self.connect(&config)?;
        Ok(SyncEngine::new(
            self.db.clone(),
            client,
            config.conflict_strategy,
            self.locks.clone(),
        ))
    }

    fn connect(&self, config: &SyncConfig) -> Result<Arc<dyn MirrorClient>> {
        let sealed = config
            .github_token_encrypted
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("No GitHub token configured".to_string()))?;
        let token = self.cipher()?.decrypt(sealed)?;
        Ok(self.factory.connect(&token)?)
    }

    pub async fn sync_snippet(&self, snippet_id: &SnippetId) -> Result<ItemOutcome> {
        self.engine().await?.sync_snippet(snippet_id).await
    }

    /// Run a full pass now and stamp the last full sync time
    pub async fn sync_all(&self) -> Result<SyncReport> {
        let report = self.engine().await?.sync_all().await?;
        self.db.set_last_full_sync_at(now_ms()).await?;
        Ok(report)
    }

    /// Run a full pass when auto-sync is due at `now`; `None` when it is not
    pub async fn run_due_pass(&self, now: i64) -> Result<Option<SyncReport>> {
        let config = self.db.load_sync_config().await?;
        if !config.is_auto_sync_due(now) {
            return Ok(None);
        }

        tracing::info!("Starting scheduled sync pass");
        let engine = SyncEngine::new(
            self.db.clone(),
            self.connect(&config)?,
            config.conflict_strategy,
            self.locks.clone(),
        );
        let report = engine.sync_all().await?;
        self.db.set_last_full_sync_at(now_ms()).await?;
        Ok(Some(report))
    }

    pub async fn enable_sync(&self, snippet_id: &SnippetId) -> Result<SyncMapping> {
        self.engine().await?.enable_sync(snippet_id).await
    }

    pub async fn enable_sync_all(&self) -> Result<EnableAllReport> {
        self.engine().await?.enable_sync_all().await
    }

    /// Disable a mapping; deleting the gist needs a working credential
    pub async fn disable_sync(&self, snippet_id: &SnippetId, delete_remote: bool) -> Result<()> {
        if delete_remote {
            return self.engine().await?.disable_sync(snippet_id, true).await;
        }

        let mapping = self
            .db
            .get_mapping(snippet_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync mapping for {snippet_id}")))?;
        self.db
            .set_mapping_enabled(snippet_id, false, mapping.status)
            .await?;
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Update, "Sync disabled")
                    .for_item(*snippet_id, Some(&mapping.gist_id)),
            )
            .await
    }

    pub async fn list_mappings(&self) -> Result<Vec<SyncMapping>> {
        self.db.list_mappings().await
    }

    /// Unlink a snippet from its gist, leaving both in place
    pub async fn delete_mapping(&self, snippet_id: &SnippetId) -> Result<()> {
        let mapping = self
            .db
            .get_mapping(snippet_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync mapping for {snippet_id}")))?;
        self.db.delete_mapping(snippet_id).await?;
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Delete, "Mapping removed")
                    .for_item(*snippet_id, Some(&mapping.gist_id)),
            )
            .await
    }

    pub async fn list_conflicts(&self, include_resolved: bool) -> Result<Vec<SyncConflict>> {
        self.db.list_conflicts(include_resolved).await
    }

    pub async fn resolve_conflict(
        &self,
        conflict_id: i64,
        resolution: ConflictResolution,
    ) -> Result<SyncMapping> {
        self.engine()
            .await?
            .resolve_conflict(conflict_id, resolution)
            .await
    }

    pub async fn list_log(&self, limit: usize) -> Result<Vec<SyncLogEntry>> {
        self.db.list_log(limit).await
    }
}
