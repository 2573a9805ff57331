//! Per-item sync state machine and full passes over linked snippets.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::checksum::{gist_checksum, snippet_checksum};
use super::convert::{gist_to_snippet, snippet_to_gist};
use super::direction::{detect_direction, SyncDirection};
use super::locks::SyncLocks;
use crate::db::{NewConflict, NewLogEntry, NewMapping};
use crate::error::{Error, Result};
use crate::gist::{MirrorClient, MirrorError};
use crate::models::{
    ConflictResolution, ConflictStrategy, Gist, Snippet, SnippetId, SyncConflict, SyncMapping,
    SyncOperation, SyncStatus,
};
use crate::services::DatabaseService;

/// Result of syncing one mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Neither side changed
    Unchanged,
    /// Local edits were written to the gist
    Pushed,
    /// Gist edits were written to the local snippet
    Pulled,
    /// Both sides changed; waiting for a resolution
    Conflict,
    /// Both sides changed and the configured strategy settled it
    Resolved(ConflictResolution),
    /// Another caller is syncing this snippet right now
    Busy,
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("unchanged"),
            Self::Pushed => f.write_str("pushed local changes"),
            Self::Pulled => f.write_str("pulled remote changes"),
            Self::Conflict => f.write_str("conflict"),
            Self::Resolved(side) => write!(f, "conflict resolved ({})", ConflictStrategy::from(*side)),
            Self::Busy => f.write_str("already syncing"),
        }
    }
}

/// Tally of a full pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: usize,
    pub synced: usize,
    pub conflicts: usize,
    pub errors: usize,
    pub messages: Vec<String>,
}

/// Tally of linking every unlinked snippet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnableAllReport {
    pub processed: usize,
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
    pub messages: Vec<String>,
}

/// Sync engine bound to one mirror client and conflict strategy
pub struct SyncEngine {
    db: DatabaseService,
    client: Arc<dyn MirrorClient>,
    strategy: ConflictStrategy,
    locks: SyncLocks,
}

impl SyncEngine {
    pub fn new(
        db: DatabaseService,
        client: Arc<dyn MirrorClient>,
        strategy: ConflictStrategy,
        locks: SyncLocks,
    ) -> Self {
        Self {
            db,
            client,
            strategy,
            locks,
        }
    }

    /// Sync every enabled mapping. Item failures are counted, not raised.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        let mappings = self.db.list_enabled_mappings().await?;
        let mut report = SyncReport::default();

        for mapping in &mappings {
            report.processed += 1;
            match self.sync_item(mapping).await {
                Ok(ItemOutcome::Conflict) => report.conflicts += 1,
                Ok(ItemOutcome::Busy) => report
                    .messages
                    .push(format!("{}: {}", mapping.snippet_id, ItemOutcome::Busy)),
                Ok(_) => report.synced += 1,
                Err(error) => {
                    report.errors += 1;
                    report
                        .messages
                        .push(format!("{}: {error}", mapping.snippet_id));
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            synced = report.synced,
            conflicts = report.conflicts,
            errors = report.errors,
            "Sync pass finished"
        );
        let summary = format!(
            "Sync pass: {} processed, {} synced, {} conflicts, {} errors",
            report.processed, report.synced, report.conflicts, report.errors
        );
        let entry = if report.errors == 0 {
            NewLogEntry::success(SyncOperation::Sync, summary)
        } else {
            NewLogEntry::failed(SyncOperation::Sync, summary)
        };
        self.db.append_log(entry).await?;

        Ok(report)
    }

    /// Sync one linked snippet now
    pub async fn sync_snippet(&self, snippet_id: &SnippetId) -> Result<ItemOutcome> {
        let mapping = self.require_mapping(snippet_id).await?;
        if !mapping.sync_enabled {
            return Err(Error::InvalidInput(format!(
                "Sync is disabled for snippet {snippet_id}"
            )));
        }
        self.sync_item(&mapping).await
    }

    /// Link a snippet to a new gist, or re-enable an existing link
    pub async fn enable_sync(&self, snippet_id: &SnippetId) -> Result<SyncMapping> {
        if let Some(mapping) = self.db.get_mapping(snippet_id).await? {
            if !mapping.sync_enabled {
                self.db
                    .set_mapping_enabled(snippet_id, true, SyncStatus::Pending)
                    .await?;
                self.db
                    .append_log(
                        NewLogEntry::success(SyncOperation::Update, "Sync re-enabled")
                            .for_item(*snippet_id, Some(&mapping.gist_id)),
                    )
                    .await?;
            }
            return self.require_mapping(snippet_id).await;
        }

        let Some(_guard) = self.locks.try_acquire(*snippet_id) else {
            return Err(Error::InvalidInput(format!(
                "Snippet {snippet_id} is already syncing"
            )));
        };

        let snippet = self.require_snippet(snippet_id).await?;
        match self.create_remote(&snippet).await {
            Ok(mapping) => Ok(mapping),
            Err(error) => {
                tracing::warn!(snippet_id = %snippet_id, "Failed to create gist: {error}");
                self.db
                    .append_log(
                        NewLogEntry::failed(SyncOperation::Create, error.to_string())
                            .for_item(*snippet_id, None),
                    )
                    .await?;
                Err(error)
            }
        }
    }

    /// Link every snippet that has no mapping yet
    pub async fn enable_sync_all(&self) -> Result<EnableAllReport> {
        let linked = self
            .db
            .list_mappings()
            .await?
            .into_iter()
            .map(|mapping| mapping.snippet_id)
            .collect::<HashSet<_>>();
        let mut report = EnableAllReport::default();

        for snippet_id in self.db.list_snippet_ids().await? {
            report.processed += 1;
            if linked.contains(&snippet_id) {
                report.skipped += 1;
                continue;
            }
            match self.enable_sync(&snippet_id).await {
                Ok(_) => report.created += 1,
                Err(error) => {
                    report.errors += 1;
                    report.messages.push(format!("{snippet_id}: {error}"));
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            created = report.created,
            skipped = report.skipped,
            errors = report.errors,
            "Enabled sync for all snippets"
        );
        Ok(report)
    }

    /// Stop syncing a snippet. With `delete_remote` the gist is deleted and
    /// the mapping removed; otherwise the mapping is kept but disabled.
    pub async fn disable_sync(&self, snippet_id: &SnippetId, delete_remote: bool) -> Result<()> {
        let mapping = self.require_mapping(snippet_id).await?;
        let Some(_guard) = self.locks.try_acquire(*snippet_id) else {
            return Err(Error::InvalidInput(format!(
                "Snippet {snippet_id} is already syncing"
            )));
        };

        if !delete_remote {
            self.db
                .set_mapping_enabled(snippet_id, false, mapping.status)
                .await?;
            return self
                .db
                .append_log(
                    NewLogEntry::success(SyncOperation::Update, "Sync disabled")
                        .for_item(*snippet_id, Some(&mapping.gist_id)),
                )
                .await;
        }

        match self.client.delete(&mapping.gist_id).await {
            Ok(()) | Err(MirrorError::NotFound(_)) => {}
            Err(error) => {
                self.db
                    .append_log(
                        NewLogEntry::failed(SyncOperation::Delete, error.to_string())
                            .for_item(*snippet_id, Some(&mapping.gist_id)),
                    )
                    .await?;
                return Err(error.into());
            }
        }
        self.db.delete_mapping(snippet_id).await?;
        tracing::info!(snippet_id = %snippet_id, gist_id = %mapping.gist_id, "Deleted gist");
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Delete, "Deleted gist and removed mapping")
                    .for_item(*snippet_id, Some(&mapping.gist_id)),
            )
            .await
    }

    /// Settle an open conflict by keeping one side
    pub async fn resolve_conflict(
        &self,
        conflict_id: i64,
        resolution: ConflictResolution,
    ) -> Result<SyncMapping> {
        let conflict = self
            .db
            .get_conflict(conflict_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync conflict {conflict_id}")))?;
        if conflict.resolved {
            return Err(Error::InvalidInput(format!(
                "Conflict {conflict_id} is already resolved"
            )));
        }

        let mapping = self.require_mapping(&conflict.snippet_id).await?;
        if conflict.gist_id != mapping.gist_id {
            return Err(Error::InvalidInput(format!(
                "Conflict {conflict_id} was recorded against gist {}, which is no longer linked",
                conflict.gist_id
            )));
        }
        let Some(_guard) = self.locks.try_acquire(mapping.snippet_id) else {
            return Err(Error::InvalidInput(format!(
                "Snippet {} is already syncing",
                mapping.snippet_id
            )));
        };

        let outcome = async {
            let snippet = self.require_snippet(&mapping.snippet_id).await?;
            let gist = self.client.get(&mapping.gist_id).await?;
            self.apply_resolution(&conflict, &mapping, &snippet, &gist, resolution, resolution.into())
                .await
        }
        .await;
        if let Err(error) = &outcome {
            self.record_failure(&mapping, error).await;
        }
        outcome?;

        self.require_mapping(&mapping.snippet_id).await
    }

    async fn sync_item(&self, mapping: &SyncMapping) -> Result<ItemOutcome> {
        let Some(_guard) = self.locks.try_acquire(mapping.snippet_id) else {
            tracing::debug!(snippet_id = %mapping.snippet_id, "Skipping snippet already syncing");
            return Ok(ItemOutcome::Busy);
        };

        match self.sync_mapping(mapping).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.record_failure(mapping, &error).await;
                Err(error)
            }
        }
    }

    async fn sync_mapping(&self, mapping: &SyncMapping) -> Result<ItemOutcome> {
        let open_conflict = self
            .db
            .find_open_conflict(&mapping.snippet_id, &mapping.gist_id)
            .await?;
        if open_conflict.is_some() && self.strategy == ConflictStrategy::Manual {
            if mapping.status != SyncStatus::Conflict {
                self.db
                    .set_mapping_status(&mapping.snippet_id, SyncStatus::Conflict, None)
                    .await?;
            }
            return Ok(ItemOutcome::Conflict);
        }

        let snippet = self.require_snippet(&mapping.snippet_id).await?;
        let gist = self.client.get(&mapping.gist_id).await?;

        if let Some(conflict) = open_conflict {
            return self.resolve_automatically(&conflict, mapping, &snippet, &gist).await;
        }

        let current_local = snippet_checksum(&snippet)?;
        let current_remote = gist_checksum(&gist)?;
        let direction = detect_direction(
            &mapping.snippet_checksum,
            &mapping.gist_checksum,
            &current_local,
            &current_remote,
        );
        tracing::debug!(
            snippet_id = %mapping.snippet_id,
            gist_id = %mapping.gist_id,
            direction = %direction,
            "Computed sync direction"
        );

        match direction {
            SyncDirection::NoSync => {
                if mapping.status != SyncStatus::Synced {
                    self.db
                        .set_mapping_status(&mapping.snippet_id, SyncStatus::Synced, None)
                        .await?;
                }
                Ok(ItemOutcome::Unchanged)
            }
            SyncDirection::LocalToRemote => {
                self.push_local(mapping, &snippet, &gist).await?;
                Ok(ItemOutcome::Pushed)
            }
            SyncDirection::RemoteToLocal => {
                self.pull_remote(mapping, &snippet, &gist).await?;
                Ok(ItemOutcome::Pulled)
            }
            SyncDirection::Conflict => {
                let conflict = self.record_conflict(mapping, &snippet, &gist).await?;
                if self.strategy == ConflictStrategy::Manual {
                    return Ok(ItemOutcome::Conflict);
                }
                self.resolve_automatically(&conflict, mapping, &snippet, &gist)
                    .await
            }
        }
    }

    async fn resolve_automatically(
        &self,
        conflict: &SyncConflict,
        mapping: &SyncMapping,
        snippet: &Snippet,
        gist: &Gist,
    ) -> Result<ItemOutcome> {
        let Some(side) = self.strategy.choose(snippet, gist) else {
            return Ok(ItemOutcome::Conflict);
        };
        self.apply_resolution(conflict, mapping, snippet, gist, side, self.strategy)
            .await?;
        Ok(ItemOutcome::Resolved(side))
    }

    async fn apply_resolution(
        &self,
        conflict: &SyncConflict,
        mapping: &SyncMapping,
        snippet: &Snippet,
        gist: &Gist,
        side: ConflictResolution,
        recorded: ConflictStrategy,
    ) -> Result<()> {
        match side {
            ConflictResolution::LocalWins => self.push_local(mapping, snippet, gist).await?,
            ConflictResolution::RemoteWins => self.pull_remote(mapping, snippet, gist).await?,
        }
        self.db.mark_conflict_resolved(conflict.id, recorded).await?;

        tracing::info!(
            snippet_id = %mapping.snippet_id,
            conflict_id = conflict.id,
            strategy = %recorded,
            "Resolved sync conflict"
        );
        self.db
            .append_log(
                NewLogEntry::success(
                    SyncOperation::Conflict,
                    format!(
                        "Conflict {} resolved with {}",
                        conflict.id,
                        ConflictStrategy::from(side)
                    ),
                )
                .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
            )
            .await
    }

    async fn create_remote(&self, snippet: &Snippet) -> Result<SyncMapping> {
        let payload = snippet_to_gist(snippet)?;
        let gist = self.client.create(&payload).await?;

        let local_checksum = snippet_checksum(snippet)?;
        let remote_checksum = gist_checksum(&gist)?;
        let inserted = self
            .db
            .insert_mapping(NewMapping {
                snippet_id: &snippet.id,
                gist_id: &gist.id,
                gist_url: &gist.html_url,
                snippet_checksum: &local_checksum,
                gist_checksum: &remote_checksum,
            })
            .await;

        let mapping = match inserted {
            Ok(mapping) => mapping,
            Err(error) => {
                // Don't leave an orphaned gist behind.
                if let Err(cleanup) = self.client.delete(&gist.id).await {
                    tracing::warn!(gist_id = %gist.id, "Failed to delete orphaned gist: {cleanup}");
                }
                return Err(error);
            }
        };

        tracing::info!(snippet_id = %snippet.id, gist_id = %gist.id, "Created gist");
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Create, format!("Created gist {}", gist.id))
                    .for_item(snippet.id, Some(&gist.id)),
            )
            .await?;
        Ok(mapping)
    }

    async fn push_local(&self, mapping: &SyncMapping, snippet: &Snippet, gist: &Gist) -> Result<()> {
        let payload = snippet_to_gist(snippet)?;
        let removed_files = payload.removed_files(gist);
        let updated = self
            .client
            .update(&mapping.gist_id, &payload, &removed_files)
            .await?;

        let local_checksum = snippet_checksum(snippet)?;
        let remote_checksum = gist_checksum(&updated)?;
        self.db
            .record_sync_success(&mapping.snippet_id, &local_checksum, &remote_checksum)
            .await?;
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Update, "Pushed local changes to gist")
                    .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
            )
            .await?;

        // GitHub has no API for changing visibility after creation.
        if updated.public != payload.public {
            let visibility = if updated.public { "public" } else { "secret" };
            tracing::warn!(
                snippet_id = %mapping.snippet_id,
                gist_id = %mapping.gist_id,
                "Gist visibility can't be changed remotely"
            );
            self.db
                .append_log(
                    NewLogEntry::failed(
                        SyncOperation::Update,
                        format!("GitHub cannot change gist visibility; the gist stays {visibility}"),
                    )
                    .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
                )
                .await?;
        }
        Ok(())
    }

    async fn pull_remote(&self, mapping: &SyncMapping, snippet: &Snippet, gist: &Gist) -> Result<()> {
        let converted = gist_to_snippet(gist, Some(snippet));
        let stored = self.db.update_snippet(&converted).await?;

        let local_checksum = snippet_checksum(&stored)?;
        let remote_checksum = gist_checksum(gist)?;
        self.db
            .record_sync_success(&mapping.snippet_id, &local_checksum, &remote_checksum)
            .await?;
        self.db
            .append_log(
                NewLogEntry::success(SyncOperation::Update, "Pulled gist changes into snippet")
                    .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
            )
            .await
    }

    async fn record_conflict(
        &self,
        mapping: &SyncMapping,
        snippet: &Snippet,
        gist: &Gist,
    ) -> Result<SyncConflict> {
        let conflict = self
            .db
            .insert_conflict(NewConflict {
                snippet_id: mapping.snippet_id,
                gist_id: mapping.gist_id.clone(),
                local_snapshot: serde_json::to_string(snippet)?,
                remote_snapshot: serde_json::to_string(gist)?,
            })
            .await?;
        self.db
            .set_mapping_status(&mapping.snippet_id, SyncStatus::Conflict, None)
            .await?;

        tracing::warn!(
            snippet_id = %mapping.snippet_id,
            gist_id = %mapping.gist_id,
            conflict_id = conflict.id,
            "Both sides changed since last sync"
        );
        self.db
            .append_log(
                NewLogEntry::success(
                    SyncOperation::Conflict,
                    format!("Conflict {} detected: both sides changed", conflict.id),
                )
                .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
            )
            .await?;
        Ok(conflict)
    }

    /// Mark the mapping failed and log it; bookkeeping errors are only logged
    async fn record_failure(&self, mapping: &SyncMapping, error: &Error) {
        let message = error.to_string();
        tracing::warn!(
            snippet_id = %mapping.snippet_id,
            gist_id = %mapping.gist_id,
            "Sync failed: {message}"
        );

        if let Err(status_error) = self
            .db
            .set_mapping_status(&mapping.snippet_id, SyncStatus::Error, Some(&message))
            .await
        {
            tracing::warn!("Failed to record sync error on mapping: {status_error}");
        }
        if let Err(log_error) = self
            .db
            .append_log(
                NewLogEntry::failed(SyncOperation::Sync, message)
                    .for_item(mapping.snippet_id, Some(&mapping.gist_id)),
            )
            .await
        {
            tracing::warn!("Failed to append sync log entry: {log_error}");
        }
    }

    async fn require_mapping(&self, snippet_id: &SnippetId) -> Result<SyncMapping> {
        self.db
            .get_mapping(snippet_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sync mapping for {snippet_id}")))
    }

    async fn require_snippet(&self, snippet_id: &SnippetId) -> Result<Snippet> {
        self.db
            .get_snippet(snippet_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("snippet {snippet_id}")))
    }
}
