//! Data models for Snipo

mod gist;
mod snippet;
mod sync;

pub use gist::{Gist, GistFile, GistOwner, GistPayload};
pub(crate) use snippet::normalize_tags;
pub use snippet::{Folder, Snippet, SnippetFile, SnippetId, DEFAULT_LANGUAGE};
pub use sync::{
    ConflictResolution, ConflictStrategy, LogStatus, SyncConfig, SyncConfigUpdate, SyncConflict,
    SyncLogEntry, SyncMapping, SyncOperation, SyncStatus, MIN_SYNC_INTERVAL_MINUTES,
};
