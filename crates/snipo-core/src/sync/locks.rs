//! In-process guard so one snippet is never synced by two callers at once

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::SnippetId;

/// Set of snippet ids currently being synced. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct SyncLocks {
    busy: Arc<Mutex<HashSet<SnippetId>>>,
}

/// Releases the snippet when dropped
#[derive(Debug)]
pub struct SyncLockGuard {
    busy: Arc<Mutex<HashSet<SnippetId>>>,
    snippet_id: SnippetId,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `snippet_id`, or `None` when another caller holds it
    pub fn try_acquire(&self, snippet_id: SnippetId) -> Option<SyncLockGuard> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(snippet_id) {
            return None;
        }
        Some(SyncLockGuard {
            busy: Arc::clone(&self.busy),
            snippet_id,
        })
    }

    #[cfg(test)]
    fn is_busy(&self, snippet_id: &SnippetId) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(snippet_id)
    }
}

impl Drop for SyncLockGuard {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.snippet_id);
    }
}
