//! Three-way change detection against the last-synced baseline

use std::fmt;

use serde::Serialize;

/// Action a mapping needs on this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    NoSync,
    LocalToRemote,
    RemoteToLocal,
    Conflict,
}

impl SyncDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoSync => "no_sync",
            Self::LocalToRemote => "local_to_remote",
            Self::RemoteToLocal => "remote_to_local",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide the direction from baseline and freshly computed checksums
pub fn detect_direction(
    stored_local: &str,
    stored_remote: &str,
    current_local: &str,
    current_remote: &str,
) -> SyncDirection {
    let local_changed = current_local != stored_local;
    let remote_changed = current_remote != stored_remote;
    match (local_changed, remote_changed) {
        (false, false) => SyncDirection::NoSync,
        (true, false) => SyncDirection::LocalToRemote,
        (false, true) => SyncDirection::RemoteToLocal,
        (true, true) => SyncDirection::Conflict,
    }
}
