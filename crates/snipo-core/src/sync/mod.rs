//! Bidirectional snippet/gist synchronization.
//!
//! Change detection compares each side's current checksum with the
//! baseline stored on the mapping at the last successful sync.

pub mod checksum;
pub mod convert;
pub mod direction;
mod engine;
mod locks;
mod scheduler;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use checksum::{gist_checksum, snippet_checksum};
pub use convert::{gist_to_snippet, snippet_to_gist};
pub use direction::{detect_direction, SyncDirection};
pub use engine::{EnableAllReport, ItemOutcome, SyncEngine, SyncReport};
pub use locks::{SyncLockGuard, SyncLocks};
pub use scheduler::{SyncScheduler, DEFAULT_TICK};
pub use service::SyncService;
