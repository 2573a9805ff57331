//! Database layer for Snipo

mod connection;
mod migrations;
mod snippet_repository;
mod sync_repository;

pub use connection::Database;
pub use snippet_repository::{LibSqlSnippetRepository, SnippetRepository};
pub use sync_repository::{
    LibSqlSyncRepository, NewConflict, NewLogEntry, NewMapping, SyncRepository,
};
