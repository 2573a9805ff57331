//! Shared services used by clients.

pub mod database;

pub use database::DatabaseService;
