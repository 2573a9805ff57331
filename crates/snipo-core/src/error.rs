//! Error types for snipo-core

use thiserror::Error;

use crate::gist::MirrorError;

/// Result type alias using snipo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in snipo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote gist call failed
    #[error("Gist error: {0}")]
    Mirror(#[from] MirrorError),

    /// Credential encryption/decryption error
    #[error("Crypto error: {0}")]
    Crypto(String),
}
