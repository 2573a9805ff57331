use std::io;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] snipo_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid snippet id: {0}")]
    InvalidSnippetId(String),
    #[error("Specify a snippet ID or --all")]
    MissingTarget,
    #[error("Nothing to update; pass at least one option")]
    EmptyUpdate,
}
