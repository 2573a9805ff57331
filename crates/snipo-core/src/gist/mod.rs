//! Remote mirror boundary: the GitHub Gists API.
//!
//! The sync engine talks to [`MirrorClient`] only, so tests can swap in an
//! in-memory double. Every failure surfaces as a [`MirrorError`].

mod client;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Gist, GistPayload};

pub use client::{GistClient, DEFAULT_API_URL};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Invalid gist client configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Gist HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gist API error: {message}")]
    Api { status: u16, message: String },
    #[error("Gist not found: {0}")]
    NotFound(String),
    #[error("Invalid gist payload: {0}")]
    InvalidPayload(String),
}

pub type MirrorResult<T> = Result<T, MirrorError>;

/// CRUD operations against the remote mirror
#[async_trait]
pub trait MirrorClient: Send + Sync {
    async fn create(&self, payload: &GistPayload) -> MirrorResult<Gist>;

    async fn get(&self, gist_id: &str) -> MirrorResult<Gist>;

    /// Replace description and files; `removed_files` are deleted remotely
    async fn update(
        &self,
        gist_id: &str,
        payload: &GistPayload,
        removed_files: &[String],
    ) -> MirrorResult<Gist>;

    async fn delete(&self, gist_id: &str) -> MirrorResult<()>;

    /// Login of the account the credential belongs to
    async fn whoami(&self) -> MirrorResult<String>;
}

/// Builds a mirror client from a decrypted credential
pub trait MirrorClientFactory: Send + Sync {
    fn connect(&self, token: &str) -> MirrorResult<Arc<dyn MirrorClient>>;
}

/// Factory for [`GistClient`] against a fixed API base URL
#[derive(Debug, Clone)]
pub struct GistClientFactory {
    base_url: String,
}

impl GistClientFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for GistClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl MirrorClientFactory for GistClientFactory {
    fn connect(&self, token: &str) -> MirrorResult<Arc<dyn MirrorClient>> {
        Ok(Arc::new(GistClient::with_base_url(&self.base_url, token)?))
    }
}
