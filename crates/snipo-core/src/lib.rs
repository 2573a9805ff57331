//! snipo-core - Core library for Snipo
//!
//! This crate contains the snippet models, the libSQL storage layer, and the
//! bidirectional GitHub Gist synchronization engine used by the Snipo CLI.

pub mod crypto;
pub mod db;
pub mod error;
pub mod gist;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Snippet, SnippetFile, SnippetId};
