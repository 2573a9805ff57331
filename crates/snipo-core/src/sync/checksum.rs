//! Content fingerprints for change detection.
//!
//! Each side is hashed as SHA-256 over a canonical JSON rendering. Files are
//! sorted by filename first so storage order never changes the digest.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{Gist, Snippet};

#[derive(Serialize)]
struct FileFingerprint<'a> {
    filename: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Serialize)]
struct LocalFingerprint<'a> {
    title: &'a str,
    description: &'a str,
    public: bool,
    content: &'a str,
    language: &'a str,
    files: Vec<FileFingerprint<'a>>,
    tags: Vec<&'a str>,
    folders: Vec<i64>,
    favorite: bool,
    archived: bool,
}

#[derive(Serialize)]
struct RemoteFingerprint<'a> {
    description: &'a str,
    public: bool,
    files: Vec<FileFingerprint<'a>>,
}

/// Hash a serializable value as hex SHA-256 of its JSON form
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprint of a snippet's synchronizable fields
pub fn snippet_checksum(snippet: &Snippet) -> Result<String> {
    let mut tags = snippet.tags.iter().map(String::as_str).collect::<Vec<_>>();
    tags.sort_unstable();
    let mut folders = snippet.folder_ids.clone();
    folders.sort_unstable();

    content_hash(&LocalFingerprint {
        title: &snippet.title,
        description: &snippet.description,
        public: snippet.is_public,
        content: &snippet.content,
        language: &snippet.language,
        files: snippet
            .sorted_files()
            .into_iter()
            .map(|file| FileFingerprint {
                filename: &file.filename,
                content: &file.content,
                language: Some(&file.language),
            })
            .collect(),
        tags,
        folders,
        favorite: snippet.is_favorite,
        archived: snippet.is_archived,
    })
}

/// Fingerprint of a gist's description, visibility, and file contents
pub fn gist_checksum(gist: &Gist) -> Result<String> {
    // `Gist::files` is a BTreeMap, already ordered by filename.
    content_hash(&RemoteFingerprint {
        description: gist.description_text(),
        public: gist.public,
        files: gist
            .files
            .iter()
            .map(|(filename, file)| FileFingerprint {
                filename,
                content: file.content.as_deref().unwrap_or(""),
                language: None,
            })
            .collect(),
    })
}
