//! Snippet model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Language assigned when nothing more specific is known
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// A unique identifier for a snippet, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnippetId(Uuid);

impl SnippetId {
    /// Create a new unique snippet ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SnippetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One named file inside a multi-file snippet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetFile {
    pub filename: String,
    pub content: String,
    pub language: String,
}

impl SnippetFile {
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            language: language.into(),
        }
    }
}

/// A folder snippets can be filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
}

/// A code snippet owned by the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Unique identifier
    pub id: SnippetId,
    /// Display title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Primary content, used when the snippet has no explicit files
    pub content: String,
    /// Language of the primary content
    pub language: String,
    /// Whether the mirror should be public
    pub is_public: bool,
    pub is_favorite: bool,
    pub is_archived: bool,
    /// Explicit files; empty for single-content snippets
    pub files: Vec<SnippetFile>,
    /// Tag names (lowercase)
    pub tags: Vec<String>,
    /// Referenced folder ids
    pub folder_ids: Vec<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Snippet {
    /// Create a new single-content snippet
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: SnippetId::new(),
            title: title.into(),
            description: String::new(),
            content: content.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            is_public: false,
            is_favorite: false,
            is_archived: false,
            files: Vec::new(),
            tags: Vec::new(),
            folder_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the primary content language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Replace the explicit file list
    #[must_use]
    pub fn with_files(mut self, files: Vec<SnippetFile>) -> Self {
        self.files = files;
        self
    }

    /// Replace the tag list, normalizing names to lowercase
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Files sorted by filename, the order used for hashing and conversion
    #[must_use]
    pub fn sorted_files(&self) -> Vec<&SnippetFile> {
        let mut files = self.files.iter().collect::<Vec<_>>();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        files
    }
}

/// Lowercase, trim, and deduplicate tag names, keeping them sorted
pub(crate) fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tags = tags
        .into_iter()
        .map(|tag| tag.into().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>();
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_id_unique() {
        let id1 = SnippetId::new();
        let id2 = SnippetId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_snippet_id_parse() {
        let id = SnippetId::new();
        let parsed: SnippetId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_snippet_new() {
        let snippet = Snippet::new("Hello", "println!(\"hi\");");
        assert_eq!(snippet.title, "Hello");
        assert_eq!(snippet.language, DEFAULT_LANGUAGE);
        assert!(snippet.files.is_empty());
        assert_eq!(snippet.created_at, snippet.updated_at);
    }

    #[test]
    fn test_tags_normalized() {
        let snippet = Snippet::new("t", "c").with_tags(["Rust", " rust ", "CLI", ""]);
        assert_eq!(snippet.tags, vec!["cli", "rust"]);
    }

    #[test]
    fn test_sorted_files() {
        let snippet = Snippet::new("t", "").with_files(vec![
            SnippetFile::new("b.rs", "b", "rust"),
            SnippetFile::new("a.rs", "a", "rust"),
        ]);
        let names = snippet
            .sorted_files()
            .into_iter()
            .map(|file| file.filename.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }
}
