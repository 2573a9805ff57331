//! Mapping between local snippets and gists.
//!
//! A gist only carries a description and a set of files, so everything else
//! (local id, folders, flags, tags) travels in a versioned metadata block
//! appended to the description:
//!
//! ```text
//! {title}
//!
//! <!-- snipo:{"v":1,"id":"...","tags":["..."],...} -->
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Gist, GistPayload, Snippet, SnippetFile, SnippetId, DEFAULT_LANGUAGE};
use crate::util::now_ms;

/// Current metadata schema version
pub const METADATA_VERSION: u32 = 1;

/// Standalone metadata file written by older clients; never synced as content
pub const LEGACY_METADATA_FILE: &str = ".snipo.json";

const METADATA_OPEN: &str = "<!-- snipo:";
const METADATA_CLOSE: &str = "-->";
const FALLBACK_FILE_STEM: &str = "snippet";
const MAX_FILE_STEM_CHARS: usize = 100;

/// Extension to language table. The first entry for a language is the
/// extension used when naming a synthetic file.
const LANGUAGES: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("c", "c"),
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("scala", "scala"),
    ("hs", "haskell"),
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("lua", "lua"),
    ("dart", "dart"),
    ("r", "r"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("ps1", "powershell"),
    ("sql", "sql"),
    ("html", "html"),
    ("htm", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("vue", "vue"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("xml", "xml"),
    ("md", "markdown"),
    ("dockerfile", "dockerfile"),
    ("makefile", "makefile"),
    ("txt", "plaintext"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct GistMetadata {
    v: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    description: String,
    folders: Vec<i64>,
    favorite: bool,
    archived: bool,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_file: Option<String>,
}

/// Infer a language from a filename's extension (or bare name for
/// `Dockerfile`-style files). Unknown extensions map to plain text.
pub fn language_for_filename(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    let key = lower.rsplit_once('.').map_or(lower.as_str(), |(_, ext)| ext);
    LANGUAGES
        .iter()
        .find(|(ext, _)| *ext == key)
        .map_or(DEFAULT_LANGUAGE, |(_, language)| *language)
}

/// Extension used for a synthetic file holding content in `language`
pub fn extension_for_language(language: &str) -> &'static str {
    let language = language.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(_, name)| *name == language)
        .map_or("txt", |(ext, _)| *ext)
}

fn unsafe_filename_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]+"#).expect("Invalid regex"))
}

/// Filename for a snippet without explicit files, derived from its title
pub fn synthetic_filename(title: &str, language: &str) -> String {
    let stripped = unsafe_filename_chars().replace_all(title, "");
    let stem = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_start_matches('.')
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect::<String>();

    if stem.is_empty() {
        return format!("{FALLBACK_FILE_STEM}.{}", extension_for_language(language));
    }

    // A title such as "main.rs" already names a usable file.
    let has_known_extension = stem.rsplit_once('.').is_some_and(|(_, ext)| {
        LANGUAGES
            .iter()
            .any(|(known, _)| known.eq_ignore_ascii_case(ext))
    });
    if has_known_extension {
        stem
    } else {
        format!("{stem}.{}", extension_for_language(language))
    }
}

/// Convert a local snippet into the gist payload that mirrors it
pub fn snippet_to_gist(snippet: &Snippet) -> Result<GistPayload> {
    let (files, content_file) = if snippet.files.is_empty() {
        let filename = synthetic_filename(&snippet.title, &snippet.language);
        let files = BTreeMap::from([(filename.clone(), snippet.content.clone())]);
        (files, Some(filename))
    } else {
        let files = snippet
            .files
            .iter()
            .filter(|file| file.filename != LEGACY_METADATA_FILE)
            .map(|file| (file.filename.clone(), file.content.clone()))
            .collect();
        (files, None)
    };

    let metadata = GistMetadata {
        v: METADATA_VERSION,
        id: Some(snippet.id.to_string()),
        description: snippet.description.clone(),
        folders: snippet.folder_ids.clone(),
        favorite: snippet.is_favorite,
        archived: snippet.is_archived,
        tags: snippet.tags.clone(),
        language: Some(snippet.language.clone()),
        content_file,
    };

    Ok(GistPayload {
        description: format!(
            "{}\n\n{METADATA_OPEN}{} {METADATA_CLOSE}",
            snippet.title.trim(),
            encode_metadata(&metadata)?
        ),
        public: snippet.is_public,
        files,
    })
}

/// Compact JSON with `<` and `>` escaped, so user text inside the block can
/// never form the marker or its terminator.
fn encode_metadata(metadata: &GistMetadata) -> Result<String> {
    Ok(serde_json::to_string(metadata)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e"))
}

/// Split a gist description into title and metadata block. A malformed
/// block is treated as absent.
fn split_description(description: &str) -> (String, Option<GistMetadata>) {
    let Some(start) = description.rfind(METADATA_OPEN) else {
        return (description.trim().to_string(), None);
    };

    let title = description[..start].trim().to_string();
    let block = &description[start + METADATA_OPEN.len()..];
    let metadata = block
        .trim_end()
        .strip_suffix(METADATA_CLOSE)
        .and_then(|json| serde_json::from_str::<GistMetadata>(json.trim()).ok());
    if metadata.is_none() {
        tracing::debug!("Ignoring malformed gist metadata block");
    }
    (title, metadata)
}

/// Convert a gist into a local snippet.
///
/// With `existing`, the snippet keeps that id, creation time, and visibility
/// (the API can't change a gist's visibility, so the local flag is kept).
/// Otherwise the id comes from the metadata block when present.
pub fn gist_to_snippet(gist: &Gist, existing: Option<&Snippet>) -> Snippet {
    let (title, metadata) = split_description(gist.description_text());
    let metadata = metadata.or_else(|| {
        gist.files
            .get(LEGACY_METADATA_FILE)
            .and_then(|file| file.content.as_deref())
            .and_then(|json| serde_json::from_str::<GistMetadata>(json).ok())
    });
    let has_metadata = metadata.is_some();
    let metadata = metadata.unwrap_or_default();

    let remote_files = gist
        .files
        .iter()
        .filter(|(name, _)| name.as_str() != LEGACY_METADATA_FILE)
        .map(|(name, file)| (name.as_str(), file.content.clone().unwrap_or_default()))
        .collect::<Vec<_>>();

    let single_file = match (remote_files.as_slice(), metadata.content_file.as_deref()) {
        ([(name, _)], Some(content_file)) => *name == content_file,
        ([_], None) => !has_metadata,
        _ => false,
    };

    let (content, language, files) = if remote_files.is_empty() {
        (String::new(), DEFAULT_LANGUAGE.to_string(), Vec::new())
    } else if single_file {
        let (name, content) = &remote_files[0];
        let language = metadata
            .language
            .clone()
            .unwrap_or_else(|| language_for_filename(name).to_string());
        (content.clone(), language, Vec::new())
    } else {
        let files = remote_files
            .iter()
            .map(|(name, content)| {
                SnippetFile::new(*name, content.clone(), language_for_filename(name))
            })
            .collect();
        let language = metadata
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        (String::new(), language, files)
    };

    let title = if title.is_empty() {
        remote_files
            .first()
            .map_or_else(|| "Untitled".to_string(), |(name, _)| (*name).to_string())
    } else {
        title
    };

    let id = existing.map(|snippet| snippet.id).unwrap_or_else(|| {
        metadata
            .id
            .as_deref()
            .and_then(|raw| raw.parse::<SnippetId>().ok())
            .unwrap_or_default()
    });
    let now = now_ms();
    let created_at = existing.map_or_else(
        || {
            gist.created_at
                .map_or(now, |created_at| created_at.timestamp_millis())
        },
        |snippet| snippet.created_at,
    );

    let mut tags = metadata.tags;
    tags.sort();
    tags.dedup();

    Snippet {
        id,
        title,
        description: metadata.description,
        content,
        language,
        is_public: existing.map_or(gist.public, |snippet| snippet.is_public),
        is_favorite: metadata.favorite,
        is_archived: metadata.archived,
        files,
        tags,
        folder_ids: metadata.folders,
        created_at,
        updated_at: gist.updated_at_ms().unwrap_or(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GistFile;
    use pretty_assertions::assert_eq;

    /// Build the gist the API would return for `payload`
    fn gist_from(payload: &GistPayload) -> Gist {
        Gist {
            id: "g1".to_string(),
            html_url: "https://gist.github.com/g1".to_string(),
            description: Some(payload.description.clone()),
            public: payload.public,
            files: payload
                .files
                .iter()
                .map(|(name, content)| {
                    (
                        name.clone(),
                        GistFile {
                            filename: name.clone(),
                            content: Some(content.clone()),
                            language: None,
                            truncated: false,
                        },
                    )
                })
                .collect(),
            created_at: None,
            updated_at: None,
            owner: None,
        }
    }

    fn external_gist(description: &str, files: &[(&str, &str)]) -> Gist {
        gist_from(&GistPayload {
            description: description.to_string(),
            public: true,
            files: files
                .iter()
                .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
                .collect(),
        })
    }

    fn multi_file_snippet() -> Snippet {
        let mut snippet = Snippet::new("Web server", "")
            .with_files(vec![
                SnippetFile::new("server.rs", "fn main() {}", "rust"),
                SnippetFile::new("Cargo.toml", "[package]", "toml"),
            ])
            .with_tags(["http", "rust"]);
        snippet.description = "Minimal server".to_string();
        snippet.folder_ids = vec![3];
        snippet.is_favorite = true;
        snippet
    }

    #[test]
    fn test_language_table() {
        assert_eq!(language_for_filename("main.rs"), "rust");
        assert_eq!(language_for_filename("APP.PY"), "python");
        assert_eq!(language_for_filename("Dockerfile"), "dockerfile");
        assert_eq!(language_for_filename("notes.xyz"), DEFAULT_LANGUAGE);
        assert_eq!(language_for_filename("README"), DEFAULT_LANGUAGE);
        assert_eq!(extension_for_language("Python"), "py");
        assert_eq!(extension_for_language("brainfuck"), "txt");
    }

    #[test]
    fn test_synthetic_filename() {
        assert_eq!(synthetic_filename("Quick sort", "rust"), "Quick_sort.rs");
        assert_eq!(synthetic_filename("a/b\\c:d*?", "python"), "abcd.py");
        assert_eq!(synthetic_filename("main.rs", "rust"), "main.rs");
        assert_eq!(synthetic_filename("  ", "go"), "snippet.go");
        assert_eq!(synthetic_filename("../..", "plaintext"), "snippet.txt");
    }

    #[test]
    fn test_single_content_snippet_to_gist() {
        let snippet = Snippet::new("Hello world", "print('hi')").with_language("python");
        let payload = snippet_to_gist(&snippet).unwrap();

        assert_eq!(payload.files.len(), 1);
        assert_eq!(payload.files["Hello_world.py"], "print('hi')");
        assert!(payload.description.starts_with("Hello world\n\n<!-- snipo:{"));
        assert!(payload.description.ends_with(" -->"));
        assert!(payload.description.contains(&snippet.id.to_string()));
        assert!(payload.description.contains(r#""content_file":"Hello_world.py""#));
    }

    #[test]
    fn test_round_trip_multi_file() {
        let snippet = multi_file_snippet();
        let gist = gist_from(&snippet_to_gist(&snippet).unwrap());
        let restored = gist_to_snippet(&gist, Some(&snippet));

        assert_eq!(restored.id, snippet.id);
        assert_eq!(restored.created_at, snippet.created_at);
        assert_eq!(restored.title, snippet.title);
        assert_eq!(restored.description, snippet.description);
        assert_eq!(restored.sorted_files(), snippet.sorted_files());
        assert_eq!(restored.tags, snippet.tags);
        assert_eq!(restored.folder_ids, snippet.folder_ids);
        assert!(restored.is_favorite);

        // A second pass over unchanged data yields the same snippet.
        let again = gist_to_snippet(
            &gist_from(&snippet_to_gist(&restored).unwrap()),
            Some(&restored),
        );
        assert_eq!(again.sorted_files(), restored.sorted_files());
        assert_eq!(again.title, restored.title);
        assert_eq!(again.description, restored.description);
        assert_eq!(again.tags, restored.tags);
    }

    #[test]
    fn test_round_trip_single_content() {
        let snippet = Snippet::new("Greeting", "echo hi").with_language("bash");
        let gist = gist_from(&snippet_to_gist(&snippet).unwrap());
        let restored = gist_to_snippet(&gist, Some(&snippet));

        assert_eq!(restored.id, snippet.id);
        assert_eq!(restored.content, "echo hi");
        assert_eq!(restored.language, "bash");
        assert!(restored.files.is_empty());
    }

    #[test]
    fn test_marker_text_in_user_fields_survives() {
        let mut snippet = Snippet::new("Markers", "x").with_tags(["a-->b"]);
        snippet.description = "literal <!-- snipo:{\"v\":9} --> text".to_string();
        let payload = snippet_to_gist(&snippet).unwrap();
        assert_eq!(payload.description.matches(METADATA_OPEN).count(), 1);

        let restored = gist_to_snippet(&gist_from(&payload), None);
        assert_eq!(restored.id, snippet.id);
        assert_eq!(restored.title, "Markers");
        assert_eq!(restored.description, snippet.description);
        assert_eq!(restored.tags, vec!["a-->b".to_string()]);
    }

    #[test]
    fn test_pull_keeps_local_visibility() {
        let mut snippet = Snippet::new("Private", "x");
        snippet.is_public = true;
        let mut gist = gist_from(&snippet_to_gist(&snippet).unwrap());
        gist.public = false;

        assert!(gist_to_snippet(&gist, Some(&snippet)).is_public);
        assert!(!gist_to_snippet(&gist, None).is_public);
    }

    #[test]
    fn test_id_from_metadata_without_context() {
        let snippet = multi_file_snippet();
        let gist = gist_from(&snippet_to_gist(&snippet).unwrap());
        assert_eq!(gist_to_snippet(&gist, None).id, snippet.id);
    }

    #[test]
    fn test_external_gist_without_metadata() {
        let gist = external_gist("Useful query", &[("report.sql", "SELECT 1;")]);
        let snippet = gist_to_snippet(&gist, None);

        assert_eq!(snippet.title, "Useful query");
        assert_eq!(snippet.content, "SELECT 1;");
        assert_eq!(snippet.language, "sql");
        assert!(snippet.files.is_empty());
        assert!(snippet.tags.is_empty());
        assert!(!snippet.is_favorite);
        assert!(snippet.is_public);
    }

    #[test]
    fn test_external_multi_file_gist() {
        let gist = external_gist("", &[("a.go", "package a"), ("b.unknown", "?")]);
        let snippet = gist_to_snippet(&gist, None);

        assert_eq!(snippet.title, "a.go");
        assert_eq!(snippet.files.len(), 2);
        assert_eq!(snippet.files[0].language, "go");
        assert_eq!(snippet.files[1].language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_malformed_metadata_is_ignored() {
        let gist = external_gist(
            "Broken\n\n<!-- snipo:{not json -->",
            &[("x.rs", "fn x() {}")],
        );
        let snippet = gist_to_snippet(&gist, None);

        assert_eq!(snippet.title, "Broken");
        assert_eq!(snippet.content, "fn x() {}");
        assert_eq!(snippet.language, "rust");
    }

    #[test]
    fn test_legacy_metadata_file() {
        let id = SnippetId::new();
        let legacy = format!(r#"{{"v":1,"id":"{id}","tags":["old"],"favorite":true}}"#);
        let gist = external_gist(
            "Legacy",
            &[("one.js", "1"), ("two.js", "2"), (LEGACY_METADATA_FILE, legacy.as_str())],
        );
        let snippet = gist_to_snippet(&gist, None);

        assert_eq!(snippet.id, id);
        assert_eq!(snippet.tags, vec!["old".to_string()]);
        assert!(snippet.is_favorite);
        assert_eq!(snippet.files.len(), 2);
        assert!(snippet
            .files
            .iter()
            .all(|file| file.filename != LEGACY_METADATA_FILE));
    }

    #[test]
    fn test_gist_with_no_files() {
        let gist = external_gist("Empty", &[(LEGACY_METADATA_FILE, "{}")]);
        let snippet = gist_to_snippet(&gist, None);

        assert_eq!(snippet.content, "");
        assert_eq!(snippet.language, DEFAULT_LANGUAGE);
        assert!(snippet.files.is_empty());
    }
}
