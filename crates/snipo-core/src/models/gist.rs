//! GitHub Gist model, as returned by the Gists REST API

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file inside a gist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistFile {
    pub filename: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistOwner {
    pub login: String,
}

/// A remote gist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
    /// Files keyed by filename; `BTreeMap` keeps them sorted.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner: Option<GistOwner>,
}

impl Gist {
    /// Description text, empty when the gist has none
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Last update time in Unix ms, when the API reported one
    pub fn updated_at_ms(&self) -> Option<i64> {
        self.updated_at.map(|updated_at| updated_at.timestamp_millis())
    }
}

/// Description, visibility, and file contents sent to the gist API
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GistPayload {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, String>,
}

impl GistPayload {
    /// Filenames present on `existing` that this payload no longer carries
    pub fn removed_files(&self, existing: &Gist) -> Vec<String> {
        existing
            .files
            .keys()
            .filter(|name| !self.files.contains_key(*name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_response() {
        let payload = r#"{
            "id": "aa5a315d61ae9438b18d",
            "html_url": "https://gist.github.com/aa5a315d61ae9438b18d",
            "description": "Hello World Examples",
            "public": true,
            "files": {
                "hello_world.rb": {
                    "filename": "hello_world.rb",
                    "type": "application/x-ruby",
                    "language": "Ruby",
                    "size": 167,
                    "truncated": false,
                    "content": "puts 'hi'"
                }
            },
            "created_at": "2010-04-14T02:15:15Z",
            "updated_at": "2011-06-20T11:34:15Z",
            "owner": { "login": "octocat", "id": 1 }
        }"#;

        let gist: Gist = serde_json::from_str(payload).unwrap();
        assert_eq!(gist.id, "aa5a315d61ae9438b18d");
        assert_eq!(gist.description_text(), "Hello World Examples");
        assert_eq!(
            gist.files["hello_world.rb"].content.as_deref(),
            Some("puts 'hi'")
        );
        assert_eq!(gist.owner.as_ref().unwrap().login, "octocat");
        assert!(gist.updated_at_ms().unwrap() > 0);
    }

    #[test]
    fn test_removed_files() {
        let gist: Gist = serde_json::from_str(
            r#"{"id":"1","files":{"a.rs":{"filename":"a.rs"},"b.rs":{"filename":"b.rs"}}}"#,
        )
        .unwrap();
        let mut payload = GistPayload::default();
        payload.files.insert("a.rs".to_string(), "a".to_string());

        assert_eq!(payload.removed_files(&gist), vec!["b.rs".to_string()]);
    }
}
