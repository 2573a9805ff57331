//! Snippet repository implementation
//!
//! The snippet store is owned by the wider application; the sync engine only
//! needs to read a full snippet by id and replace its synchronizable fields.

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{normalize_tags, Folder, Snippet, SnippetFile, SnippetId};
use crate::util::now_ms;

/// Trait for snippet storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SnippetRepository {
    /// Insert a snippet, keeping its id and timestamps
    async fn create(&self, snippet: &Snippet) -> Result<Snippet>;

    /// Get a snippet by ID, including files, tags, and folder references
    async fn get(&self, id: &SnippetId) -> Result<Option<Snippet>>;

    /// List snippets, most recently updated first
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Snippet>>;

    /// All snippet ids in storage order
    async fn list_ids(&self) -> Result<Vec<SnippetId>>;

    /// Replace a snippet's content and metadata, bumping `updated_at`
    async fn update(&self, snippet: &Snippet) -> Result<Snippet>;

    /// Delete a snippet
    async fn delete(&self, id: &SnippetId) -> Result<()>;

    /// Create a folder
    async fn create_folder(&self, name: &str) -> Result<Folder>;

    /// List all folders
    async fn list_folders(&self) -> Result<Vec<Folder>>;
}

/// libSQL implementation of `SnippetRepository`
pub struct LibSqlSnippetRepository<'a> {
    conn: &'a Connection,
}

const SNIPPET_COLUMNS: &str = "id, title, description, content, language, is_public, \
     is_favorite, is_archived, created_at, updated_at";

impl<'a> LibSqlSnippetRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse the snippet row; children are loaded separately
    fn parse_snippet(row: &libsql::Row) -> Result<Snippet> {
        let id: String = row.get(0)?;
        Ok(Snippet {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid snippet id in storage: {id}")))?,
            title: row.get(1)?,
            description: row.get(2)?,
            content: row.get(3)?,
            language: row.get(4)?,
            is_public: row.get::<i64>(5)? != 0,
            is_favorite: row.get::<i64>(6)? != 0,
            is_archived: row.get::<i64>(7)? != 0,
            files: Vec::new(),
            tags: Vec::new(),
            folder_ids: Vec::new(),
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    async fn load_children(&self, snippet: &mut Snippet) -> Result<()> {
        let id = snippet.id.as_str();

        let mut rows = self
            .conn
            .query(
                "SELECT filename, content, language FROM snippet_files
                 WHERE snippet_id = ? ORDER BY filename ASC",
                [id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            snippet.files.push(SnippetFile {
                filename: row.get(0)?,
                content: row.get(1)?,
                language: row.get(2)?,
            });
        }

        let mut rows = self
            .conn
            .query(
                "SELECT t.name FROM tags t
                 JOIN snippet_tags st ON st.tag_id = t.id
                 WHERE st.snippet_id = ? ORDER BY t.name ASC",
                [id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            snippet.tags.push(row.get(0)?);
        }

        let mut rows = self
            .conn
            .query(
                "SELECT folder_id FROM snippet_folders WHERE snippet_id = ? ORDER BY folder_id ASC",
                [id.as_str()],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            snippet.folder_ids.push(row.get(0)?);
        }

        Ok(())
    }

    /// Replace files, tags, and folder links for a snippet
    async fn write_children(&self, snippet: &Snippet) -> Result<()> {
        let id = snippet.id.as_str();

        self.conn
            .execute("DELETE FROM snippet_files WHERE snippet_id = ?", [id.as_str()])
            .await?;
        for file in &snippet.files {
            self.conn
                .execute(
                    "INSERT INTO snippet_files (snippet_id, filename, content, language)
                     VALUES (?, ?, ?, ?)",
                    params![
                        id.as_str(),
                        file.filename.as_str(),
                        file.content.as_str(),
                        file.language.as_str()
                    ],
                )
                .await?;
        }

        self.conn
            .execute("DELETE FROM snippet_tags WHERE snippet_id = ?", [id.as_str()])
            .await?;
        for tag in normalize_tags(&snippet.tags) {
            self.conn
                .execute("INSERT OR IGNORE INTO tags (name) VALUES (?)", [tag.as_str()])
                .await?;
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO snippet_tags (snippet_id, tag_id)
                     SELECT ?, id FROM tags WHERE name = ? COLLATE NOCASE",
                    params![id.as_str(), tag.as_str()],
                )
                .await?;
        }

        self.conn
            .execute(
                "DELETE FROM snippet_folders WHERE snippet_id = ?",
                [id.as_str()],
            )
            .await?;
        for folder_id in &snippet.folder_ids {
            // Folders that don't exist locally (e.g. referenced from another machine) are skipped.
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO snippet_folders (snippet_id, folder_id)
                     SELECT ?, id FROM folders WHERE id = ?",
                    params![id.as_str(), *folder_id],
                )
                .await?;
        }

        Ok(())
    }

    async fn commit_or_rollback(&self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                if let Err(e) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(())
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }
}

impl SnippetRepository for LibSqlSnippetRepository<'_> {
    async fn create(&self, snippet: &Snippet) -> Result<Snippet> {
        if snippet.title.trim().is_empty() {
            return Err(Error::InvalidInput("Snippet title cannot be empty".into()));
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let outcome = async {
            self.conn
                .execute(
                    "INSERT INTO snippets (id, title, description, content, language, is_public,
                        is_favorite, is_archived, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        snippet.id.as_str(),
                        snippet.title.as_str(),
                        snippet.description.as_str(),
                        snippet.content.as_str(),
                        snippet.language.as_str(),
                        i64::from(snippet.is_public),
                        i64::from(snippet.is_favorite),
                        i64::from(snippet.is_archived),
                        snippet.created_at,
                        snippet.updated_at
                    ],
                )
                .await?;
            self.write_children(snippet).await
        }
        .await;
        self.commit_or_rollback(outcome).await?;

        self.get(&snippet.id)
            .await?
            .ok_or_else(|| Error::NotFound(snippet.id.to_string()))
    }

    async fn get(&self, id: &SnippetId) -> Result<Option<Snippet>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut snippet = Self::parse_snippet(&row)?;
        self.load_children(&mut snippet).await?;
        Ok(Some(snippet))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Snippet>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SNIPPET_COLUMNS} FROM snippets
                     ORDER BY updated_at DESC LIMIT ? OFFSET ?"
                ),
                params![limit as i64, offset as i64],
            )
            .await?;

        let mut snippets = Vec::new();
        while let Some(row) = rows.next().await? {
            snippets.push(Self::parse_snippet(&row)?);
        }
        for snippet in &mut snippets {
            self.load_children(snippet).await?;
        }
        Ok(snippets)
    }

    async fn list_ids(&self) -> Result<Vec<SnippetId>> {
        let mut rows = self
            .conn
            .query("SELECT id FROM snippets ORDER BY rowid ASC", ())
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            ids.push(
                id.parse()
                    .map_err(|_| Error::Database(format!("Invalid snippet id in storage: {id}")))?,
            );
        }
        Ok(ids)
    }

    async fn update(&self, snippet: &Snippet) -> Result<Snippet> {
        let now = now_ms();

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let outcome = async {
            let rows = self
                .conn
                .execute(
                    "UPDATE snippets SET title = ?, description = ?, content = ?, language = ?,
                        is_public = ?, is_favorite = ?, is_archived = ?, updated_at = ?
                     WHERE id = ?",
                    params![
                        snippet.title.as_str(),
                        snippet.description.as_str(),
                        snippet.content.as_str(),
                        snippet.language.as_str(),
                        i64::from(snippet.is_public),
                        i64::from(snippet.is_favorite),
                        i64::from(snippet.is_archived),
                        now,
                        snippet.id.as_str()
                    ],
                )
                .await?;
            if rows == 0 {
                return Err(Error::NotFound(snippet.id.to_string()));
            }
            self.write_children(snippet).await
        }
        .await;
        self.commit_or_rollback(outcome).await?;

        self.get(&snippet.id)
            .await?
            .ok_or_else(|| Error::NotFound(snippet.id.to_string()))
    }

    async fn delete(&self, id: &SnippetId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM snippets WHERE id = ?", [id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Folder name cannot be empty".into()));
        }

        self.conn
            .execute(
                "INSERT INTO folders (name, created_at) VALUES (?, ?)",
                params![name, now_ms()],
            )
            .await?;

        Ok(Folder {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    async fn list_folders(&self) -> Result<Vec<Folder>> {
        let mut rows = self
            .conn
            .query("SELECT id, name FROM folders ORDER BY name ASC", ())
            .await?;

        let mut folders = Vec::new();
        while let Some(row) = rows.next().await? {
            folders.push(Folder {
                id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(folders)
    }
}
