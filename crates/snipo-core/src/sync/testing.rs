//! In-memory mirror double shared by engine, service, and scheduler tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::gist::{MirrorClient, MirrorClientFactory, MirrorError, MirrorResult};
use crate::models::{Gist, GistFile, GistPayload};

#[derive(Default)]
pub struct FakeMirror {
    gists: Mutex<HashMap<String, Gist>>,
    next_id: AtomicUsize,
    pub creates: AtomicUsize,
    pub gets: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeMirror {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every call fail with an HTTP 502 until reset
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Slow down `get` so a pass stays in flight
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn gist(&self, id: &str) -> Option<Gist> {
        self.gists.lock().unwrap().get(id).cloned()
    }

    pub fn gist_count(&self) -> usize {
        self.gists.lock().unwrap().len()
    }

    /// Simulate an edit made on the remote side
    pub fn edit(&self, id: &str, edit: impl FnOnce(&mut Gist)) {
        let mut gists = self.gists.lock().unwrap();
        let gist = gists.get_mut(id).unwrap();
        edit(gist);
        gist.updated_at = Some(Utc::now());
    }

    pub fn set_file(gist: &mut Gist, filename: &str, content: &str) {
        gist.files.insert(
            filename.to_string(),
            GistFile {
                filename: filename.to_string(),
                content: Some(content.to_string()),
                language: None,
                truncated: false,
            },
        );
    }

    fn check(&self) -> MirrorResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MirrorError::Api {
                status: 502,
                message: "HTTP 502".to_string(),
            });
        }
        Ok(())
    }

    fn apply(gist: &mut Gist, payload: &GistPayload, removed_files: &[String]) {
        gist.description = Some(payload.description.clone());
        for (filename, content) in &payload.files {
            Self::set_file(gist, filename, content);
        }
        for filename in removed_files {
            gist.files.remove(filename);
        }
        gist.updated_at = Some(Utc::now());
    }
}

#[async_trait]
impl MirrorClient for FakeMirror {
    async fn create(&self, payload: &GistPayload) -> MirrorResult<Gist> {
        self.check()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = format!("gist-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut gist = Gist {
            id: id.clone(),
            html_url: format!("https://gist.example.com/{id}"),
            description: None,
            public: payload.public,
            files: BTreeMap::new(),
            created_at: Some(Utc::now()),
            updated_at: None,
            owner: None,
        };
        Self::apply(&mut gist, payload, &[]);
        self.gists.lock().unwrap().insert(id, gist.clone());
        Ok(gist)
    }

    async fn get(&self, gist_id: &str) -> MirrorResult<Gist> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        self.gist(gist_id)
            .ok_or_else(|| MirrorError::NotFound(gist_id.to_string()))
    }

    async fn update(
        &self,
        gist_id: &str,
        payload: &GistPayload,
        removed_files: &[String],
    ) -> MirrorResult<Gist> {
        self.check()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut gists = self.gists.lock().unwrap();
        let gist = gists
            .get_mut(gist_id)
            .ok_or_else(|| MirrorError::NotFound(gist_id.to_string()))?;
        Self::apply(gist, payload, removed_files);
        Ok(gist.clone())
    }

    async fn delete(&self, gist_id: &str) -> MirrorResult<()> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.gists
            .lock()
            .unwrap()
            .remove(gist_id)
            .map(|_| ())
            .ok_or_else(|| MirrorError::NotFound(gist_id.to_string()))
    }

    async fn whoami(&self) -> MirrorResult<String> {
        self.check()?;
        Ok("octocat".to_string())
    }
}

/// Hands out the same [`FakeMirror`] and remembers the tokens it saw
pub struct FakeFactory {
    pub mirror: Arc<FakeMirror>,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeFactory {
    pub fn new(mirror: Arc<FakeMirror>) -> Arc<Self> {
        Arc::new(Self {
            mirror,
            tokens: Mutex::new(Vec::new()),
        })
    }
}

impl MirrorClientFactory for FakeFactory {
    fn connect(&self, token: &str) -> MirrorResult<Arc<dyn MirrorClient>> {
        self.tokens.lock().unwrap().push(token.to_string());
        Ok(Arc::clone(&self.mirror) as Arc<dyn MirrorClient>)
    }
}
