//! reqwest-backed GitHub Gists client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{MirrorClient, MirrorError, MirrorResult};
use crate::models::{Gist, GistPayload};
use crate::util::{clip_error_message, is_http_url, non_blank};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct GistClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GistClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GistClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

impl GistClient {
    pub fn with_base_url(base_url: &str, token: &str) -> MirrorResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        let token = non_blank(token)
            .ok_or_else(|| {
                MirrorError::InvalidConfiguration("GitHub token must not be empty".to_string())
            })?
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("snipo"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        target: &str,
    ) -> MirrorResult<T> {
        let response = check_status(builder.send().await?, target).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|error| MirrorError::InvalidPayload(error.to_string()))
    }
}

#[async_trait]
impl MirrorClient for GistClient {
    async fn create(&self, payload: &GistPayload) -> MirrorResult<Gist> {
        let body = json!({
            "description": payload.description,
            "public": payload.public,
            "files": files_body(payload, &[]),
        });
        let gist: Gist = self
            .send_json(self.request(Method::POST, "/gists").json(&body), "new gist")
            .await?;
        tracing::debug!(gist_id = %gist.id, "Created gist");
        Ok(gist)
    }

    async fn get(&self, gist_id: &str) -> MirrorResult<Gist> {
        let gist: Gist = self
            .send_json(self.request(Method::GET, &format!("/gists/{gist_id}")), gist_id)
            .await?;

        // Truncated files carry partial content; syncing them would lose data.
        if let Some(file) = gist.files.values().find(|file| file.truncated) {
            return Err(MirrorError::InvalidPayload(format!(
                "file '{}' in gist {gist_id} is too large to sync",
                file.filename
            )));
        }
        Ok(gist)
    }

    async fn update(
        &self,
        gist_id: &str,
        payload: &GistPayload,
        removed_files: &[String],
    ) -> MirrorResult<Gist> {
        let body = json!({
            "description": payload.description,
            "files": files_body(payload, removed_files),
        });
        self.send_json(
            self.request(Method::PATCH, &format!("/gists/{gist_id}"))
                .json(&body),
            gist_id,
        )
        .await
    }

    async fn delete(&self, gist_id: &str) -> MirrorResult<()> {
        let response = self
            .request(Method::DELETE, &format!("/gists/{gist_id}"))
            .send()
            .await?;
        check_status(response, gist_id).await?;
        Ok(())
    }

    async fn whoami(&self) -> MirrorResult<String> {
        let user: GitHubUser = self
            .send_json(self.request(Method::GET, "/user"), "authenticated user")
            .await?;
        Ok(user.login)
    }
}

fn files_body(payload: &GistPayload, removed_files: &[String]) -> Map<String, Value> {
    let mut files = payload
        .files
        .iter()
        .map(|(filename, content)| (filename.clone(), json!({ "content": content })))
        .collect::<Map<_, _>>();
    for filename in removed_files {
        files.insert(filename.clone(), Value::Null);
    }
    files
}

async fn check_status(response: Response, target: &str) -> MirrorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(MirrorError::NotFound(target.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(MirrorError::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<GitHubErrorBody>(body) {
        if let Some(message) = payload.message.as_deref().and_then(non_blank) {
            return format!("{} ({})", clip_error_message(message), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", clip_error_message(trimmed), status.as_u16())
    }
}

fn normalize_base_url(raw: &str) -> MirrorResult<String> {
    let base_url = non_blank(raw).ok_or_else(|| {
        MirrorError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if is_http_url(base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(MirrorError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
