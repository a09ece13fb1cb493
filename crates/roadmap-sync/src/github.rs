//! GitHub contents API remote
//!
//! Maps the [`RemoteStore`] contract onto the repository contents endpoints:
//!
//! - `get`  → `GET  /repos/{owner}/{repo}/contents/{path}` (`content`, `sha`)
//! - `put`  → `PUT  /repos/{owner}/{repo}/contents/{path}` (`sha` as precondition)
//! - `list` → `GET  /repos/{owner}/{repo}/contents/{dir}` (array of entries)
//!
//! The blob `sha` is the version token. Acquiring the access token is the
//! caller's business.

use crate::error::RemoteError;
use crate::remote::{RemoteBlob, RemoteEntry, RemoteStore};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use roadmap_model::VersionToken;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Public GitHub API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Repository coordinates and client settings
#[derive(Clone)]
pub struct GitHubConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to read and commit to; the default branch if unset
    pub branch: Option<String>,
    /// Access token sent as a bearer token
    pub token: Option<String>,
    /// API base URL
    pub api_base: String,
    /// User-Agent header (required by GitHub)
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Create configuration for `owner/repo`
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: format!("roadmap-sync/{}", crate::VERSION),
            timeout: Duration::from_secs(30),
        }
    }

    /// With branch
    #[inline]
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// With access token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// With API base URL (GitHub Enterprise, tests)
    #[inline]
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// One item of a contents response
#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    /// Omitted or empty for files over the contents API's 1 MB inline limit
    #[serde(default)]
    content: Option<String>,
}

/// A contents response is an object for files, an array for directories
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Item(ContentItem),
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// [`RemoteStore`] backed by a GitHub repository
#[derive(Debug, Clone)]
pub struct GitHubRemote {
    client: Client,
    config: GitHubConfig,
}

impl GitHubRemote {
    /// Build a client for the configured repository
    ///
    /// # Errors
    /// Returns `RemoteError::Unavailable` if the token is not a valid header
    /// value or the HTTP client cannot be built
    pub fn new(config: GitHubConfig) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| RemoteError::unavailable("access token is not a valid header value"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| RemoteError::unavailable("user agent is not a valid header value"))?;
        headers.insert(USER_AGENT, user_agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::unavailable(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn contents_url(&self, path: &str) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| RemoteError::unavailable(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| RemoteError::unavailable("API base URL cannot have a path"))?
            .pop_if_empty()
            .extend(["repos", self.config.owner.as_str(), self.config.repo.as_str(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    async fn fetch(&self, path: &str) -> Result<ContentsResponse, RemoteError> {
        let url = self.contents_url(path)?;
        let mut request = self.client.get(url);
        if let Some(branch) = &self.config.branch {
            request = request.query(&[("ref", branch)]);
        }

        tracing::debug!(path, "GET contents");
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::not_found(path));
        }
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| RemoteError::unavailable(format!("malformed contents response: {e}")))
    }
}

#[async_trait]
impl RemoteStore for GitHubRemote {
    async fn get(&self, path: &str) -> Result<RemoteBlob, RemoteError> {
        match self.fetch(path).await? {
            ContentsResponse::Item(item) if item.kind == "file" => {
                let content = item.content.unwrap_or_default();
                if content.trim().is_empty() && item.size > 0 {
                    tracing::warn!(path, size = item.size, "file content not returned inline");
                    return Err(RemoteError::unavailable(format!(
                        "{path} is too large for the contents API ({} bytes)",
                        item.size
                    )));
                }
                Ok(RemoteBlob {
                    content,
                    version: VersionToken::new(item.sha),
                })
            }
            ContentsResponse::Item(item) => Err(RemoteError::unavailable(format!(
                "{path} is a {}, not a file",
                item.kind
            ))),
            ContentsResponse::Listing(_) => Err(RemoteError::unavailable(format!(
                "{path} is a directory, not a file"
            ))),
        }
    }

    async fn put(
        &self,
        path: &str,
        content: &str,
        expected: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, RemoteError> {
        let url = self.contents_url(path)?;
        let body = PutBody {
            message,
            content: content.chars().filter(|c| !c.is_ascii_whitespace()).collect(),
            sha: expected.map(VersionToken::as_str),
            branch: self.config.branch.as_deref(),
        };

        tracing::debug!(path, expected = expected.map(VersionToken::short), "PUT contents");
        let response = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        match status {
            StatusCode::CONFLICT => return Err(RemoteError::conflict(path)),
            // Creating over an existing file without its sha
            StatusCode::UNPROCESSABLE_ENTITY if expected.is_none() => {
                return Err(RemoteError::conflict(path));
            }
            StatusCode::NOT_FOUND => return Err(RemoteError::not_found(path)),
            _ if !status.is_success() => return Err(status_error(status, response).await),
            _ => {}
        }

        let written: PutResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::unavailable(format!("malformed put response: {e}")))?;
        Ok(VersionToken::new(written.content.sha))
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        match self.fetch(dir).await? {
            ContentsResponse::Listing(items) => Ok(items
                .into_iter()
                .filter(|item| item.kind == "file")
                .map(|item| RemoteEntry {
                    name: item.name,
                    path: item.path,
                    version: VersionToken::new(item.sha),
                })
                .collect()),
            ContentsResponse::Item(_) => Err(RemoteError::unavailable(format!(
                "{dir} is a file, not a directory"
            ))),
        }
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::unavailable(format!("request failed: {err}"))
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> RemoteError {
    let detail = response
        .json::<ApiMessage>()
        .await
        .map(|body| body.message)
        .unwrap_or_default();
    if detail.is_empty() {
        RemoteError::unavailable(format!("HTTP {status}"))
    } else {
        RemoteError::unavailable(format!("HTTP {status}: {detail}"))
    }
}
