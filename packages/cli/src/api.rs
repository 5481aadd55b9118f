//! API Client
//!
//! HTTP client for the handful of Linode API calls the configuration layer
//! makes: the identity lookup and the option catalogs used by `configure`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::resolver::IdentityLookup;

pub const DEFAULT_API_HOST: &str = "api.linode.com";
pub const DEFAULT_API_VERSION: &str = "v4";
pub const DEFAULT_API_SCHEME: &str = "https";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request rejected: {}", .reasons.join("; "))]
    Rejected { reasons: Vec<String> },
    #[error("API request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    reason: String,
}

/// One page of a collection endpoint
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub username: String,
    pub email: Option<String>,
}

/// `/profile` body: either the profile or an `errors` array.
#[derive(Debug, Deserialize)]
struct ProfileBody {
    username: Option<String>,
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct Region {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct LinodeType {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseEngine {
    pub id: String,
    pub engine: String,
}

#[derive(Debug, Deserialize)]
pub struct SshKey {
    pub label: String,
    pub ssh_key: String,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Build `scheme://host/version`, falling back to the public API.
pub fn base_url(scheme: Option<&str>, host: Option<&str>, version: Option<&str>) -> String {
    format!(
        "{}://{}/{}",
        scheme.unwrap_or(DEFAULT_API_SCHEME),
        host.unwrap_or(DEFAULT_API_HOST).trim_end_matches('/'),
        version.unwrap_or(DEFAULT_API_VERSION).trim_matches('/'),
    )
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("linode-cli/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET request authenticated with the client's token
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let (status, url, text) = self.fetch(path, self.token.as_deref()).await?;

        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            if !body.errors.is_empty() {
                return Err(ApiError::Rejected {
                    reasons: body.errors.into_iter().map(|e| e.reason).collect(),
                }
                .into());
            }
        }
        if !status.is_success() {
            return Err(ApiError::Status { url, status }.into());
        }

        serde_json::from_str(&text).with_context(|| format!("Unexpected response from {}", url))
    }

    /// The profile that owns the client's token.
    pub async fn profile(&self) -> Result<Profile> {
        self.get("/profile").await
    }

    pub async fn regions(&self) -> Result<Vec<String>> {
        let page: Page<Region> = self.get("/regions?page_size=500").await?;
        Ok(page.data.into_iter().map(|r| r.id).collect())
    }

    pub async fn linode_types(&self) -> Result<Vec<String>> {
        let page: Page<LinodeType> = self.get("/linode/types?page_size=500").await?;
        Ok(page.data.into_iter().map(|t| t.id).collect())
    }

    pub async fn images(&self) -> Result<Vec<String>> {
        let page: Page<Image> = self.get("/images?page_size=500").await?;
        Ok(page.data.into_iter().map(|i| i.id).collect())
    }

    /// Engine ids (e.g. `mysql/8.0.30`) for the given engine family.
    pub async fn database_engines(&self, engine: &str) -> Result<Vec<String>> {
        let page: Page<DatabaseEngine> = self.get("/databases/engines?page_size=500").await?;
        Ok(page
            .data
            .into_iter()
            .filter(|e| e.engine == engine)
            .map(|e| e.id)
            .collect())
    }

    pub async fn ssh_keys(&self) -> Result<Vec<SshKey>> {
        let page: Page<SshKey> = self.get("/profile/sshkeys?page_size=500").await?;
        Ok(page.data)
    }

    async fn fetch(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<(reqwest::StatusCode, String, String)> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;
        debug!(%url, %status, "response received");
        Ok((status, url, text))
    }
}

#[async_trait]
impl IdentityLookup for ApiClient {
    async fn username_for(&self, token: &str) -> Result<Option<String>> {
        let (status, url, text) = self.fetch("/profile", Some(token)).await?;
        username_from_body(&text)
            .with_context(|| format!("Unexpected response from {} ({})", url, status))
    }
}

/// `Some(username)` for an accepted token, `None` when the body carries
/// `errors`, regardless of status.
fn username_from_body(text: &str) -> Result<Option<String>> {
    let body: ProfileBody = serde_json::from_str(text)?;
    if let Some(errors) = body.errors {
        let reasons: Vec<&str> = errors.iter().map(|e| e.reason.as_str()).collect();
        debug!(?reasons, "token rejected");
        return Ok(None);
    }
    body.username
        .map(Some)
        .context("Profile response has no username")
}
