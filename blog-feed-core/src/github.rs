//! GitHub contents API as a [`ContentHost`].
//!
//! Listing uses `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`;
//! file bodies are read from each entry's `download_url`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::HostConfig;
use crate::contract::{ContentHost, ContentSource, DirectoryEntry, EntryKind, HostError};

const USER_AGENT: &str = concat!("blog-feed/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    client: Client,
    config: HostConfig,
}

impl GitHubClient {
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                HostError::Network(e.to_string())
            })?;
        info!(
            api_base = %config.api_base,
            token_set = config.token.is_some(),
            "Initialized GitHubClient"
        );
        Ok(Self { client, config })
    }

    pub fn listing_url(&self, source: &ContentSource) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            source.account,
            source.repository,
            source.directory()
        )
    }

    /// Fallback locator for entries the API lists without a `download_url`.
    pub fn raw_url(&self, source: &ContentSource, name: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}",
            self.config.raw_base.trim_end_matches('/'),
            source.account,
            source.repository,
            source.branch,
            source.directory(),
            name
        )
    }

    /// Only requests to the configured API or raw hosts carry the token.
    fn authorized(&self, request: RequestBuilder, url: &str) -> RequestBuilder {
        match &self.config.token {
            Some(token)
                if is_under(&self.config.api_base, url) || is_under(&self.config.raw_base, url) =>
            {
                request.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            Some(_) => {
                debug!(url = %url, "Locator is outside the configured hosts, sending without token");
                request
            }
            None => request,
        }
    }
}

/// True when `url` has the same scheme, host and port as `base` and its path
/// lies under the base path, segment by segment.
pub fn is_under(base: &str, url: &str) -> bool {
    let (Ok(base), Ok(target)) = (Url::parse(base), Url::parse(url)) else {
        return false;
    };
    if base.origin() != target.origin() {
        return false;
    }
    let prefix = base.path().trim_end_matches('/');
    let path = target.path();
    path == prefix || path.starts_with(&format!("{prefix}/"))
}

/// Maps a non-success status to the matching [`HostError`].
pub fn classify_status(status: StatusCode) -> Result<(), HostError> {
    if status.is_success() {
        return Ok(());
    }
    match status.as_u16() {
        404 => Err(HostError::NotFound),
        403 | 429 => Err(HostError::RateLimited),
        _ => Err(HostError::Network(format!("host responded with {status}"))),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> HostError {
    if err.is_timeout() {
        HostError::Network("request timed out".to_string())
    } else if err.is_decode() {
        HostError::Decode(err.to_string())
    } else {
        HostError::Network(err.to_string())
    }
}

/// One element of the JSON array the contents API returns for a directory.
#[derive(Debug, Deserialize)]
struct GhContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

#[async_trait]
impl ContentHost for GitHubClient {
    async fn list_directory(
        &self,
        source: &ContentSource,
    ) -> Result<Vec<DirectoryEntry>, HostError> {
        let url = self.listing_url(source);
        info!(url = %url, branch = %source.branch, "Fetching GitHub contents listing");

        let request = self
            .client
            .get(&url)
            .query(&[("ref", source.branch.as_str())])
            .header(ACCEPT, "application/vnd.github+json");
        let response = self
            .authorized(request, &url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        classify_status(status).inspect_err(|e| {
            error!(status = %status, url = %url, error = %e, "GitHub contents API returned error");
        })?;

        let body = response.text().await.map_err(map_reqwest_error)?;
        let listing: Vec<GhContentEntry> = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, url = %url, "Listing is not a JSON array of entries");
            HostError::Decode(format!("listing is not a directory: {e}"))
        })?;

        let entries: Vec<DirectoryEntry> = listing
            .into_iter()
            .map(|entry| {
                let kind = match entry.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => EntryKind::Other,
                };
                let locator = entry
                    .download_url
                    .unwrap_or_else(|| self.raw_url(source, &entry.name));
                DirectoryEntry {
                    name: entry.name,
                    kind,
                    locator,
                }
            })
            .collect();
        debug!(count = entries.len(), url = %url, "Parsed GitHub contents listing");
        Ok(entries)
    }

    async fn fetch_raw(&self, locator: &str) -> Result<String, HostError> {
        let request = self.client.get(locator);
        let response = self
            .authorized(request, locator)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        classify_status(status).inspect_err(|e| {
            error!(status = %status, locator = %locator, error = %e, "Raw file request failed");
        })?;

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| HostError::Decode(format!("file is not valid UTF-8: {e}")))
    }
}
