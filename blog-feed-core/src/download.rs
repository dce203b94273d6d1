//! Directory listing and per-file retrieval on top of a [`ContentHost`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::contract::{ContentHost, ContentSource, DirectoryEntry, HostError};
use crate::post::{parse_post, Post};

/// PostDownloader wraps a host with the per-request timeout and exposes the
/// two pipeline steps: list the Markdown files, then fetch and parse one.
pub struct PostDownloader<H: ?Sized> {
    host: Arc<H>,
    request_timeout: Duration,
}

impl<H: ContentHost + ?Sized> PostDownloader<H> {
    pub fn new(host: Arc<H>, request_timeout: Duration) -> Self {
        Self {
            host,
            request_timeout,
        }
    }

    /// List the Markdown files under `source`, in the host's order.
    ///
    /// Fails with [`HostError::InvalidSource`] before any request when a
    /// field of `source` is empty.
    pub async fn list(&self, source: &ContentSource) -> Result<Vec<DirectoryEntry>, HostError> {
        source.validate()?;
        info!(source = %source, "Listing posts directory");

        let entries = self
            .bounded(self.host.list_directory(source))
            .await
            .inspect_err(|e| debug!(source = %source, error = %e, "Directory listing failed"))?;
        let total = entries.len();
        let markdown: Vec<DirectoryEntry> = entries
            .into_iter()
            .filter(DirectoryEntry::is_markdown)
            .collect();

        info!(
            source = %source,
            total,
            markdown = markdown.len(),
            "Directory listed"
        );
        Ok(markdown)
    }

    /// Retrieve one entry's raw text and parse it into a [`Post`].
    pub async fn fetch_and_parse(&self, entry: &DirectoryEntry) -> Result<Post, HostError> {
        debug!(name = %entry.name, locator = %entry.locator, "Fetching post");
        let raw = self.bounded(self.host.fetch_raw(&entry.locator)).await?;
        let post = parse_post(&entry.name, &raw);
        debug!(slug = %post.slug, date = %post.date, "Parsed post");
        Ok(post)
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, HostError>>,
    ) -> Result<T, HostError> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(HostError::Network(format!(
                "request timed out after {}s",
                self.request_timeout.as_secs_f64()
            ))),
        }
    }
}
