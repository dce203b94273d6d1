//! # contract: the seam between the feed pipeline and a content host
//!
//! This module defines the [`ContentHost`] trait and the plain data types that
//! cross it: the [`ContentSource`] identifying a directory in a hosted
//! repository, the [`DirectoryEntry`] values a listing yields, and the
//! [`HostError`] kinds every host implementation maps its failures into.
//!
//! ## Interface & Extensibility
//! - Any provider exposing a "list directory" call and a "fetch raw file" call fits.
//!   See [`crate::github::GitHubClient`] for the concrete GitHub implementation.
//! - All methods are async and return [`HostError`], so the orchestration layer
//!   can tell "zero posts" (`NotFound`) apart from quota and transport failures.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; enable the `test-export-mocks` feature
//!   (on by default) to use `MockContentHost` from integration tests.

use std::fmt;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Identifies a directory of Markdown posts in a hosted repository.
///
/// Compared by value on all four fields: two sources are the same feed only
/// if account, repository, branch and path all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentSource {
    /// Account (user or organisation) owning the repository.
    pub account: String,
    pub repository: String,
    pub branch: String,
    /// Sub-path of the directory holding the posts, e.g. `posts` or `blog/notes`.
    pub path: String,
}

impl ContentSource {
    pub fn new(
        account: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            repository: repository.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }

    /// Rejects a source with any empty (or blank) field.
    pub fn validate(&self) -> Result<(), HostError> {
        let fields = [
            ("account", &self.account),
            ("repository", &self.repository),
            ("branch", &self.branch),
            ("path", &self.path),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(HostError::InvalidSource(format!("{field} must not be empty")));
            }
        }
        if self.directory().is_empty() {
            return Err(HostError::InvalidSource(
                "path must name a directory".to_string(),
            ));
        }
        Ok(())
    }

    /// The sub-path without leading or trailing slashes.
    pub fn directory(&self) -> &str {
        self.path.trim().trim_matches('/')
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}:{}",
            self.account,
            self.repository,
            self.branch,
            self.directory()
        )
    }
}

/// What a listed entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else the host reports.
    Other,
}

/// One result of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Where the raw file content can be retrieved from.
    pub locator: String,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            locator: locator.into(),
        }
    }

    /// A regular file named `<stem>.md` with a non-empty stem.
    pub fn is_markdown(&self) -> bool {
        self.kind == EntryKind::File
            && self
                .name
                .strip_suffix(".md")
                .is_some_and(|stem| !stem.is_empty())
    }
}

/// Failure kinds reported by a [`ContentHost`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The requested path does not exist on the host.
    #[error("path not found on content host")]
    NotFound,
    /// Transport failure, timeout, or an unexpected HTTP status.
    #[error("network error: {0}")]
    Network(String),
    /// The host refused the request because a quota was exhausted.
    #[error("rate limit exceeded on content host")]
    RateLimited,
    /// The response body was not text or did not have the expected shape.
    #[error("unexpected response from content host: {0}")]
    Decode(String),
    #[error("invalid content source: {0}")]
    InvalidSource(String),
}

impl HostError {
    /// Message shown to a reader of the feed when a cycle fails.
    pub fn user_message(&self) -> String {
        match self {
            HostError::NotFound => "The configured posts directory does not exist".to_string(),
            HostError::Network(detail) => {
                format!("Could not reach the content host ({detail})")
            }
            HostError::RateLimited => {
                "The content host's rate limit was exceeded, try again later".to_string()
            }
            HostError::Decode(detail) => {
                format!("The content host returned an unexpected response ({detail})")
            }
            HostError::InvalidSource(detail) => {
                format!("The content source is misconfigured ({detail})")
            }
        }
    }
}

/// Trait for hosts that can list a directory and serve raw file content.
///
/// Implemented by [`crate::github::GitHubClient`] and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// List every entry directly under `source`'s path, in the host's order.
    async fn list_directory(&self, source: &ContentSource)
        -> Result<Vec<DirectoryEntry>, HostError>;

    /// Fetch the raw text behind a [`DirectoryEntry::locator`].
    async fn fetch_raw(&self, locator: &str) -> Result<String, HostError>;
}
