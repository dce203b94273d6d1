use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::ContentSource;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_EXCERPT_LENGTH: usize = 200;
pub const DEFAULT_PREVIEW_LIMIT: usize = 6;

/// Everything needed to run and render one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub source: ContentSource,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl FeedConfig {
    pub fn trace_loaded(&self) {
        info!(
            source = %self.source,
            api_base = %self.host.api_base,
            timeout_secs = self.host.timeout_secs,
            "Loaded FeedConfig"
        );
        debug!(?self, "FeedConfig loaded (full debug)");
    }
}

/// Connection settings for the content host.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub api_base: String,
    pub raw_base: String,
    /// Base for the human-facing links to posts and the archive.
    pub web_base: String,
    /// Ceiling for every single request; expiry counts as a network error.
    pub timeout_secs: u64,
    /// Bearer token, injected from the environment rather than the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl HostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("web_base", &self.web_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How the feed is presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum excerpt length in characters, before the ellipsis.
    pub excerpt_length: usize,
    /// Number of posts shown before "show all" is requested.
    pub preview_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}
