//! `load_config` module: Loads a static YAML config and injects secrets from the environment.
//!
//! This is the only place where the user-supplied YAML is parsed and mapped to
//! the strongly-typed [`FeedConfig`] of `blog-feed-core`.
//!
//! # Responsibilities
//! - Parse the config file into [`FeedConfig`], filling defaults for the optional sections
//! - Inject `GITHUB_TOKEN` from the environment; tokens never live in the file
//! - Reject sources with empty fields before any request is made
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use anyhow::Result;
use blog_feed_core::config::FeedConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Loads a static YAML config file and injects the optional token from env.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FeedConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: FeedConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Err(e) = config.source.validate() {
        error!(error = %e, config_path = ?path_ref, "Config has an invalid source");
        return Err(anyhow::anyhow!("Invalid source in config: {e}"));
    }

    config.host.token = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|token| !token.trim().is_empty());
    info!(
        token_set = config.host.token.is_some(),
        "Host token resolved from environment"
    );

    config.trace_loaded();
    Ok(config)
}
