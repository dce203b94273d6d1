//! `cli` module
//!
//! This module implements the CLI interface for blog-feed: command parsing,
//! the async entrypoint, and user-visible output.
//!
//! All pipeline logic (listing, fetching, parsing, state publishing) lives in
//! the [`blog-feed-core`] crate. This module only wires config to it and
//! prints what it publishes.
//!
//! ## How To Use
//! - From a shell: `blog-feed fetch --config feed.yaml`, or `blog-feed parse post.md`.
//! - From tests: call [`run`] with a constructed [`Cli`].
//!
//! [`blog-feed-core`]: ../../blog-feed-core/

use crate::load_config::load_config;
use crate::view::{render_feed, PostSummary, RenderContext};
use anyhow::{Context, Result};
use blog_feed_core::config::DEFAULT_EXCERPT_LENGTH;
use blog_feed_core::download::PostDownloader;
use blog_feed_core::github::GitHubClient;
use blog_feed_core::post::parse_post;
use blog_feed_core::synchronise::FeedPublisher;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for blog-feed: render a blog feed from Markdown files in a hosted repository.
#[derive(Parser)]
#[clap(
    name = "blog-feed",
    version,
    about = "Fetch Markdown posts from a hosted repository and render them as a blog feed"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one fetch cycle for the configured source and render the feed
    Fetch {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// List every post instead of the preview
        #[clap(long)]
        all: bool,
        /// Print the posts as JSON instead of text
        #[clap(long)]
        json: bool,
    },
    /// Parse a local Markdown file and print the resulting post as JSON
    Parse {
        /// Markdown file to parse
        file: PathBuf,
        /// Maximum excerpt length in characters
        #[clap(long, default_value_t = DEFAULT_EXCERPT_LENGTH)]
        excerpt_length: usize,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Fetch { config, all, json } => {
            let config = load_config(config)?;
            tracing::info!(command = "fetch", source = %config.source, "Starting fetch cycle");

            let host = GitHubClient::new(config.host.clone())?;
            let downloader = PostDownloader::new(Arc::new(host), config.host.timeout());
            let publisher = FeedPublisher::new(downloader);
            publisher.set_source(config.source.clone()).await;
            let state = publisher.snapshot();

            if json {
                let summaries: Vec<PostSummary<'_>> = state
                    .posts
                    .iter()
                    .map(|post| PostSummary::new(post, config.display.excerpt_length))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                let ctx = RenderContext {
                    source: &config.source,
                    host: &config.host,
                    display: &config.display,
                    show_all: all,
                };
                println!("{}", render_feed(&state, &ctx));
            }

            match &state.error {
                Some(message) => {
                    tracing::error!(command = "fetch", error = %message, "Fetch cycle failed");
                    Err(anyhow::Error::msg(message.clone()))
                }
                None => {
                    tracing::info!(command = "fetch", posts = state.posts.len(), "Fetch cycle complete");
                    Ok(())
                }
            }
        }
        Commands::Parse {
            file,
            excerpt_length,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("{} has no usable file name", file.display()))?;
            let post = parse_post(file_name, &raw);
            tracing::info!(command = "parse", slug = %post.slug, "Parsed local post");
            println!(
                "{}",
                serde_json::to_string_pretty(&PostSummary::new(&post, excerpt_length))?
            );
            Ok(())
        }
    }
}
