//! Plain-text rendering of the four feed states.

use blog_feed_core::config::{DisplayConfig, HostConfig};
use blog_feed_core::contract::ContentSource;
use blog_feed_core::post::Post;
use blog_feed_core::render::{
    archive_url, excerpt, format_date, post_url, reading_time_minutes, visible_posts,
};
use blog_feed_core::synchronise::{FeedState, FeedView};
use serde::Serialize;

/// Where the rendered links point and how much of the feed to show.
pub struct RenderContext<'a> {
    pub source: &'a ContentSource,
    pub host: &'a HostConfig,
    pub display: &'a DisplayConfig,
    pub show_all: bool,
}

pub fn render_feed(state: &FeedState, ctx: &RenderContext<'_>) -> String {
    let mut lines = Vec::new();
    match state.view() {
        FeedView::Loading => lines.push(format!("Loading posts from {}...", ctx.source)),
        FeedView::Failed(message) => {
            lines.push("Unable to load posts".to_string());
            lines.push(format!(
                "  {message}. Verify the repository configuration and network connection."
            ));
        }
        FeedView::Empty => {
            lines.push("No posts found".to_string());
            lines.push(format!(
                "  Create Markdown files under {} to publish them.",
                archive_url(ctx.host, ctx.source)
            ));
        }
        FeedView::Posts(posts) => {
            let shown = visible_posts(posts, ctx.display.preview_limit, ctx.show_all);
            for post in shown {
                lines.extend(render_card(post, ctx));
                lines.push(String::new());
            }
            if shown.len() < posts.len() {
                lines.push(format!(
                    "Showing {} of {} posts, pass --all to list every post.",
                    shown.len(),
                    posts.len()
                ));
            }
            lines.push(format!(
                "Full archive: {}",
                archive_url(ctx.host, ctx.source)
            ));
        }
    }
    lines.join("\n")
}

fn render_card(post: &Post, ctx: &RenderContext<'_>) -> Vec<String> {
    let mut card = vec![
        format!(
            "{}  ·  {} min",
            format_date(&post.date),
            reading_time_minutes(&post.content)
        ),
        post.title.clone(),
    ];
    let preview = excerpt(&post.content, ctx.display.excerpt_length);
    if !preview.is_empty() {
        card.push(format!("  {preview}"));
    }
    if !post.tags.is_empty() {
        card.push(format!("  tags: {}", post.tags.join(", ")));
    }
    card.push(format!("  {}", post_url(ctx.host, ctx.source, &post.slug)));
    card
}

/// A post plus its derived display fields, as printed by `--json` and `parse`.
#[derive(Debug, Serialize)]
pub struct PostSummary<'a> {
    #[serde(flatten)]
    pub post: &'a Post,
    pub display_date: String,
    pub reading_minutes: usize,
    pub excerpt: String,
}

impl<'a> PostSummary<'a> {
    pub fn new(post: &'a Post, excerpt_length: usize) -> Self {
        Self {
            post,
            display_date: format_date(&post.date),
            reading_minutes: reading_time_minutes(&post.content),
            excerpt: excerpt(&post.content, excerpt_length),
        }
    }
}
