//! Display helpers for a feed view: excerpts, reading time, dates and links.
//!
//! Nothing here is stored on a [`Post`]; a view derives these on demand.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::HostConfig;
use crate::contract::ContentSource;
use crate::post::{parse_date, Post};

/// Appended to an excerpt that was cut short. Counts as one character.
pub const ELLIPSIS: char = '…';
pub const WORDS_PER_MINUTE: usize = 200;

const MARKDOWN_MARKERS: &[char] = &['#', '*', '`', '_', '~', '[', ']'];

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-+>]|\d+[.)])[ \t]+").expect("valid regex"));

/// Plain-text preview of `content`, at most `max_len` characters plus [`ELLIPSIS`].
pub fn excerpt(content: &str, max_len: usize) -> String {
    let without_lists = LIST_MARKER.replace_all(content, "");
    let stripped: String = without_lists
        .chars()
        .filter(|c| !MARKDOWN_MARKERS.contains(c))
        .collect();
    let plain = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if plain.chars().count() <= max_len {
        return plain;
    }
    let cut: String = plain.chars().take(max_len).collect();
    let mut out = cut.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Whole minutes needed to read `content`, never less than one.
pub fn reading_time_minutes(content: &str) -> usize {
    content
        .split_whitespace()
        .count()
        .div_ceil(WORDS_PER_MINUTE)
        .max(1)
}

/// `2024-01-10` becomes `January 10, 2024`. Unparseable dates are returned as written.
pub fn format_date(date: &str) -> String {
    parse_date(date)
        .map(|stamp| stamp.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Link to the hosted file a post was read from.
pub fn post_url(host: &HostConfig, source: &ContentSource, slug: &str) -> String {
    format!(
        "{}/{}/{}/blob/{}/{}/{}.md",
        host.web_base.trim_end_matches('/'),
        source.account,
        source.repository,
        source.branch,
        source.directory(),
        slug
    )
}

/// Link to the hosted directory holding every post.
pub fn archive_url(host: &HostConfig, source: &ContentSource) -> String {
    format!(
        "{}/{}/{}/tree/{}/{}",
        host.web_base.trim_end_matches('/'),
        source.account,
        source.repository,
        source.branch,
        source.directory()
    )
}

/// The posts a grid shows: the first `limit`, or all of them.
pub fn visible_posts(posts: &[Post], limit: usize, show_all: bool) -> &[Post] {
    if show_all {
        posts
    } else {
        &posts[..posts.len().min(limit)]
    }
}
