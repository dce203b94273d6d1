//! Turning one Markdown file into a [`Post`].
//!
//! A file may open with a front-matter block:
//!
//! ```text
//! ---
//! title: Alpha
//! date: 2024-01-10
//! tags: [rust, notes]
//! ---
//! Body starts here.
//! ```
//!
//! The block is optional. Without it the whole file is the body and title and
//! date are derived from the filename and [`FALLBACK_DATE`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Date given to posts whose front-matter has none.
pub const FALLBACK_DATE: &str = "1970-01-01";

const DELIMITER: &str = "---";
const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Filename without `.md`; the post's identity within one listing.
    pub slug: String,
    pub title: String,
    /// ISO-8601 date as written in the front-matter.
    pub date: String,
    /// File body without the front-matter block.
    pub content: String,
    pub tags: Vec<String>,
}

impl Post {
    /// Sort key for newest-first ordering. Unparseable dates yield `None`,
    /// which orders them after every dated post.
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }
}

/// Metadata read from a front-matter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub tags: Vec<String>,
}

/// Parse a file's text into a post. Pure: the same input always yields the same post.
pub fn parse_post(file_name: &str, raw: &str) -> Post {
    let slug = slug_from_file_name(file_name).to_string();
    let raw = raw.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw);
    let (front, content) = match split_front_matter(raw) {
        Some((block, body)) => (parse_front_matter(block), body),
        None => (FrontMatter::default(), raw),
    };

    Post {
        title: front.title.unwrap_or_else(|| title_from_slug(&slug)),
        date: front.date.unwrap_or_else(|| FALLBACK_DATE.to_string()),
        content: content.to_string(),
        tags: front.tags,
        slug,
    }
}

pub fn slug_from_file_name(file_name: &str) -> &str {
    file_name.strip_suffix(".md").unwrap_or(file_name)
}

/// `second-post` becomes `Second Post`.
pub fn title_from_slug(slug: &str) -> String {
    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        slug.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split `raw` into `(front-matter block, body)` when it opens with a
/// delimited block. Returns `None` when the opening or closing delimiter is missing.
pub fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');
    let opening = lines.next()?;
    if opening.trim_end() != DELIMITER {
        return None;
    }

    let block_start = opening.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&raw[block_start..offset], &raw[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Line-oriented `key: value` parsing. Lines without a colon and unknown keys are skipped.
pub fn parse_front_matter(block: &str) -> FrontMatter {
    let mut front = FrontMatter::default();
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = unquote(value.trim());
        match key.trim().to_ascii_lowercase().as_str() {
            "title" => front.title = non_empty(value),
            "date" => front.date = non_empty(value),
            "tags" => front.tags = parse_tags(value),
            _ => {}
        }
    }
    front
}

fn parse_tags(value: &str) -> Vec<String> {
    let list = value.trim();
    let list = list.strip_prefix('[').unwrap_or(list);
    let list = list.strip_suffix(']').unwrap_or(list);
    list.split(',')
        .map(|tag| unquote(tag.trim()))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].trim();
        }
    }
    value
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD[ T]HH:MM[:SS]` and bare `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.naive_utc());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(stamp);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
}

/// Newest first. Stable, so equal dates keep their listing order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
}
