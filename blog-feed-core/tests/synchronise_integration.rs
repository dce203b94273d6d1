use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use blog_feed_core::contract::{
    ContentHost, ContentSource, DirectoryEntry, EntryKind, HostError, MockContentHost,
};
use blog_feed_core::download::PostDownloader;
use blog_feed_core::post::FALLBACK_DATE;
use blog_feed_core::synchronise::{fetch_posts, FeedPublisher, FeedView, Phase};

fn source() -> ContentSource {
    ContentSource::new("octocat", "notes", "main", "posts")
}

fn publisher<H: ContentHost + 'static>(host: H) -> FeedPublisher<H> {
    FeedPublisher::new(PostDownloader::new(Arc::new(host), Duration::from_secs(10)))
}

fn slugs(posts: &[blog_feed_core::post::Post]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}

#[tokio::test]
async fn front_matter_post_sorts_before_fallback_dated_post() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().times(1).returning(|_| {
        Ok(vec![
            DirectoryEntry::file("a.md", "raw://a"),
            DirectoryEntry::file("second-post.md", "raw://second"),
        ])
    });
    host.expect_fetch_raw().times(2).returning(|locator| match locator {
        "raw://a" => Ok("---\ntitle: Alpha\ndate: 2024-01-10\n---\nAlpha body".to_string()),
        "raw://second" => Ok("Plain body without metadata.".to_string()),
        other => panic!("unexpected locator {other}"),
    });

    let feed = publisher(host);
    assert!(feed.set_source(source()).await);

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Loaded);
    assert!(!state.is_loading());
    assert_eq!(state.error, None);
    assert_eq!(slugs(&state.posts), vec!["a", "second-post"]);
    assert_eq!(state.posts[0].title, "Alpha");
    assert_eq!(state.posts[0].content, "Alpha body");
    assert_eq!(state.posts[1].title, "Second Post");
    assert_eq!(state.posts[1].date, FALLBACK_DATE);
}

#[tokio::test]
async fn listing_keeps_only_markdown_files() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().returning(|_| {
        Ok(vec![
            DirectoryEntry {
                name: "drafts".to_string(),
                kind: EntryKind::Dir,
                locator: "raw://drafts".to_string(),
            },
            DirectoryEntry::file("cover.png", "raw://cover"),
            DirectoryEntry::file("one.md", "raw://one"),
            DirectoryEntry::file(".md", "raw://nameless"),
            DirectoryEntry::file("LOUD.MD", "raw://loud"),
            DirectoryEntry {
                name: "linked.md".to_string(),
                kind: EntryKind::Other,
                locator: "raw://linked".to_string(),
            },
            DirectoryEntry::file("two.md", "raw://two"),
        ])
    });
    host.expect_fetch_raw()
        .times(2)
        .returning(|locator| Ok(format!("body of {locator}")));

    let downloader = PostDownloader::new(Arc::new(host), Duration::from_secs(10));
    let entries = downloader.list(&source()).await.expect("listing succeeds");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["one.md", "two.md"]);

    let posts = fetch_posts(&downloader, &source())
        .await
        .expect("cycle succeeds");
    assert_eq!(slugs(&posts), vec!["one", "two"]);
}

#[tokio::test]
async fn missing_directory_is_an_empty_feed() {
    let mut host = MockContentHost::new();
    host.expect_list_directory()
        .times(1)
        .returning(|_| Err(HostError::NotFound));
    host.expect_fetch_raw().never();

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert!(!state.is_loading());
    assert_eq!(state.error, None);
    assert!(state.posts.is_empty());
    assert_eq!(state.view(), FeedView::Empty);
}

#[tokio::test]
async fn failing_entry_is_dropped_without_surfacing_an_error() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().returning(|_| {
        Ok(vec![
            DirectoryEntry::file("one.md", "raw://one"),
            DirectoryEntry::file("broken.md", "raw://broken"),
            DirectoryEntry::file("three.md", "raw://three"),
        ])
    });
    host.expect_fetch_raw().times(3).returning(|locator| match locator {
        "raw://broken" => Err(HostError::Network("connection reset".to_string())),
        _ => Ok("body".to_string()),
    });

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Loaded);
    assert_eq!(state.error, None);
    assert_eq!(slugs(&state.posts), vec!["one", "three"]);
}

#[tokio::test]
async fn undecodable_entry_is_dropped_and_cycle_still_loads() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().returning(|_| {
        Ok(vec![
            DirectoryEntry::file("binary.md", "raw://binary"),
            DirectoryEntry::file("text.md", "raw://text"),
        ])
    });
    host.expect_fetch_raw().times(2).returning(|locator| match locator {
        "raw://binary" => Err(HostError::Decode("file is not valid UTF-8".to_string())),
        _ => Ok("---\ndate: 2024-02-02\n---\nReadable.".to_string()),
    });

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Loaded);
    assert_eq!(state.error, None);
    assert_eq!(slugs(&state.posts), vec!["text"]);
    assert_eq!(state.posts[0].content, "Readable.");
}

#[tokio::test]
async fn rate_limited_listing_fails_the_cycle_with_a_distinct_message() {
    let mut host = MockContentHost::new();
    host.expect_list_directory()
        .returning(|_| Err(HostError::RateLimited));
    host.expect_fetch_raw().never();

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state.posts.is_empty());
    let message = state.error.clone().expect("error is surfaced");
    assert!(message.contains("rate limit"), "got: {message}");
    assert!(matches!(state.view(), FeedView::Failed(_)));
}

#[tokio::test]
async fn network_failure_on_listing_fails_the_cycle() {
    let mut host = MockContentHost::new();
    host.expect_list_directory()
        .returning(|_| Err(HostError::Network("dns lookup failed".to_string())));
    host.expect_fetch_raw().never();

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state
        .error
        .as_deref()
        .is_some_and(|m| m.contains("dns lookup failed")));
}

#[tokio::test]
async fn blank_source_field_fails_before_any_request() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().never();
    host.expect_fetch_raw().never();

    let feed = publisher(host);
    feed.set_source(ContentSource::new("octocat", "notes", " ", "posts"))
        .await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state
        .error
        .as_deref()
        .is_some_and(|m| m.contains("branch must not be empty")));
}

#[tokio::test]
async fn duplicate_slug_keeps_the_entry_listed_last() {
    let mut host = MockContentHost::new();
    host.expect_list_directory().returning(|_| {
        Ok(vec![
            DirectoryEntry::file("dup.md", "raw://first"),
            DirectoryEntry::file("other.md", "raw://other"),
            DirectoryEntry::file("dup.md", "raw://last"),
        ])
    });
    host.expect_fetch_raw().returning(|locator| match locator {
        "raw://first" => Ok("---\ntitle: First\n---\n".to_string()),
        "raw://last" => Ok("---\ntitle: Last\n---\n".to_string()),
        _ => Ok("other".to_string()),
    });

    let feed = publisher(host);
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(slugs(&state.posts), vec!["other", "dup"]);
    assert_eq!(state.posts[1].title, "Last");
}

#[tokio::test]
async fn published_posts_are_newest_first_with_unique_slugs() {
    let dates = [
        ("mid.md", "2023-06-15"),
        ("undated.md", ""),
        ("newest.md", "2025-01-01T09:00:00Z"),
        ("oldest.md", "2001-09-09"),
        ("also-mid.md", "2023-06-15"),
    ];
    let mut host = MockContentHost::new();
    host.expect_list_directory().returning(move |_| {
        Ok(dates
            .iter()
            .map(|(name, _)| DirectoryEntry::file(*name, format!("raw://{name}")))
            .collect())
    });
    host.expect_fetch_raw().returning(move |locator| {
        let (_, date) = dates
            .iter()
            .find(|(name, _)| locator.strip_prefix("raw://") == Some(*name))
            .expect("known locator");
        Ok(format!("---\ndate: {date}\n---\nbody"))
    });

    let feed = publisher(host);
    feed.set_source(source()).await;
    let state = feed.snapshot();

    assert_eq!(
        slugs(&state.posts),
        vec!["newest", "mid", "also-mid", "oldest", "undated"]
    );
    for pair in state.posts.windows(2) {
        assert!(pair[0].published_at() >= pair[1].published_at());
    }
    let unique: HashSet<&str> = state.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(unique.len(), state.posts.len());
}

#[tokio::test]
async fn same_source_is_a_no_op_but_reload_refetches() {
    let mut host = MockContentHost::new();
    host.expect_list_directory()
        .times(2)
        .returning(|_| Ok(vec![DirectoryEntry::file("one.md", "raw://one")]));
    host.expect_fetch_raw()
        .times(2)
        .returning(|_| Ok("body".to_string()));

    let feed = publisher(host);
    assert!(!feed.reload().await, "nothing to reload before a source is set");
    assert!(feed.set_source(source()).await);
    assert!(!feed.set_source(source()).await);
    assert!(feed.reload().await);
    assert_eq!(slugs(&feed.snapshot().posts), vec!["one"]);
}

#[tokio::test]
async fn failed_reload_clears_previous_posts() {
    let mut host = MockContentHost::new();
    let mut calls = 0;
    host.expect_list_directory().returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(vec![DirectoryEntry::file("one.md", "raw://one")])
        } else {
            Err(HostError::Decode("not a directory".to_string()))
        }
    });
    host.expect_fetch_raw()
        .returning(|_| Ok("body".to_string()));

    let feed = publisher(host);
    let mut updates = feed.subscribe();

    feed.set_source(source()).await;
    assert!(updates.has_changed().expect("publisher alive"));
    assert_eq!(updates.borrow_and_update().posts.len(), 1);

    feed.reload().await;
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state.posts.is_empty());
    assert!(state.error.is_some());
}

/// Holds the listing of the `old` repository until released.
struct GatedHost {
    release_old: Notify,
}

#[async_trait]
impl ContentHost for GatedHost {
    async fn list_directory(
        &self,
        source: &ContentSource,
    ) -> Result<Vec<DirectoryEntry>, HostError> {
        if source.repository == "old" {
            self.release_old.notified().await;
            Ok(vec![DirectoryEntry::file("stale.md", "raw://stale")])
        } else {
            Ok(vec![DirectoryEntry::file("fresh.md", "raw://fresh")])
        }
    }

    async fn fetch_raw(&self, locator: &str) -> Result<String, HostError> {
        Ok(format!("---\ntitle: {locator}\n---\n"))
    }
}

#[tokio::test]
async fn results_of_a_superseded_cycle_are_discarded() {
    let host = Arc::new(GatedHost {
        release_old: Notify::new(),
    });
    let feed = FeedPublisher::new(PostDownloader::new(host.clone(), Duration::from_secs(10)));
    let old = ContentSource::new("octocat", "old", "main", "posts");
    let new = ContentSource::new("octocat", "new", "main", "posts");

    let (old_started, new_started) = tokio::join!(feed.set_source(old), async {
        let started = feed.set_source(new).await;
        host.release_old.notify_one();
        started
    });
    assert!(old_started && new_started);

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Loaded);
    assert_eq!(slugs(&state.posts), vec!["fresh"]);
}

/// Never answers requests for `raw://slow`.
struct SlowHost;

#[async_trait]
impl ContentHost for SlowHost {
    async fn list_directory(
        &self,
        source: &ContentSource,
    ) -> Result<Vec<DirectoryEntry>, HostError> {
        if source.repository == "stalled" {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(vec![
            DirectoryEntry::file("quick.md", "raw://quick"),
            DirectoryEntry::file("slow.md", "raw://slow"),
        ])
    }

    async fn fetch_raw(&self, locator: &str) -> Result<String, HostError> {
        if locator == "raw://slow" {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok("body".to_string())
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_post_is_dropped() {
    let feed = FeedPublisher::new(PostDownloader::new(Arc::new(SlowHost), Duration::from_secs(10)));
    feed.set_source(source()).await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Loaded);
    assert_eq!(slugs(&state.posts), vec!["quick"]);
}

#[tokio::test(start_paused = true)]
async fn timed_out_listing_is_a_network_failure() {
    let feed = FeedPublisher::new(PostDownloader::new(Arc::new(SlowHost), Duration::from_secs(10)));
    feed.set_source(ContentSource::new("octocat", "stalled", "main", "posts"))
        .await;

    let state = feed.snapshot();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state
        .error
        .as_deref()
        .is_some_and(|m| m.contains("timed out")));
}
