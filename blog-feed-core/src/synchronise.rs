//! High-level pipeline: list → fetch → parse → publish for one content source.
//!
//! This module runs the ingestion "cycle" and publishes its outcome as a
//! [`FeedState`] snapshot that a view renders:
//!   - Lists the Markdown files of the configured directory
//!   - Fetches and parses every file concurrently (join-all, not a race)
//!   - Drops entries that fail, deduplicates slugs, sorts newest first
//!   - Publishes `{posts, loading, error}` on every phase transition
//!
//! # Major Types
//! - [`FeedPublisher`]: owns the current source, the cycle generation and the state channel
//! - [`FeedState`]: immutable snapshot handed to subscribers
//!
//! # Error Handling
//! A listing failure ends the cycle in [`Phase::Failed`] with a readable message,
//! except `NotFound`, which is an empty feed. Per-post failures are logged and dropped.
//!
//! # Stale cycles
//! Each cycle takes a generation number when it starts. When it settles, its
//! result is published only if no newer cycle has started in the meantime.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::contract::{ContentHost, ContentSource, HostError};
use crate::download::PostDownloader;
use crate::post::{sort_posts, Post};

/// Runs one full cycle and returns the posts to publish.
pub async fn fetch_posts<H>(
    downloader: &PostDownloader<H>,
    source: &ContentSource,
) -> Result<Vec<Post>, HostError>
where
    H: ContentHost + ?Sized,
{
    let entries = match downloader.list(source).await {
        Ok(entries) => entries,
        Err(HostError::NotFound) => {
            info!(source = %source, "Posts directory not found, treating as empty feed");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let results = join_all(entries.iter().map(|entry| downloader.fetch_and_parse(entry))).await;

    let mut posts = Vec::with_capacity(results.len());
    let mut dropped = 0usize;
    for (entry, result) in entries.iter().zip(results) {
        match result {
            Ok(post) => posts.push(post),
            Err(e) => {
                dropped += 1;
                warn!(name = %entry.name, error = %e, "Dropping post that could not be fetched");
            }
        }
    }

    let mut posts = dedup_by_slug(posts);
    sort_posts(&mut posts);
    info!(
        source = %source,
        posts = posts.len(),
        dropped,
        "Fetched posts"
    );
    Ok(posts)
}

/// Keeps one post per slug: the one listed last, at its own position.
fn dedup_by_slug(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Post> = posts
        .into_iter()
        .rev()
        .filter(|post| {
            let fresh = seen.insert(post.slug.clone());
            if !fresh {
                warn!(slug = %post.slug, "Duplicate slug, keeping the entry listed last");
            }
            fresh
        })
        .collect();
    kept.reverse();
    kept
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What a view sees. Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub phase: Phase,
    pub posts: Arc<[Post]>,
    pub error: Option<String>,
}

/// The four things a view can draw.
#[derive(Debug, PartialEq)]
pub enum FeedView<'a> {
    Loading,
    Failed(&'a str),
    Empty,
    Posts(&'a [Post]),
}

impl FeedState {
    fn with_phase(phase: Phase) -> Self {
        Self {
            phase,
            posts: Arc::from(Vec::new()),
            error: None,
        }
    }

    pub fn idle() -> Self {
        Self::with_phase(Phase::Idle)
    }

    pub fn loading() -> Self {
        Self::with_phase(Phase::Loading)
    }

    pub fn loaded(posts: Vec<Post>) -> Self {
        Self {
            phase: Phase::Loaded,
            posts: Arc::from(posts),
            error: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::with_phase(Phase::Failed)
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// What to draw for this state. `Idle` has no panel of its own: before the
    /// first cycle starts it draws as [`FeedView::Loading`], even though
    /// [`FeedState::is_loading`] is still false.
    pub fn view(&self) -> FeedView<'_> {
        match (&self.error, self.phase) {
            (Some(message), _) => FeedView::Failed(message),
            (None, Phase::Idle | Phase::Loading) => FeedView::Loading,
            (None, _) if self.posts.is_empty() => FeedView::Empty,
            (None, _) => FeedView::Posts(&self.posts),
        }
    }
}

struct CycleTracker {
    generation: u64,
    source: Option<ContentSource>,
}

struct Ticket {
    generation: u64,
    source: ContentSource,
}

/// Drives cycles for a changing [`ContentSource`] and publishes their state.
pub struct FeedPublisher<H: ?Sized> {
    downloader: PostDownloader<H>,
    state: watch::Sender<FeedState>,
    cycle: Mutex<CycleTracker>,
}

impl<H: ContentHost + ?Sized> FeedPublisher<H> {
    pub fn new(downloader: PostDownloader<H>) -> Self {
        let (state, _) = watch::channel(FeedState::idle());
        Self {
            downloader,
            state,
            cycle: Mutex::new(CycleTracker {
                generation: 0,
                source: None,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Point the feed at `source` and run a cycle for it.
    ///
    /// Returns `false` without doing anything when `source` equals the current one.
    pub async fn set_source(&self, source: ContentSource) -> bool {
        let ticket = {
            let mut cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
            if cycle.source.as_ref() == Some(&source) {
                debug!(source = %source, "Source unchanged, keeping current cycle");
                return false;
            }
            self.begin(&mut cycle, source)
        };
        self.run(ticket).await;
        true
    }

    /// Re-run a cycle for the current source. Returns `false` when no source is set.
    pub async fn reload(&self) -> bool {
        let ticket = {
            let mut cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(source) = cycle.source.clone() else {
                return false;
            };
            self.begin(&mut cycle, source)
        };
        self.run(ticket).await;
        true
    }

    fn begin(&self, cycle: &mut CycleTracker, source: ContentSource) -> Ticket {
        cycle.generation += 1;
        cycle.source = Some(source.clone());
        info!(generation = cycle.generation, source = %source, "Starting feed cycle");
        self.state.send_replace(FeedState::loading());
        Ticket {
            generation: cycle.generation,
            source,
        }
    }

    async fn run(&self, ticket: Ticket) {
        let outcome = fetch_posts(&self.downloader, &ticket.source).await;
        self.settle(ticket, outcome);
    }

    fn settle(&self, ticket: Ticket, outcome: Result<Vec<Post>, HostError>) {
        let cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);
        if cycle.generation != ticket.generation {
            info!(
                stale = ticket.generation,
                current = cycle.generation,
                source = %ticket.source,
                "Discarding results of a superseded cycle"
            );
            return;
        }
        let next = match outcome {
            Ok(posts) => FeedState::loaded(posts),
            Err(e) => {
                error!(source = %ticket.source, error = %e, "Feed cycle failed");
                FeedState::failed(e.user_message())
            }
        };
        self.state.send_replace(next);
    }
}
