use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::classify::PostKind;
use super::flatten::{capture_id, flatten};
use crate::api::MisskeyApi;
use crate::capture::CaptureRegistry;
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::{ApiError, TimelineError};
use crate::models::{DisplayItem, FeedEvent, LoadMode, Post, PostId, TimelineKind, TimelineQuery};

/// Fetches one page of history per query and emits its display items.
#[derive(Clone)]
pub struct HistoryLoader {
    api: Arc<dyn MisskeyApi>,
    registry: Option<CaptureRegistry>,
    page_size: u32,
}

impl HistoryLoader {
    pub fn new(api: Arc<dyn MisskeyApi>) -> Self {
        Self {
            api,
            registry: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size for queries that don't set their own limit
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Queue the ids of every page shown for capture in `registry`
    pub fn with_registry(mut self, registry: CaptureRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Call the endpoint matching the query's kind. `Ok(None)` means a
    /// required parameter is missing and nothing was requested.
    async fn fetch(&self, query: &TimelineQuery) -> Result<Option<Vec<Post>>, ApiError> {
        let page = query.page(self.page_size);

        if let Some(feed) = query.kind.global_feed() {
            return self.api.timeline(feed, &page).await.map(Some);
        }

        match query.kind {
            TimelineKind::UserTimeline => match &query.user_id {
                Some(user_id) => self
                    .api
                    .user_notes(user_id, query.include_replies, query.only_files, &page)
                    .await
                    .map(Some),
                None => Ok(None),
            },
            TimelineKind::ListTimeline => match &query.list_id {
                Some(list_id) => self.api.list_notes(list_id, &page).await.map(Some),
                None => Ok(None),
            },
            TimelineKind::Search => match &query.search {
                Some(text) => self.api.search_notes(text, &page).await.map(Some),
                None => Ok(None),
            },
            // Instance-wide feeds were handled above
            _ => Ok(None),
        }
    }

    /// Load one page into `tx`, ending with a terminal event.
    ///
    /// Returns the ids worth capturing for the posts that made it onto the
    /// feed, in emission order. With a registry attached, and for kinds that
    /// have a live channel, they are deferred there before the terminal event
    /// goes out.
    pub async fn run(
        &self,
        query: &TimelineQuery,
        tx: &mpsc::Sender<FeedEvent<DisplayItem>>,
    ) -> Vec<PostId> {
        let posts = match self.fetch(query).await {
            Ok(Some(posts)) => posts,
            Ok(None) => {
                debug!(kind = query.kind.label(), "query is missing its target, nothing loaded");
                let _ = tx.send(FeedEvent::Completed).await;
                return Vec::new();
            }
            Err(e) => {
                warn!(kind = query.kind.label(), "timeline fetch failed: {}", e);
                let _ = tx.send(FeedEvent::Failed(TimelineError::Transport(e))).await;
                return Vec::new();
            }
        };

        let mode = query.mode();
        let reverse = matches!(mode, LoadMode::Reload { .. });
        let fetched = posts.len();
        debug!(kind = query.kind.label(), fetched, ?mode, "page loaded");

        let mut shown = Vec::new();
        let mut consumer_gone = false;
        'posts: for post in select_posts(posts, &mode) {
            let kind = PostKind::of(&post);
            let items = flatten(&post, kind, reverse);
            if items.is_empty() {
                continue;
            }

            for item in items {
                if tx.send(FeedEvent::Item(item)).await.is_err() {
                    consumer_gone = true;
                    break 'posts;
                }
            }
            shown.push(capture_id(&post, kind).to_string());
        }

        // Only a live frame drains the deferred list, so kinds without a
        // channel must not feed it
        if let Some(registry) = &self.registry {
            if !shown.is_empty() && query.kind.needs_streaming() {
                registry.defer(shown.iter().cloned());
            }
        }
        if consumer_gone {
            debug!("history consumer dropped");
            return shown;
        }

        if fetched == 0 && !reverse {
            let _ = tx.send(FeedEvent::EmptyPage).await;
        }
        let _ = tx.send(FeedEvent::Completed).await;
        shown
    }
}

/// Filter and order a fetched page for the given load mode.
///
/// Highlighted posts never make it through. Promoted posts survive only on
/// the first page. A reload keeps what is newer than `last_seen_id` and
/// returns it oldest first.
pub fn select_posts(posts: Vec<Post>, mode: &LoadMode) -> Vec<Post> {
    match mode {
        LoadMode::Initial => posts.into_iter().filter(|p| !p.is_highlighted()).collect(),
        LoadMode::Paginate => posts
            .into_iter()
            .filter(|p| !p.is_highlighted() && !p.is_promoted())
            .collect(),
        LoadMode::Reload { last_seen_id } => {
            let mut newer: Vec<Post> = posts
                .into_iter()
                .filter(|p| !p.is_highlighted())
                .take_while(|p| !p.refers_to(last_seen_id))
                .collect();
            newer.reverse();
            newer
        }
    }
}
