//! Per-session bookkeeping of posts subscribed for live updates.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::TimelineError;
use crate::models::PostId;
use crate::streaming::StreamClient;

#[derive(Debug, Default)]
struct CaptureState {
    /// Membership of `order`
    captured: HashSet<PostId>,
    /// Captured ids in first-capture order, replayed as-is after reconnect
    order: Vec<PostId>,
    /// Ids shown by history loads, waiting for the stream to be up
    deferred: Vec<PostId>,
}

/// The set of captured post ids for one timeline session.
///
/// Clones share the same set. Bookkeeping is deduplicated; subscribe calls
/// themselves may be repeated since the server treats them as idempotent.
#[derive(Debug, Clone, Default)]
pub struct CaptureRegistry {
    inner: Arc<Mutex<CaptureState>>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `ids` into the set and subscribe each of them.
    pub async fn capture_after_initial_load(&self, client: &dyn StreamClient, ids: &[PostId]) {
        let mut unique: Vec<&PostId> = Vec::with_capacity(ids.len());
        {
            let mut state = self.inner.lock();
            for id in ids {
                if !unique.contains(&id) {
                    unique.push(id);
                }
                if state.captured.insert(id.clone()) {
                    state.order.push(id.clone());
                }
            }
        }

        join_all(unique.into_iter().map(|id| subscribe(client, id))).await;
    }

    /// Capture one post that just arrived through the live feed
    pub async fn capture_single(&self, client: &dyn StreamClient, id: &str) {
        self.capture_after_initial_load(client, &[id.to_string()]).await;
    }

    /// Re-subscribe every captured id after a reconnection. The set itself
    /// is left untouched. Returns the number of subscribe calls issued.
    pub async fn replay_on_reconnect(&self, client: &dyn StreamClient) -> usize {
        let ids = self.inner.lock().order.clone();
        debug!(count = ids.len(), "replaying captures after reconnect");
        join_all(ids.iter().map(|id| subscribe(client, id))).await;
        ids.len()
    }

    /// Queue ids shown by a history load until the stream can capture them
    pub fn defer(&self, ids: impl IntoIterator<Item = PostId>) {
        self.inner.lock().deferred.extend(ids);
    }

    /// Drain the deferred ids that are not captured yet
    pub fn take_deferred(&self) -> Vec<PostId> {
        let mut state = self.inner.lock();
        let deferred = std::mem::take(&mut state.deferred);
        deferred
            .into_iter()
            .filter(|id| !state.captured.contains(id))
            .collect()
    }

    /// Forget a post that left the view (deleted or removed)
    pub fn release(&self, id: &str) -> bool {
        let mut state = self.inner.lock();
        if state.captured.remove(id) {
            state.order.retain(|captured| captured != id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().captured.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captured ids in capture order
    pub fn snapshot(&self) -> Vec<PostId> {
        self.inner.lock().order.clone()
    }
}

/// Subscribe failures only cost live updates for that post
async fn subscribe(client: &dyn StreamClient, id: &str) {
    if let Err(source) = client.capture(id).await {
        let err = TimelineError::Capture {
            post_id: id.to_string(),
            source,
        };
        debug!("{}", err);
    } else {
        trace!(post_id = %id, "captured");
    }
}
