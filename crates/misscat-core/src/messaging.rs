//! Direct-message history: one summary per conversation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::MisskeyApi;
use crate::cache::SessionCache;
use crate::config::CoreConfig;
use crate::error::TimelineError;
use crate::models::{ConversationSummary, FeedEvent, MessageHistoryEntry};

pub struct MessageHistoryLoader {
    api: Arc<dyn MisskeyApi>,
    cache: SessionCache,
    capacity: usize,
}

impl MessageHistoryLoader {
    pub fn new(config: &CoreConfig, api: Arc<dyn MisskeyApi>, cache: SessionCache) -> Self {
        Self {
            api,
            cache,
            capacity: config.feed_capacity,
        }
    }

    /// Fetch the conversation list and emit a summary per entry, in server order.
    pub fn load_history(&self) -> mpsc::Receiver<FeedEvent<ConversationSummary>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let api = self.api.clone();
        let cache = self.cache.clone();

        tokio::spawn(async move {
            let entries = match api.messaging_history().await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("message history fetch failed: {}", e);
                    let _ = tx.send(FeedEvent::Failed(TimelineError::Transport(e))).await;
                    return;
                }
            };

            // Without our own id every entry falls back to its recipient
            let me = match cache.resolve_me(api.as_ref()).await {
                Ok(me) => Some(me),
                Err(e) => {
                    debug!("could not resolve account for message history: {}", e);
                    None
                }
            };
            let my_id = me.as_ref().map(|u| u.id.as_str());

            for mut entry in entries {
                fill_participants(&cache, &mut entry);
                remember_participants(&cache, &entry);
                let summary = ConversationSummary::from_entry(&entry, my_id);
                if tx.send(FeedEvent::Item(summary)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(FeedEvent::Completed).await;
        });

        rx
    }
}

/// Entries sometimes carry only the participant ids; fill the user objects
/// from earlier sightings.
fn fill_participants(cache: &SessionCache, entry: &mut MessageHistoryEntry) {
    if entry.user.is_none() {
        entry.user = entry.user_id.as_deref().and_then(|id| cache.user(id));
    }
    if entry.recipient.is_none() {
        entry.recipient = entry.recipient_id.as_deref().and_then(|id| cache.user(id));
    }
}

fn remember_participants(cache: &SessionCache, entry: &MessageHistoryEntry) {
    for user in [entry.user.as_ref(), entry.recipient.as_ref()].into_iter().flatten() {
        cache.remember_user(user);
    }
}
