use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::TimelineError;
use crate::models::{MutationDelta, MutationEvent, PostId, ReactionSign};

/// Resolves whether an actor is the logged-in account.
#[async_trait]
pub trait SelfCheck: Send + Sync {
    async fn is_me(&self, actor_id: &str) -> Result<bool, TimelineError>;
}

/// What a mutation event turns into for the consumer
#[derive(Debug, Clone, PartialEq)]
pub enum Mediated {
    Delta(MutationDelta),
    Removed(PostId),
}

/// Turns decoded mutation events into deltas and removal signals.
///
/// Reactions go through an async self-check, one task per event, so deltas
/// can reach the consumer in a different order than their frames arrived.
#[derive(Clone)]
pub struct MutationMediator {
    self_check: Arc<dyn SelfCheck>,
    deltas_tx: mpsc::UnboundedSender<MutationDelta>,
    removed_tx: mpsc::UnboundedSender<PostId>,
}

impl MutationMediator {
    pub fn new(
        self_check: Arc<dyn SelfCheck>,
        deltas_tx: mpsc::UnboundedSender<MutationDelta>,
        removed_tx: mpsc::UnboundedSender<PostId>,
    ) -> Self {
        Self {
            self_check,
            deltas_tx,
            removed_tx,
        }
    }

    /// Route one event without waiting on the self-check.
    pub fn dispatch(&self, event: MutationEvent) {
        match event {
            MutationEvent::PostDeleted { post_id } => self.deliver(Mediated::Removed(post_id)),
            MutationEvent::PollVoted { post_id } => {
                trace!(post_id = %post_id, "poll vote ignored");
            }
            event => {
                let mediator = self.clone();
                tokio::spawn(async move {
                    if let Some(outcome) = mediator.mediate(event).await {
                        mediator.deliver(outcome);
                    }
                });
            }
        }
    }

    /// Resolve one event to its outcome, if any.
    pub async fn mediate(&self, event: MutationEvent) -> Option<Mediated> {
        let (post_id, reaction_key, actor_id, sign, emoji) = match event {
            MutationEvent::ReactionAdded {
                post_id,
                reaction_key,
                actor_id,
                emoji,
            } => (post_id, reaction_key, actor_id, ReactionSign::Plus, emoji),
            MutationEvent::ReactionRemoved {
                post_id,
                reaction_key,
                actor_id,
            } => (post_id, reaction_key, actor_id, ReactionSign::Minus, None),
            MutationEvent::PollVoted { .. } => return None,
            MutationEvent::PostDeleted { post_id } => return Some(Mediated::Removed(post_id)),
        };

        match self.self_check.is_me(&actor_id).await {
            // Already applied optimistically by the UI
            Ok(true) => {
                trace!(post_id = %post_id, "own reaction not echoed");
                None
            }
            Ok(false) => Some(Mediated::Delta(MutationDelta {
                target_post_id: post_id,
                reaction_key: Some(reaction_key),
                is_own_reaction: false,
                sign,
                external_emoji: emoji,
            })),
            Err(e) => {
                debug!(post_id = %post_id, "reaction dropped: {}", e);
                None
            }
        }
    }

    fn deliver(&self, outcome: Mediated) {
        let sent = match outcome {
            Mediated::Delta(delta) => self.deltas_tx.send(delta).is_ok(),
            Mediated::Removed(post_id) => self.removed_tx.send(post_id).is_ok(),
        };
        if !sent {
            trace!("mutation consumer gone");
        }
    }
}
