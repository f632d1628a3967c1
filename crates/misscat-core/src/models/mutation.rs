use serde::Deserialize;

use super::post::{EmojiRef, PostId, UserId};

/// A change to a captured post, decoded from a `noteUpdated` frame.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationEvent {
    ReactionAdded {
        post_id: PostId,
        reaction_key: String,
        actor_id: UserId,
        emoji: Option<EmojiRef>,
    },
    ReactionRemoved {
        post_id: PostId,
        reaction_key: String,
        actor_id: UserId,
    },
    PollVoted {
        post_id: PostId,
    },
    PostDeleted {
        post_id: PostId,
    },
}

impl MutationEvent {
    pub fn post_id(&self) -> &str {
        match self {
            MutationEvent::ReactionAdded { post_id, .. }
            | MutationEvent::ReactionRemoved { post_id, .. }
            | MutationEvent::PollVoted { post_id }
            | MutationEvent::PostDeleted { post_id } => post_id,
        }
    }

    /// Decode the payload of a captured-post update.
    ///
    /// Wire shape: `{"id": <post>, "type": "reacted"|"unreacted"|"pollVoted"|"deleted", "body": {...}}`
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, String> {
        let wire: UpdatedWire =
            serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
        let body = wire.body.unwrap_or_default();
        let post_id = wire.id;

        match wire.kind.as_str() {
            "reacted" => Ok(MutationEvent::ReactionAdded {
                reaction_key: body.reaction.ok_or("reacted update without reaction")?,
                actor_id: body.user_id.ok_or("reacted update without userId")?,
                emoji: body.emoji,
                post_id,
            }),
            "unreacted" => Ok(MutationEvent::ReactionRemoved {
                reaction_key: body.reaction.ok_or("unreacted update without reaction")?,
                actor_id: body.user_id.ok_or("unreacted update without userId")?,
                post_id,
            }),
            "pollVoted" => Ok(MutationEvent::PollVoted { post_id }),
            "deleted" => Ok(MutationEvent::PostDeleted { post_id }),
            other => Err(format!("unknown update type: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdatedWire {
    id: PostId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    body: Option<UpdatedBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedBody {
    #[serde(default)]
    reaction: Option<String>,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    emoji: Option<EmojiRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionSign {
    Plus,
    Minus,
}

/// Incremental reaction adjustment for a post already on screen.
///
/// Deltas may arrive out of order relative to their frames; apply each one
/// independently by post id and sign.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationDelta {
    pub target_post_id: PostId,
    pub reaction_key: Option<String>,
    pub is_own_reaction: bool,
    pub sign: ReactionSign,
    pub external_emoji: Option<EmojiRef>,
}
