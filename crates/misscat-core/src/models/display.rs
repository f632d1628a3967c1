use chrono::{DateTime, Utc};

use super::post::{EmojiRef, FileRef, Poll, Post, PostId, UserSummary};
use crate::error::TimelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount {
    pub key: String,
    pub count: u32,
}

/// Display-ready rendering of one post body.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCell {
    pub post_id: PostId,
    pub author: UserSummary,
    pub text: String,
    pub content_warning: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sorted by count (descending), then key
    pub reactions: Vec<ReactionCount>,
    pub my_reaction: Option<String>,
    pub poll: Option<Poll>,
    pub files: Vec<FileRef>,
    pub emojis: Vec<EmojiRef>,
    pub reply_to_id: Option<PostId>,
    /// Rendering of the quoted post for quote-boosts
    pub quoted: Option<Box<PostCell>>,
    /// Shown above a reply as its context, not as a feed entry of its own
    pub is_reply_target: bool,
}

impl PostCell {
    /// Render a post body. Returns None when the post has no author, which
    /// happens with partially federated data.
    pub fn render(post: &Post, with_quote: bool) -> Option<Self> {
        let author = post.user.clone()?;

        let mut reactions: Vec<ReactionCount> = post
            .reactions
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(key, &count)| ReactionCount {
                key: key.clone(),
                count,
            })
            .collect();
        reactions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        let quoted = if with_quote {
            post.renote
                .as_deref()
                .and_then(|quoted| Self::render(quoted, false))
                .map(Box::new)
        } else {
            None
        };

        Some(Self {
            post_id: post.id.clone(),
            author,
            text: post.text.clone().unwrap_or_default(),
            content_warning: post.cw.clone(),
            created_at: post.created_at,
            reactions,
            my_reaction: post.my_reaction.clone(),
            poll: post.poll.clone(),
            files: post.files.clone(),
            emojis: post.emojis.clone(),
            reply_to_id: post.reply_id.clone(),
            quoted,
            is_reply_target: false,
        })
    }
}

/// A UI-ready unit emitted to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Post(PostCell),
    /// "X boosted" line shown above a boosted post
    BoostHeader {
        booster: UserSummary,
        boosted_post_id: PostId,
    },
    /// "Promoted" line shown above an advertised post
    PromotionHeader { post_id: PostId },
}

impl DisplayItem {
    /// Id of the post this item belongs to
    pub fn post_id(&self) -> &str {
        match self {
            DisplayItem::Post(cell) => &cell.post_id,
            DisplayItem::BoostHeader {
                boosted_post_id, ..
            } => boosted_post_id,
            DisplayItem::PromotionHeader { post_id } => post_id,
        }
    }

    pub fn is_reply_target(&self) -> bool {
        matches!(self, DisplayItem::Post(cell) if cell.is_reply_target)
    }

    pub fn as_post(&self) -> Option<&PostCell> {
        match self {
            DisplayItem::Post(cell) => Some(cell),
            _ => None,
        }
    }
}

/// Signals delivered on a producer channel.
///
/// `Completed` and `Failed` are terminal; `EmptyPage` precedes `Completed`
/// when a forward page came back with no posts.
#[derive(Debug)]
pub enum FeedEvent<T> {
    Item(T),
    EmptyPage,
    Completed,
    Failed(TimelineError),
}

impl<T> FeedEvent<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedEvent::Completed | FeedEvent::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_sorts_reactions_and_drops_zero_counts() {
        let post: Post = serde_json::from_value(json!({
            "id": "n1",
            "createdAt": "2020-04-16T10:00:00Z",
            "text": "hi",
            "user": { "id": "u1", "username": "alice" },
            "reactions": { "b": 2, "a": 2, "c": 5, "z": 0 }
        }))
        .unwrap();

        let cell = PostCell::render(&post, false).unwrap();
        let keys: Vec<_> = cell.reactions.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_render_without_author_fails() {
        let post: Post = serde_json::from_value(json!({
            "id": "n1",
            "createdAt": "2020-04-16T10:00:00Z",
            "text": "orphan"
        }))
        .unwrap();
        assert!(PostCell::render(&post, false).is_none());
    }

    #[test]
    fn test_render_embeds_quote_only_when_asked() {
        let post: Post = serde_json::from_value(json!({
            "id": "q1",
            "createdAt": "2020-04-16T10:00:00Z",
            "text": "look at this",
            "user": { "id": "u1", "username": "alice" },
            "renoteId": "n1",
            "renote": {
                "id": "n1",
                "createdAt": "2020-04-16T09:00:00Z",
                "text": "original",
                "user": { "id": "u2", "username": "bob" }
            }
        }))
        .unwrap();

        let with = PostCell::render(&post, true).unwrap();
        assert_eq!(with.quoted.as_ref().unwrap().post_id, "n1");

        let without = PostCell::render(&post, false).unwrap();
        assert!(without.quoted.is_none());
    }
}
