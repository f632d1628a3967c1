use tracing::debug;

use super::classify::PostKind;
use crate::models::{DisplayItem, Post, PostCell};

/// Expand one post into its display items, parent first.
///
/// With `reverse` the list is flipped so that callers inserting items one
/// by one at the top of a feed (live frames, reload batches) end up with
/// the same on-screen order as a forward load. Returns an empty list when
/// the post cannot be rendered; malformed federated data is expected and
/// only logged.
pub fn flatten(post: &Post, kind: PostKind, reverse: bool) -> Vec<DisplayItem> {
    let mut items = match kind {
        PostKind::Boost => flatten_boost(post),
        PostKind::Promoted => flatten_promoted(post),
        PostKind::Plain | PostKind::QuoteBoost => flatten_body(post, kind == PostKind::QuoteBoost),
    };

    if items.is_empty() {
        debug!(post_id = %post.id, ?kind, "post dropped: missing fields for rendering");
    }

    if reverse {
        items.reverse();
    }
    items
}

/// Id to capture for live updates once the post is on screen. A boost shows
/// the boosted post's body, so that is the one worth watching.
pub fn capture_id(post: &Post, kind: PostKind) -> &str {
    match (kind, post.renote_id.as_deref()) {
        (PostKind::Boost, Some(target_id)) => target_id,
        _ => &post.id,
    }
}

fn flatten_boost(post: &Post) -> Vec<DisplayItem> {
    let (Some(booster), Some(target), Some(target_id)) =
        (post.user.as_ref(), post.renote.as_deref(), post.renote_id.as_ref())
    else {
        return Vec::new();
    };

    let Some(body) = PostCell::render(target, PostKind::of(target) == PostKind::QuoteBoost) else {
        return Vec::new();
    };

    vec![
        DisplayItem::BoostHeader {
            booster: booster.clone(),
            boosted_post_id: target_id.clone(),
        },
        DisplayItem::Post(body),
    ]
}

fn flatten_promoted(post: &Post) -> Vec<DisplayItem> {
    let Some(body) = PostCell::render(post, post.is_quote()) else {
        return Vec::new();
    };

    vec![
        DisplayItem::PromotionHeader {
            post_id: post.id.clone(),
        },
        DisplayItem::Post(body),
    ]
}

fn flatten_body(post: &Post, with_quote: bool) -> Vec<DisplayItem> {
    let Some(body) = PostCell::render(post, with_quote) else {
        return Vec::new();
    };

    let mut items = Vec::with_capacity(2);
    if let Some(reply) = post.reply.as_deref() {
        let reply_quote = PostKind::of(reply) == PostKind::QuoteBoost;
        if let Some(mut target) = PostCell::render(reply, reply_quote) {
            target.is_reply_target = true;
            items.push(DisplayItem::Post(target));
        }
    }
    items.push(DisplayItem::Post(body));
    items
}
