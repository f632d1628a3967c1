use crate::models::Post;

/// Structural variant of a post, decided once per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Plain,
    /// Repost of another post with no text of its own
    Boost,
    /// Repost that adds its own text
    QuoteBoost,
    /// Advertised post
    Promoted,
}

impl PostKind {
    /// Classify a post. Promotion wins over everything else; a boost needs
    /// the target id, the author and the resolved target.
    pub fn of(post: &Post) -> Self {
        if post.is_promoted() {
            return PostKind::Promoted;
        }

        let is_boost = post.renote_id.is_some() && post.user.is_some() && post.renote.is_some();
        match (is_boost, post.has_text()) {
            (true, true) => PostKind::QuoteBoost,
            (true, false) => PostKind::Boost,
            (false, _) => PostKind::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn post(mut fields: Value) -> Post {
        let base = json!({ "id": "n1", "createdAt": "2020-04-16T10:00:00Z" });
        for (k, v) in base.as_object().unwrap() {
            fields.as_object_mut().unwrap().entry(k.clone()).or_insert(v.clone());
        }
        serde_json::from_value(fields).unwrap()
    }

    fn target() -> Value {
        json!({
            "id": "t1",
            "createdAt": "2020-04-16T09:00:00Z",
            "text": "boosted",
            "user": { "id": "u2", "username": "bob" }
        })
    }

    #[test]
    fn test_plain_post() {
        let p = post(json!({ "text": "hello", "user": { "id": "u1", "username": "alice" } }));
        assert_eq!(PostKind::of(&p), PostKind::Plain);
    }

    #[test]
    fn test_boost_without_text() {
        let p = post(json!({
            "user": { "id": "u1", "username": "alice" },
            "renoteId": "t1",
            "renote": target()
        }));
        assert_eq!(PostKind::of(&p), PostKind::Boost);
    }

    #[test]
    fn test_boost_with_empty_text_is_plain_boost() {
        let p = post(json!({
            "text": "",
            "user": { "id": "u1", "username": "alice" },
            "renoteId": "t1",
            "renote": target()
        }));
        assert_eq!(PostKind::of(&p), PostKind::Boost);
    }

    #[test]
    fn test_quote_boost() {
        let p = post(json!({
            "text": "so true",
            "user": { "id": "u1", "username": "alice" },
            "renoteId": "t1",
            "renote": target()
        }));
        assert_eq!(PostKind::of(&p), PostKind::QuoteBoost);
    }

    #[test]
    fn test_unresolved_boost_target_is_plain() {
        let p = post(json!({
            "user": { "id": "u1", "username": "alice" },
            "renoteId": "t1"
        }));
        assert_eq!(PostKind::of(&p), PostKind::Plain);
    }

    #[test]
    fn test_boost_without_author_is_plain() {
        let p = post(json!({ "renoteId": "t1", "renote": target() }));
        assert_eq!(PostKind::of(&p), PostKind::Plain);
    }

    #[test]
    fn test_promotion_wins_over_everything() {
        let variants = [
            json!({ "_prId_": "pr" }),
            json!({ "_prId_": "pr", "text": "ad", "user": { "id": "u1", "username": "a" } }),
            json!({
                "_prId_": "pr",
                "user": { "id": "u1", "username": "a" },
                "renoteId": "t1",
                "renote": target()
            }),
            json!({ "_prId_": "pr", "_featuredId_": "f", "replyId": "r1" }),
        ];
        for fields in variants {
            let p = post(fields);
            assert_eq!(PostKind::of(&p), PostKind::Promoted);
            // Pure: asking twice gives the same answer
            assert_eq!(PostKind::of(&p), PostKind::of(&p));
        }
    }
}
