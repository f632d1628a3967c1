use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PostId = String;
pub type UserId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    /// Remote host, None for users on the local instance
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Display name, falling back to the username when the name is unset or blank
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// Fully qualified handle (`@user` or `@user@host`)
    pub fn acct(&self) -> String {
        match &self.host {
            Some(host) => format!("@{}@{}", self.username, host),
            None => format!("@{}", self.username),
        }
    }
}

/// Custom emoji referenced from post text or a reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollChoice {
    pub text: String,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub is_voted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub choices: Vec<PollChoice>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Poll {
    pub fn total_votes(&self) -> u32 {
        self.choices.iter().map(|c| c.votes).sum()
    }
}

/// A single feed entry as returned by the REST API and the streaming channel.
///
/// Referenced posts (`reply`, `renote`) are read-only snapshots embedded by
/// value, never live nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    /// Content warning shown in place of the text until expanded
    #[serde(default)]
    pub cw: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub reply_id: Option<PostId>,
    #[serde(default)]
    pub reply: Option<Box<Post>>,
    /// Boost target id ("renote" on the wire)
    #[serde(default)]
    pub renote_id: Option<PostId>,
    #[serde(default)]
    pub renote: Option<Box<Post>>,
    /// Present only on promoted (advertised) posts
    #[serde(default, rename = "_prId_", skip_serializing_if = "Option::is_none")]
    pub promotion_id: Option<String>,
    /// Present only on highlighted (featured) posts injected into the feed
    #[serde(default, rename = "_featuredId_", skip_serializing_if = "Option::is_none")]
    pub featured_id: Option<String>,
    #[serde(default)]
    pub poll: Option<Poll>,
    /// Reaction key -> count
    #[serde(default)]
    pub reactions: BTreeMap<String, u32>,
    #[serde(default)]
    pub my_reaction: Option<String>,
    #[serde(default)]
    pub emojis: Vec<EmojiRef>,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl Post {
    pub fn is_promoted(&self) -> bool {
        self.promotion_id.is_some()
    }

    pub fn is_highlighted(&self) -> bool {
        self.featured_id.is_some()
    }

    /// True when the post carries its own non-empty body text
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// True when the post embeds another post and adds text of its own
    pub fn is_quote(&self) -> bool {
        self.renote.is_some() && self.has_text()
    }

    /// Whether this post matches an id already on screen, either directly
    /// or through the post it boosts.
    pub fn refers_to(&self, id: &str) -> bool {
        self.id == id || self.renote_id.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Post {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_post_from_wire_json() {
        let post = parse(json!({
            "id": "9abc",
            "createdAt": "2020-04-16T10:00:00.000Z",
            "text": "hello",
            "userId": "u1",
            "user": { "id": "u1", "name": "Alice", "username": "alice", "host": null },
            "reactions": { "👍": 3, ":blobcat:": 1 },
            "_prId_": "pr-1"
        }));

        assert_eq!(post.id, "9abc");
        assert!(post.is_promoted());
        assert!(!post.is_highlighted());
        assert_eq!(post.reactions.get("👍"), Some(&3));
        assert_eq!(post.user.as_ref().unwrap().display_name(), "Alice");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = UserSummary {
            id: "u1".to_string(),
            name: Some("   ".to_string()),
            username: "alice".to_string(),
            host: Some("example.social".to_string()),
            avatar_url: None,
        };
        assert_eq!(user.display_name(), "alice");
        assert_eq!(user.acct(), "@alice@example.social");
    }

    #[test]
    fn test_refers_to_matches_boost_target() {
        let post = parse(json!({
            "id": "b1",
            "createdAt": "2020-04-16T10:00:00Z",
            "renoteId": "n1"
        }));
        assert!(post.refers_to("b1"));
        assert!(post.refers_to("n1"));
        assert!(!post.refers_to("n2"));
    }

    #[test]
    fn test_empty_text_is_not_text() {
        let post = parse(json!({
            "id": "p1",
            "createdAt": "2020-04-16T10:00:00Z",
            "text": ""
        }));
        assert!(!post.has_text());
        assert!(!post.is_quote());
    }

    #[test]
    fn test_poll_total_votes() {
        let poll: Poll = serde_json::from_value(json!({
            "choices": [
                { "text": "yes", "votes": 3 },
                { "text": "no", "votes": 2, "isVoted": true },
                { "text": "maybe" }
            ]
        }))
        .unwrap();
        assert_eq!(poll.total_votes(), 5);
    }
}
