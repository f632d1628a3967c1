use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::post::{UserId, UserSummary};

/// Latest message of one direct-message conversation, as listed by the
/// messaging history endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub recipient_id: Option<UserId>,
    #[serde(default)]
    pub recipient: Option<UserSummary>,
    #[serde(default)]
    pub is_read: bool,
}

impl MessageHistoryEntry {
    /// The other participant: the first of recipient/sender that isn't us,
    /// falling back to the recipient.
    pub fn counterpart(&self, my_id: Option<&str>) -> Option<&UserSummary> {
        [self.recipient.as_ref(), self.user.as_ref()]
            .into_iter()
            .flatten()
            .find(|u| Some(u.id.as_str()) != my_id)
            .or(self.recipient.as_ref())
    }
}

/// Display summary of one conversation in the message list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub user_id: Option<UserId>,
    pub avatar_url: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub display_name: String,
    pub latest_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl ConversationSummary {
    pub fn from_entry(entry: &MessageHistoryEntry, my_id: Option<&str>) -> Self {
        let other = entry.counterpart(my_id);
        Self {
            user_id: other.map(|u| u.id.clone()),
            avatar_url: other.and_then(|u| u.avatar_url.clone()),
            name: other.and_then(|u| u.name.clone()),
            username: other.map(|u| u.username.clone()),
            display_name: other
                .map(|u| u.display_name().to_string())
                .unwrap_or_default(),
            latest_message: entry.text.clone(),
            created_at: entry.created_at,
            is_read: entry.is_read,
        }
    }
}
