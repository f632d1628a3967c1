//! REST collaborator contract.
//!
//! The engine only talks to the server through [`MisskeyApi`]; [`HttpApi`]
//! is the production implementation, tests substitute in-memory fakes.

pub mod http;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{GlobalFeed, MessageHistoryEntry, PageRequest, Post, UserSummary};

pub use http::HttpApi;

/// API token of the logged-in account
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential").field("api_key", &"<redacted>").finish()
    }
}

#[async_trait]
pub trait MisskeyApi: Send + Sync {
    async fn timeline(&self, feed: GlobalFeed, page: &PageRequest) -> Result<Vec<Post>, ApiError>;

    async fn user_notes(
        &self,
        user_id: &str,
        include_replies: bool,
        with_files: bool,
        page: &PageRequest,
    ) -> Result<Vec<Post>, ApiError>;

    async fn list_notes(&self, list_id: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError>;

    async fn search_notes(&self, query: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError>;

    async fn report_abuse(&self, user_id: &str, comment: &str) -> Result<(), ApiError>;

    async fn block(&self, user_id: &str) -> Result<(), ApiError>;

    async fn delete_note(&self, post_id: &str) -> Result<(), ApiError>;

    async fn vote(&self, post_id: &str, choice: u32) -> Result<(), ApiError>;

    /// Boost (renote) a post without adding text
    async fn renote(&self, post_id: &str) -> Result<(), ApiError>;

    /// The account the credential belongs to
    async fn current_user(&self) -> Result<UserSummary, ApiError>;

    async fn messaging_history(&self) -> Result<Vec<MessageHistoryEntry>, ApiError>;
}
