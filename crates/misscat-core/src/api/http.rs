use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use super::{Credential, MisskeyApi};
use crate::config::CoreConfig;
use crate::constants::{endpoints, MESSAGING_HISTORY_LIMIT};
use crate::error::ApiError;
use crate::models::{GlobalFeed, MessageHistoryEntry, PageRequest, Post, UserSummary};

/// `MisskeyApi` over HTTP: every call is a JSON POST to
/// `{instance}/api/<endpoint>` with the token in the `i` field.
pub struct HttpApi {
    base_url: String,
    credential: Credential,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(config: &CoreConfig, credential: Credential) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url: config.instance_url.trim_end_matches('/').to_string(),
            credential,
            client,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    fn with_token(&self, body: Value) -> Value {
        let mut map = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("i".to_string(), Value::String(self.credential.api_key.clone()));
        Value::Object(map)
    }

    async fn send(&self, endpoint: &str, body: Value) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .post(self.endpoint_url(endpoint))
            .json(&self.with_token(body))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }
        Ok(response)
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T, ApiError> {
        let bytes = self.send(endpoint, body).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_unit(&self, endpoint: &str, body: Value) -> Result<(), ApiError> {
        self.send(endpoint, body).await?;
        Ok(())
    }
}

/// `{limit, untilId?}` plus any endpoint-specific fields
fn page_body(page: &PageRequest, extra: Value) -> Value {
    let mut body = match extra {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("limit".to_string(), json!(page.limit));
    if let Some(until_id) = &page.until_id {
        body.insert("untilId".to_string(), json!(until_id));
    }
    Value::Object(body)
}

fn history_body() -> Value {
    page_body(
        &PageRequest {
            limit: MESSAGING_HISTORY_LIMIT,
            until_id: None,
        },
        json!({}),
    )
}

fn feed_endpoint(feed: GlobalFeed) -> &'static str {
    match feed {
        GlobalFeed::Home => endpoints::HOME_TIMELINE,
        GlobalFeed::Local => endpoints::LOCAL_TIMELINE,
        GlobalFeed::Social => endpoints::HYBRID_TIMELINE,
        GlobalFeed::Global => endpoints::GLOBAL_TIMELINE,
    }
}

#[async_trait]
impl MisskeyApi for HttpApi {
    async fn timeline(&self, feed: GlobalFeed, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.post(feed_endpoint(feed), page_body(page, json!({}))).await
    }

    async fn user_notes(
        &self,
        user_id: &str,
        include_replies: bool,
        with_files: bool,
        page: &PageRequest,
    ) -> Result<Vec<Post>, ApiError> {
        let extra = json!({
            "userId": user_id,
            "includeReplies": include_replies,
            "withFiles": with_files,
        });
        self.post(endpoints::USER_NOTES, page_body(page, extra)).await
    }

    async fn list_notes(&self, list_id: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.post(endpoints::USER_LIST_TIMELINE, page_body(page, json!({ "listId": list_id })))
            .await
    }

    async fn search_notes(&self, query: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.post(endpoints::SEARCH_NOTES, page_body(page, json!({ "query": query })))
            .await
    }

    async fn report_abuse(&self, user_id: &str, comment: &str) -> Result<(), ApiError> {
        self.post_unit(
            endpoints::REPORT_ABUSE,
            json!({ "userId": user_id, "comment": comment }),
        )
        .await
    }

    async fn block(&self, user_id: &str) -> Result<(), ApiError> {
        self.post_unit(endpoints::BLOCK, json!({ "userId": user_id })).await
    }

    async fn delete_note(&self, post_id: &str) -> Result<(), ApiError> {
        self.post_unit(endpoints::DELETE_NOTE, json!({ "noteId": post_id })).await
    }

    async fn vote(&self, post_id: &str, choice: u32) -> Result<(), ApiError> {
        self.post_unit(endpoints::POLL_VOTE, json!({ "noteId": post_id, "choice": choice }))
            .await
    }

    async fn renote(&self, post_id: &str) -> Result<(), ApiError> {
        self.post_unit(endpoints::CREATE_NOTE, json!({ "renoteId": post_id })).await
    }

    async fn current_user(&self) -> Result<UserSummary, ApiError> {
        self.post(endpoints::I, json!({})).await
    }

    async fn messaging_history(&self) -> Result<Vec<MessageHistoryEntry>, ApiError> {
        self.post(endpoints::MESSAGING_HISTORY, history_body()).await
    }
}
