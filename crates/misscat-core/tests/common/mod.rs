//! In-memory stand-ins for the REST and stream collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use misscat_core::api::{Credential, MisskeyApi};
use misscat_core::error::{ApiError, StreamError, TimelineError};
use misscat_core::models::{
    FeedEvent, GlobalFeed, MessageHistoryEntry, PageRequest, Post, UserSummary,
};
use misscat_core::mutation::SelfCheck;
use misscat_core::streaming::{RawFrame, StreamClient};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub fn post_json(id: &str) -> Value {
    json!({
        "id": id,
        "createdAt": "2020-04-16T10:00:00Z",
        "text": format!("post {}", id),
        "user": { "id": "author", "username": "author" }
    })
}

pub fn post(value: Value) -> Post {
    serde_json::from_value(value).expect("valid post json")
}

pub fn plain(id: &str) -> Post {
    post(post_json(id))
}

pub fn promoted(id: &str) -> Post {
    let mut value = post_json(id);
    value["_prId_"] = json!(format!("pr-{}", id));
    post(value)
}

pub fn user(id: &str) -> UserSummary {
    serde_json::from_value(json!({ "id": id, "username": id })).expect("valid user json")
}

/// Drain a feed until its terminal event or until the sender goes away
pub async fn collect<T>(rx: &mut mpsc::Receiver<FeedEvent<T>>) -> Vec<FeedEvent<T>> {
    let mut events = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("feed stalled")
    {
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

/// Scripted REST collaborator: hands out queued pages and records calls
#[derive(Default)]
pub struct FakeApi {
    pages: Mutex<VecDeque<Vec<Post>>>,
    fail_next: Mutex<bool>,
    me: Mutex<Option<UserSummary>>,
    me_delay: Mutex<Option<Duration>>,
    history: Mutex<Vec<MessageHistoryEntry>>,
    pub calls: Mutex<Vec<String>>,
    pub limits: Mutex<Vec<u32>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, posts: Vec<Post>) {
        self.pages.lock().push_back(posts);
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock() = true;
    }

    pub fn set_me(&self, me: UserSummary) {
        *self.me.lock() = Some(me);
    }

    /// Make `current_user` take this long before answering
    pub fn slow_me(&self, delay: Duration) {
        *self.me_delay.lock() = Some(delay);
    }

    pub fn set_history(&self, entries: Vec<MessageHistoryEntry>) {
        *self.history.lock() = entries;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().push(call);
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(ApiError::Status {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(())
    }

    fn page(&self, call: String, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.limits.lock().push(page.limit);
        self.record(call)?;
        Ok(self.pages.lock().pop_front().unwrap_or_default())
    }
}

#[async_trait]
impl MisskeyApi for FakeApi {
    async fn timeline(&self, feed: GlobalFeed, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.page(format!("timeline:{:?}:{:?}", feed, page.until_id), page)
    }

    async fn user_notes(
        &self,
        user_id: &str,
        include_replies: bool,
        with_files: bool,
        page: &PageRequest,
    ) -> Result<Vec<Post>, ApiError> {
        self.page(format!("user:{}:{}:{}", user_id, include_replies, with_files), page)
    }

    async fn list_notes(&self, list_id: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.page(format!("list:{}", list_id), page)
    }

    async fn search_notes(&self, query: &str, page: &PageRequest) -> Result<Vec<Post>, ApiError> {
        self.page(format!("search:{}", query), page)
    }

    async fn report_abuse(&self, user_id: &str, comment: &str) -> Result<(), ApiError> {
        self.record(format!("report:{}:{}", user_id, comment))
    }

    async fn block(&self, user_id: &str) -> Result<(), ApiError> {
        self.record(format!("block:{}", user_id))
    }

    async fn delete_note(&self, post_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete:{}", post_id))
    }

    async fn vote(&self, post_id: &str, choice: u32) -> Result<(), ApiError> {
        self.record(format!("vote:{}:{}", post_id, choice))
    }

    async fn renote(&self, post_id: &str) -> Result<(), ApiError> {
        self.record(format!("renote:{}", post_id))
    }

    async fn current_user(&self) -> Result<UserSummary, ApiError> {
        self.record("i".to_string())?;
        let delay = *self.me_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.me.lock().clone().ok_or(ApiError::Status {
            status: 401,
            message: "credential required".to_string(),
        })
    }

    async fn messaging_history(&self) -> Result<Vec<MessageHistoryEntry>, ApiError> {
        self.record("history".to_string())?;
        Ok(self.history.lock().clone())
    }
}

/// Stream collaborator whose frames are pushed by the test
#[derive(Default)]
pub struct FakeStream {
    sender: Mutex<Option<mpsc::Sender<RawFrame>>>,
    connects: Mutex<usize>,
    refuse: Mutex<bool>,
    pub captures: Mutex<Vec<String>>,
}

impl FakeStream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refuse_connections(&self) {
        *self.refuse.lock() = true;
    }

    pub fn captures(&self) -> Vec<String> {
        self.captures.lock().clone()
    }

    pub fn clear_captures(&self) {
        self.captures.lock().clear();
    }

    /// Wait until `count` connections have been made and return the sender
    /// feeding the latest one.
    pub async fn connection(&self, count: usize) -> mpsc::Sender<RawFrame> {
        for _ in 0..500 {
            if *self.connects.lock() >= count {
                if let Some(sender) = self.sender.lock().clone() {
                    return sender;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("stream connection {} never happened", count);
    }

    /// Close the current connection from the server side
    pub fn drop_connection(&self) {
        self.sender.lock().take();
    }
}

#[async_trait]
impl StreamClient for FakeStream {
    async fn connect(
        &self,
        _credential: &Credential,
        _channels: &[&str],
    ) -> Result<mpsc::Receiver<RawFrame>, StreamError> {
        if *self.refuse.lock() {
            return Err(StreamError::CannotConnect("connection refused".to_string()));
        }
        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock() = Some(tx);
        *self.connects.lock() += 1;
        Ok(rx)
    }

    async fn capture(&self, post_id: &str) -> Result<(), StreamError> {
        self.captures.lock().push(post_id.to_string());
        Ok(())
    }
}

/// Self-check with a fixed account id, optional per-actor latency and
/// actors whose lookup fails
#[derive(Default)]
pub struct FakeSelfCheck {
    pub me: String,
    pub delays: HashMap<String, Duration>,
    pub failing: HashSet<String>,
}

impl FakeSelfCheck {
    pub fn me(id: &str) -> Self {
        Self {
            me: id.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SelfCheck for FakeSelfCheck {
    async fn is_me(&self, actor_id: &str) -> Result<bool, TimelineError> {
        if let Some(delay) = self.delays.get(actor_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(actor_id) {
            return Err(TimelineError::SelfCheck {
                actor_id: actor_id.to_string(),
                reason: "lookup failed".to_string(),
            });
        }
        Ok(actor_id == self.me)
    }
}

pub fn note_frame(value: Value) -> RawFrame {
    RawFrame::new("homeTimeline", "note", value)
}

pub fn reacted_frame(post_id: &str, actor_id: &str, reaction: &str) -> RawFrame {
    RawFrame::new(
        "main",
        "CapturedNoteUpdated",
        json!({
            "id": post_id,
            "type": "reacted",
            "body": { "reaction": reaction, "userId": actor_id }
        }),
    )
}

pub fn unreacted_frame(post_id: &str, actor_id: &str, reaction: &str) -> RawFrame {
    RawFrame::new(
        "main",
        "CapturedNoteUpdated",
        json!({
            "id": post_id,
            "type": "unreacted",
            "body": { "reaction": reaction, "userId": actor_id }
        }),
    )
}

pub fn deleted_frame(post_id: &str) -> RawFrame {
    RawFrame::new(
        "main",
        "CapturedNoteUpdated",
        json!({ "id": post_id, "type": "deleted", "body": { "deletedAt": "2020-04-16T11:00:00Z" } }),
    )
}
