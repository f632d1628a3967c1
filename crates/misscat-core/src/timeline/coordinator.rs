use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::loader::HistoryLoader;
use crate::api::{Credential, MisskeyApi};
use crate::capture::CaptureRegistry;
use crate::config::CoreConfig;
use crate::error::ApiError;
use crate::models::{
    DisplayItem, FeedEvent, MutationDelta, PostId, TimelineKind, TimelineQuery, UserId,
};
use crate::mutation::{MutationMediator, SelfCheck};
use crate::streaming::{StreamClient, StreamState, StreamSubscriber};

/// One timeline session: history loads, the live stream, and the two
/// side channels for removed posts and reaction deltas.
///
/// Must be used from within a tokio runtime; every producer runs on its
/// own spawned task and hands results back over channels.
pub struct TimelineCoordinator {
    config: CoreConfig,
    api: Arc<dyn MisskeyApi>,
    loader: HistoryLoader,
    registry: CaptureRegistry,
    subscriber: StreamSubscriber,
    cancel_tx: Option<watch::Sender<bool>>,
    deltas_rx: Option<mpsc::UnboundedReceiver<MutationDelta>>,
    removed_rx: Option<mpsc::UnboundedReceiver<PostId>>,
}

impl TimelineCoordinator {
    pub fn new(
        config: CoreConfig,
        api: Arc<dyn MisskeyApi>,
        stream: Arc<dyn StreamClient>,
        self_check: Arc<dyn SelfCheck>,
    ) -> Self {
        let (deltas_tx, deltas_rx) = mpsc::unbounded_channel();
        let (removed_tx, removed_rx) = mpsc::unbounded_channel();

        let registry = CaptureRegistry::new();
        let mediator = MutationMediator::new(self_check, deltas_tx, removed_tx);
        let subscriber = StreamSubscriber::new(stream, registry.clone(), mediator);
        let loader = HistoryLoader::new(api.clone())
            .with_registry(registry.clone())
            .with_page_size(config.page_size);

        Self {
            config,
            loader,
            api,
            registry,
            subscriber,
            cancel_tx: None,
            deltas_rx: Some(deltas_rx),
            removed_rx: Some(removed_rx),
        }
    }

    /// Load one page of history. The ids shown are queued for capture on
    /// the next stream frame.
    pub fn load_notes(&self, query: TimelineQuery) -> mpsc::Receiver<FeedEvent<DisplayItem>> {
        let (tx, rx) = mpsc::channel(self.config.feed_capacity);
        let loader = self.loader.clone();

        tokio::spawn(async move {
            let shown = loader.run(&query, &tx).await;
            debug!(kind = query.kind.label(), shown = shown.len(), "history load finished");
        });

        rx
    }

    /// Open the live feed for `kind`, replacing any previous stream task.
    ///
    /// Kinds without a streaming channel get a receiver that is closed right
    /// away. Otherwise the feed ends only with a connection-level error.
    pub fn connect_stream(
        &mut self,
        credential: &Credential,
        kind: TimelineKind,
    ) -> mpsc::Receiver<FeedEvent<DisplayItem>> {
        self.disconnect_stream();

        let (tx, rx) = mpsc::channel(self.config.feed_capacity);
        let Some(channel) = kind.stream_channel() else {
            debug!(kind = kind.label(), "no live channel for timeline kind");
            return rx;
        };

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.cancel_tx = Some(cancel_tx);

        let subscriber = self.subscriber.clone();
        let credential = credential.clone();
        tokio::spawn(async move {
            match subscriber.connect(&credential, &[channel]).await {
                Ok(connection) => subscriber.run(connection, tx, cancel_rx).await,
                Err(e) => {
                    let _ = tx.send(FeedEvent::Failed(e)).await;
                }
            }
        });

        rx
    }

    /// Stop delivering live frames. Requests already in flight still run.
    pub fn disconnect_stream(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(true);
            info!("stream disconnect requested");
        }
    }

    pub fn stream_state(&self) -> StreamState {
        self.subscriber.state()
    }

    pub fn registry(&self) -> &CaptureRegistry {
        &self.registry
    }

    /// Reaction deltas for captured posts. Can only be taken once.
    pub fn take_deltas_rx(&mut self) -> Option<mpsc::UnboundedReceiver<MutationDelta>> {
        self.deltas_rx.take()
    }

    /// Ids of captured posts that were deleted. Can only be taken once.
    pub fn take_removed_rx(&mut self) -> Option<mpsc::UnboundedReceiver<PostId>> {
        self.removed_rx.take()
    }

    pub fn report(&self, user_id: &str, comment: &str) -> JoinHandle<()> {
        let api = self.api.clone();
        let user_id: UserId = user_id.to_string();
        let comment = comment.to_string();
        spawn_action("report", async move { api.report_abuse(&user_id, &comment).await })
    }

    pub fn block(&self, user_id: &str) -> JoinHandle<()> {
        let api = self.api.clone();
        let user_id: UserId = user_id.to_string();
        spawn_action("block", async move { api.block(&user_id).await })
    }

    pub fn delete_post(&self, post_id: &str) -> JoinHandle<()> {
        let api = self.api.clone();
        let post_id: PostId = post_id.to_string();
        spawn_action("delete", async move { api.delete_note(&post_id).await })
    }

    pub fn vote(&self, post_id: &str, choice: u32) -> JoinHandle<()> {
        let api = self.api.clone();
        let post_id: PostId = post_id.to_string();
        spawn_action("vote", async move { api.vote(&post_id, choice).await })
    }

    pub fn boost(&self, post_id: &str) -> JoinHandle<()> {
        let api = self.api.clone();
        let post_id: PostId = post_id.to_string();
        spawn_action("boost", async move { api.renote(&post_id).await })
    }
}

impl Drop for TimelineCoordinator {
    fn drop(&mut self) {
        self.disconnect_stream();
    }
}

/// Run a REST action in the background and log how it went
fn spawn_action<F>(action: &'static str, request: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    tokio::spawn(async move {
        match request.await {
            Ok(()) => info!(action, "action completed"),
            Err(e) => warn!(action, "action failed: {}", e),
        }
    })
}
