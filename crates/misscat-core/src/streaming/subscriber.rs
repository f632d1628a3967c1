use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::types::{FrameKind, RawFrame, StreamClient};
use crate::api::Credential;
use crate::capture::CaptureRegistry;
use crate::error::{StreamError, TimelineError};
use crate::models::{DisplayItem, FeedEvent, MutationEvent, Post};
use crate::mutation::MutationMediator;
use crate::timeline::{capture_id, flatten, PostKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
    /// Connected again after an earlier connection; captures still need
    /// to be replayed on the first inbound frame.
    ReconnectPending,
}

#[derive(Debug)]
struct SubscriberState {
    state: StreamState,
    has_connected: bool,
    /// Bumped on every connect attempt
    generation: u64,
}

/// Inbound frames of one physical connection
#[derive(Debug)]
pub struct StreamConnection {
    pub frames: mpsc::Receiver<RawFrame>,
    generation: u64,
}

/// Owns the live connection of one timeline session and routes its frames.
#[derive(Clone)]
pub struct StreamSubscriber {
    client: Arc<dyn StreamClient>,
    registry: CaptureRegistry,
    mediator: MutationMediator,
    state: Arc<Mutex<SubscriberState>>,
}

impl StreamSubscriber {
    pub fn new(
        client: Arc<dyn StreamClient>,
        registry: CaptureRegistry,
        mediator: MutationMediator,
    ) -> Self {
        Self {
            client,
            registry,
            mediator,
            state: Arc::new(Mutex::new(SubscriberState {
                state: StreamState::Disconnected,
                has_connected: false,
                generation: 0,
            })),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state.lock().state
    }

    /// Only the task owning the latest connection may mark it gone
    fn mark_disconnected(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.state = StreamState::Disconnected;
        }
    }

    /// Open the push channel. Any successful connect after the first one
    /// is treated as a physical reconnection.
    pub async fn connect(
        &self,
        credential: &Credential,
        channels: &[&str],
    ) -> Result<StreamConnection, TimelineError> {
        let generation = {
            let mut state = self.state.lock();
            state.state = StreamState::Connecting;
            state.generation += 1;
            state.generation
        };

        match self.client.connect(credential, channels).await {
            Ok(frames) => {
                let mut state = self.state.lock();
                state.state = if state.has_connected {
                    StreamState::ReconnectPending
                } else {
                    StreamState::Connected
                };
                state.has_connected = true;
                info!(?channels, state = ?state.state, "stream connected");
                Ok(StreamConnection { frames, generation })
            }
            Err(e) => {
                self.mark_disconnected(generation);
                warn!("stream connect failed: {}", e);
                Err(TimelineError::Connection(e))
            }
        }
    }

    /// Clears the reconnection flag, returning whether it was set
    fn take_reconnect(&self) -> bool {
        let mut state = self.state.lock();
        if state.state == StreamState::ReconnectPending {
            state.state = StreamState::Connected;
            true
        } else {
            false
        }
    }

    /// Process one inbound frame and return the display items it produced.
    ///
    /// Only connection-level errors come back as `Err`; every other problem
    /// is logged and the frame is dropped.
    pub async fn handle_frame(&self, frame: RawFrame) -> Result<Vec<DisplayItem>, TimelineError> {
        if self.take_reconnect() {
            self.registry.replay_on_reconnect(self.client.as_ref()).await;
        }

        let deferred = self.registry.take_deferred();
        if !deferred.is_empty() {
            self.registry
                .capture_after_initial_load(self.client.as_ref(), &deferred)
                .await;
        }

        let kind = frame.kind();
        let RawFrame {
            payload,
            channel,
            declared_type,
            error,
        } = frame;

        if let Some(error) = error {
            if error.is_connection_level() {
                return Err(TimelineError::Connection(error));
            }
            debug!("{}", TimelineError::Frame(error.to_string()));
            return Ok(Vec::new());
        }

        let (Some(kind), Some(_)) = (kind, channel) else {
            trace!(?declared_type, "frame ignored");
            return Ok(Vec::new());
        };
        let Some(payload) = payload else {
            debug!("{}", TimelineError::Frame(format!("{:?} frame without payload", kind)));
            return Ok(Vec::new());
        };

        match kind {
            FrameKind::NewPost => {
                let post: Post = match serde_json::from_value(payload) {
                    Ok(post) => post,
                    Err(e) => {
                        debug!("{}", TimelineError::Frame(e.to_string()));
                        return Ok(Vec::new());
                    }
                };

                let post_kind = PostKind::of(&post);
                let items = flatten(&post, post_kind, true);
                if !items.is_empty() {
                    self.registry
                        .capture_single(self.client.as_ref(), capture_id(&post, post_kind))
                        .await;
                }
                Ok(items)
            }
            FrameKind::CapturedPostUpdated => {
                match MutationEvent::from_payload(&payload) {
                    Ok(event) => {
                        trace!(post_id = event.post_id(), "captured post updated");
                        if let MutationEvent::PostDeleted { post_id } = &event {
                            self.registry.release(post_id);
                        }
                        self.mediator.dispatch(event);
                    }
                    Err(e) => debug!("{}", TimelineError::Frame(e)),
                }
                Ok(Vec::new())
            }
        }
    }

    /// Pump frames into `tx` until the connection ends, the consumer goes
    /// away or `cancel_rx` fires.
    pub async fn run(
        self,
        connection: StreamConnection,
        tx: mpsc::Sender<FeedEvent<DisplayItem>>,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let StreamConnection {
            mut frames,
            generation,
        } = connection;

        loop {
            tokio::select! {
                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        debug!("stream task cancelled");
                        break;
                    }
                }
                frame = frames.recv() => {
                    let Some(frame) = frame else {
                        let _ = tx
                            .send(FeedEvent::Failed(TimelineError::Connection(StreamError::NoConnection)))
                            .await;
                        break;
                    };

                    match self.handle_frame(frame).await {
                        Ok(items) => {
                            for item in items {
                                if tx.send(FeedEvent::Item(item)).await.is_err() {
                                    debug!("stream consumer dropped");
                                    self.mark_disconnected(generation);
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            warn!("stream terminated: {}", e);
                            let _ = tx.send(FeedEvent::Failed(e)).await;
                            break;
                        }
                    }
                }
            }
        }
        self.mark_disconnected(generation);
    }
}
