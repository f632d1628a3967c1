use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::Credential;
use crate::constants::frame_types;
use crate::error::StreamError;

/// One inbound message on the push channel, as delivered by the transport
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    pub payload: Option<Value>,
    /// Channel the frame arrived on, None for connection-wide frames
    pub channel: Option<String>,
    pub declared_type: Option<String>,
    pub error: Option<StreamError>,
}

impl RawFrame {
    pub fn new(channel: &str, declared_type: &str, payload: Value) -> Self {
        Self {
            payload: Some(payload),
            channel: Some(channel.to_string()),
            declared_type: Some(declared_type.to_string()),
            error: None,
        }
    }

    pub fn failed(error: StreamError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> Option<FrameKind> {
        self.declared_type.as_deref().and_then(FrameKind::classify)
    }
}

/// The two frame types the engine handles; anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    NewPost,
    CapturedPostUpdated,
}

impl FrameKind {
    pub fn classify(declared_type: &str) -> Option<Self> {
        match declared_type {
            frame_types::NOTE => Some(FrameKind::NewPost),
            frame_types::CAPTURED_NOTE_UPDATED => Some(FrameKind::CapturedPostUpdated),
            _ => None,
        }
    }
}

/// Stream collaborator contract.
///
/// `connect` yields the inbound frames of one physical connection; the
/// receiver closing means the connection is gone. Repeated `capture` calls
/// for the same post are idempotent on the server side.
#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn connect(
        &self,
        credential: &Credential,
        channels: &[&str],
    ) -> Result<mpsc::Receiver<RawFrame>, StreamError>;

    async fn capture(&self, post_id: &str) -> Result<(), StreamError>;
}
