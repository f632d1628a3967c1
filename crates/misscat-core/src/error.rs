use crate::models::{PostId, UserId};

/// Failures of the REST collaborator
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures of the stream collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("Cannot connect to stream: {0}")]
    CannotConnect(String),

    #[error("No stream connection")]
    NoConnection,

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Stream protocol error: {0}")]
    Protocol(String),
}

impl StreamError {
    /// Connection-level errors end the stream; everything else only costs a frame.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, StreamError::CannotConnect(_) | StreamError::NoConnection)
    }
}

/// Everything the timeline engine can fail with.
///
/// Only `Transport` and `Connection` ever reach the consumer; the other
/// variants are logged where they occur and the work item is dropped.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Transport error: {0}")]
    Transport(#[from] ApiError),

    #[error("Stream connection error: {0}")]
    Connection(StreamError),

    #[error("Dropped frame: {0}")]
    Frame(String),

    #[error("Capture failed for {post_id}: {source}")]
    Capture {
        post_id: PostId,
        #[source]
        source: StreamError,
    },

    #[error("Could not tell whether {actor_id} is the local user: {reason}")]
    SelfCheck { actor_id: UserId, reason: String },
}

impl TimelineError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimelineError::Transport(_) | TimelineError::Connection(_))
    }
}
