pub mod subscriber;
pub mod types;

pub use subscriber::{StreamConnection, StreamState, StreamSubscriber};
pub use types::{FrameKind, RawFrame, StreamClient};
