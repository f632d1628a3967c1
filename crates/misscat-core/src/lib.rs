//! Timeline synchronization and capture engine for Misskey-compatible
//! instances.
//!
//! History pages come in through [`api::MisskeyApi`], live frames through
//! [`streaming::StreamClient`]; [`TimelineCoordinator`] merges both into
//! ordered display items and keeps per-post captures alive across
//! reconnects.

pub mod api;
pub mod cache;
pub mod capture;
pub mod config;
pub mod constants;
pub mod error;
pub mod messaging;
pub mod models;
pub mod mutation;
pub mod streaming;
pub mod timeline;

pub use api::{Credential, HttpApi, MisskeyApi};
pub use cache::{AccountSelfCheck, SessionCache};
pub use capture::CaptureRegistry;
pub use config::{ConfigError, CoreConfig};
pub use error::{ApiError, StreamError, TimelineError};
pub use messaging::MessageHistoryLoader;
pub use mutation::{Mediated, MutationMediator, SelfCheck};
pub use streaming::{RawFrame, StreamClient, StreamState};
pub use timeline::{PostKind, TimelineCoordinator};
