//! Timeline engine: classification, flattening, history loading and the
//! coordinator that ties them to the live stream.

pub mod classify;
pub mod coordinator;
pub mod flatten;
pub mod loader;

pub use classify::PostKind;
pub use coordinator::TimelineCoordinator;
pub use flatten::{capture_id, flatten};
pub use loader::{select_posts, HistoryLoader};
