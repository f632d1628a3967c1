pub mod display;
pub mod message;
pub mod mutation;
pub mod post;
pub mod timeline;

pub use display::{DisplayItem, FeedEvent, PostCell, ReactionCount};
pub use message::{ConversationSummary, MessageHistoryEntry};
pub use mutation::{MutationDelta, MutationEvent, ReactionSign};
pub use post::{EmojiRef, FileRef, Poll, PollChoice, Post, PostId, UserId, UserSummary};
pub use timeline::{GlobalFeed, LoadMode, PageRequest, TimelineKind, TimelineQuery};
