//! Application-wide constants
//!
//! Centralized location for endpoint paths, stream frame names and default
//! values used across modules.

use std::time::Duration;

/// Default instance when none is configured
pub const DEFAULT_INSTANCE: &str = "https://misskey.io";

/// Posts requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Conversations requested from the messaging history endpoint
pub const MESSAGING_HISTORY_LIMIT: u32 = 100;

/// Capacity of each feed channel handed to the consumer
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Users kept in the per-session user cache
pub const USER_CACHE_CAPACITY: usize = 512;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// REST endpoints, relative to `{instance}/api/`
pub mod endpoints {
    pub const HOME_TIMELINE: &str = "notes/timeline";
    pub const LOCAL_TIMELINE: &str = "notes/local-timeline";
    pub const HYBRID_TIMELINE: &str = "notes/hybrid-timeline";
    pub const GLOBAL_TIMELINE: &str = "notes/global-timeline";
    pub const USER_NOTES: &str = "users/notes";
    pub const USER_LIST_TIMELINE: &str = "notes/user-list-timeline";
    pub const SEARCH_NOTES: &str = "notes/search";
    pub const REPORT_ABUSE: &str = "users/report-abuse";
    pub const BLOCK: &str = "blocking/create";
    pub const DELETE_NOTE: &str = "notes/delete";
    pub const POLL_VOTE: &str = "notes/polls/vote";
    pub const CREATE_NOTE: &str = "notes/create";
    pub const I: &str = "i";
    pub const MESSAGING_HISTORY: &str = "messaging/history";
}

// Streaming channel names
pub mod channels {
    pub const HOME_TIMELINE: &str = "homeTimeline";
    pub const LOCAL_TIMELINE: &str = "localTimeline";
    pub const HYBRID_TIMELINE: &str = "hybridTimeline";
    pub const GLOBAL_TIMELINE: &str = "globalTimeline";
}

// Declared types of inbound stream frames the engine handles
pub mod frame_types {
    pub const NOTE: &str = "note";
    pub const CAPTURED_NOTE_UPDATED: &str = "CapturedNoteUpdated";
}
