use serde::{Deserialize, Serialize};

use super::post::{PostId, UserId};
use crate::constants::channels;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineKind {
    Home,
    Local,
    /// Home + local ("hybrid" on the server)
    Social,
    Global,
    UserTimeline,
    ListTimeline,
    Search,
}

/// The four instance-wide feeds served by the plain timeline endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlobalFeed {
    Home,
    Local,
    Social,
    Global,
}

impl TimelineKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Local => "local",
            Self::Social => "social",
            Self::Global => "global",
            Self::UserTimeline => "user",
            Self::ListTimeline => "list",
            Self::Search => "search",
        }
    }

    pub fn global_feed(&self) -> Option<GlobalFeed> {
        match self {
            Self::Home => Some(GlobalFeed::Home),
            Self::Local => Some(GlobalFeed::Local),
            Self::Social => Some(GlobalFeed::Social),
            Self::Global => Some(GlobalFeed::Global),
            _ => None,
        }
    }

    /// Streaming channel carrying live posts for this kind, if any
    pub fn stream_channel(&self) -> Option<&'static str> {
        match self {
            Self::Home => Some(channels::HOME_TIMELINE),
            Self::Local => Some(channels::LOCAL_TIMELINE),
            Self::Social => Some(channels::HYBRID_TIMELINE),
            Self::Global => Some(channels::GLOBAL_TIMELINE),
            _ => None,
        }
    }

    /// Whether posts loaded for this kind can ever be captured live
    pub fn needs_streaming(&self) -> bool {
        self.stream_channel().is_some()
    }
}

impl std::str::FromStr for TimelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "local" => Ok(Self::Local),
            "social" | "hybrid" => Ok(Self::Social),
            "global" => Ok(Self::Global),
            "user" => Ok(Self::UserTimeline),
            "list" => Ok(Self::ListTimeline),
            "search" => Ok(Self::Search),
            other => Err(format!("unknown timeline kind: {}", other)),
        }
    }
}

/// Pagination window sent with every fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    /// Only posts strictly older than this id. None = newest page.
    pub until_id: Option<PostId>,
}

/// How a fetched page is filtered and ordered before emission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// First page of a timeline (no cursor)
    Initial,
    /// Forward pagination into older content
    Paginate,
    /// Refresh that stops at the first post already on screen
    Reload { last_seen_id: PostId },
}

/// Immutable request descriptor for one page of history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineQuery {
    pub kind: TimelineKind,
    /// User id for UserTimeline
    pub user_id: Option<UserId>,
    /// List id for ListTimeline
    pub list_id: Option<String>,
    /// Search text for Search
    pub search: Option<String>,
    /// UserTimeline only: include the user's replies
    pub include_replies: bool,
    /// UserTimeline only: only posts with attachments
    pub only_files: bool,
    pub until_id: Option<PostId>,
    /// None = the loader's configured page size
    pub limit: Option<u32>,
    pub reload: bool,
    pub last_seen_id: Option<PostId>,
}

impl TimelineQuery {
    pub fn new(kind: TimelineKind) -> Self {
        Self {
            kind,
            user_id: None,
            list_id: None,
            search: None,
            include_replies: true,
            only_files: false,
            until_id: None,
            limit: None,
            reload: false,
            last_seen_id: None,
        }
    }

    pub fn user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::new(TimelineKind::UserTimeline)
        }
    }

    pub fn list(list_id: impl Into<String>) -> Self {
        Self {
            list_id: Some(list_id.into()),
            ..Self::new(TimelineKind::ListTimeline)
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::new(TimelineKind::Search)
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn until(mut self, until_id: impl Into<PostId>) -> Self {
        self.until_id = Some(until_id.into());
        self
    }

    pub fn reloading_from(mut self, last_seen_id: impl Into<PostId>) -> Self {
        self.reload = true;
        self.last_seen_id = Some(last_seen_id.into());
        self
    }

    pub fn with_replies(mut self, include_replies: bool) -> Self {
        self.include_replies = include_replies;
        self
    }

    pub fn only_files(mut self, only_files: bool) -> Self {
        self.only_files = only_files;
        self
    }

    pub fn page(&self, default_limit: u32) -> PageRequest {
        PageRequest {
            limit: self.limit.unwrap_or(default_limit),
            until_id: self.until_id.clone(),
        }
    }

    /// Reload needs both the flag and a convergence id; otherwise the
    /// cursor decides between first page and pagination.
    pub fn mode(&self) -> LoadMode {
        match (&self.last_seen_id, self.reload) {
            (Some(last_seen_id), true) => LoadMode::Reload {
                last_seen_id: last_seen_id.clone(),
            },
            _ if self.until_id.is_none() => LoadMode::Initial,
            _ => LoadMode::Paginate,
        }
    }
}
