//! Per-session cache of account and user info.
//!
//! Constructed once per logged-in session and handed to whoever needs it
//! (mutation self-checks, message history). Nothing here is process-wide.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::MisskeyApi;
use crate::constants::USER_CACHE_CAPACITY;
use crate::error::{ApiError, TimelineError};
use crate::models::{UserId, UserSummary};
use crate::mutation::SelfCheck;

struct CacheState {
    /// Swapped for a fresh cell on `clear_me`; concurrent lookups share one fetch
    me: Arc<OnceCell<UserSummary>>,
    users: LruCache<UserId, UserSummary>,
}

#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<Mutex<CacheState>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::with_capacity(USER_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(CacheState {
                me: Arc::new(OnceCell::new()),
                users: LruCache::new(capacity),
            })),
        }
    }

    /// The logged-in account, if already known
    pub fn me(&self) -> Option<UserSummary> {
        self.inner.lock().me.get().cloned()
    }

    pub fn set_me(&self, user: UserSummary) {
        let mut state = self.inner.lock();
        state.users.put(user.id.clone(), user.clone());
        state.me = Arc::new(OnceCell::new_with(Some(user)));
    }

    /// Forget the account, e.g. after switching credentials
    pub fn clear_me(&self) {
        self.inner.lock().me = Arc::new(OnceCell::new());
    }

    pub fn remember_user(&self, user: &UserSummary) {
        self.inner.lock().users.put(user.id.clone(), user.clone());
    }

    pub fn user(&self, id: &str) -> Option<UserSummary> {
        self.inner.lock().users.get(id).cloned()
    }

    /// The logged-in account, fetching it on first use. Callers racing the
    /// first lookup wait on the same request.
    pub async fn resolve_me(&self, api: &dyn MisskeyApi) -> Result<UserSummary, ApiError> {
        let cell = self.inner.lock().me.clone();
        let me = cell
            .get_or_try_init(|| async {
                let me = api.current_user().await?;
                debug!(user_id = %me.id, "resolved logged-in account");
                Ok::<_, ApiError>(me)
            })
            .await?
            .clone();
        self.remember_user(&me);
        Ok(me)
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SessionCache")
            .field("me", &state.me.get().map(|u| &u.id))
            .field("users", &state.users.len())
            .finish()
    }
}

/// Answers "is this actor me?" from the session cache, asking the server
/// for the current account the first time.
pub struct AccountSelfCheck {
    api: Arc<dyn MisskeyApi>,
    cache: SessionCache,
}

impl AccountSelfCheck {
    pub fn new(api: Arc<dyn MisskeyApi>, cache: SessionCache) -> Self {
        Self { api, cache }
    }
}

#[async_trait]
impl SelfCheck for AccountSelfCheck {
    async fn is_me(&self, actor_id: &str) -> Result<bool, TimelineError> {
        let me = self
            .cache
            .resolve_me(self.api.as_ref())
            .await
            .map_err(|e| TimelineError::SelfCheck {
                actor_id: actor_id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(me.id == actor_id)
    }
}
