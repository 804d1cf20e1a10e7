//! Client-side session persistence
//!
//! The only durable client state is the signed-in [`UserIdentity`], kept as
//! plain JSON under the `userData` key. There is no server-side session and
//! no integrity protection on the stored value.

mod store;

use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::identity::UserIdentity;

pub use store::*;

/// Key the identity is stored under
pub const SESSION_KEY: &str = "userData";

/// The session object handed to views.
///
/// Cloning is cheap and every clone shares the same jar.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionContext {
    /// Create a session context over `store` with a fixed time-to-live
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-memory session, mostly useful for tests
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), ttl)
    }

    /// How long a saved identity stays valid
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Persist `identity`, replacing whatever was stored.
    pub async fn save(&self, identity: &UserIdentity) -> Result<()> {
        let value = serde_json::to_string(identity)?;
        let expires_at = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| Utc::now().timestamp().checked_add(secs))
            .unwrap_or(i64::MAX);
        debug!("saving session for {}", identity);
        self.store
            .write(SESSION_KEY, StoredCookie::new(value, expires_at))
            .await
    }

    /// Load the stored identity.
    ///
    /// Expired or malformed values are removed and reported as absent.
    pub async fn load(&self) -> Result<Option<UserIdentity>> {
        let cookie = match self.store.read(SESSION_KEY).await? {
            Some(cookie) => cookie,
            None => return Ok(None),
        };

        if cookie.is_expired() {
            debug!("stored session expired");
            self.store.remove(SESSION_KEY).await?;
            return Ok(None);
        }

        match serde_json::from_str::<UserIdentity>(&cookie.value) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                warn!("error parsing stored session, clearing it: {}", e);
                self.store.remove(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Remove the stored identity
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_KEY).await
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").field("ttl", &self.ttl).finish()
    }
}
