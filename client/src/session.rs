//! The single active login session.

use std::sync::Arc;

use tracing::warn;

use crate::models::{Session, UserProfile};
use crate::store::KeyValueStore;
use crate::Result;

const TOKEN_KEY: &str = "auth_token";
const USER_KEY: &str = "current_user";

/// Token and profile persisted through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store token and profile together. If the profile cannot be written
    /// the token is removed again, so a token never exists without its user.
    pub fn save(&self, session: &Session) -> Result<()> {
        let profile = serde_json::to_string(&session.profile)?;
        self.store.set(TOKEN_KEY, &session.token)?;
        if let Err(e) = self.store.set(USER_KEY, &profile) {
            if let Err(cleanup) = self.store.remove(TOKEN_KEY) {
                warn!(error = %cleanup, "could not roll back session token");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Bearer token, if a usable one is stored.
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "session token unreadable");
                None
            }
        }
    }

    /// Stored profile; absent or corrupt data reads as logged out.
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = match self.store.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "session profile unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "discarding corrupt session profile");
                None
            }
        }
    }

    pub fn current(&self) -> Option<Session> {
        Some(Session {
            token: self.token()?,
            profile: self.current_user()?,
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }
}
