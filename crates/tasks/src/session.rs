use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use ts_rs::TS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("User id cannot be empty")]
    EmptyUserId,
}

/// Opaque identity handed out by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SessionError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current signed-in identity plus a change feed for sign-in/sign-out.
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<UserId>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    pub fn sign_in(&self, user: UserId) {
        tracing::info!(user_id = %user, "Signed in");
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            tracing::info!(user_id = %previous, "Signed out");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}
