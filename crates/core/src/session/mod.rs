//! Session provider abstraction.
//!
//! Stores never authenticate on their own: they ask the session provider
//! whether a user is present and for a short-lived bearer token per request.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::Result;
use crate::runtime::lock;

/// The signed-in user as seen by the sync layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }
}

/// Source of the current session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<SessionUser>;

    /// A bearer token for the current user, or `None` when signed out.
    async fn id_token(&self) -> Result<Option<String>>;

    /// Watches sign-in and sign-out transitions.
    fn subscribe(&self) -> watch::Receiver<Option<SessionUser>>;

    fn is_active(&self) -> bool {
        self.current_user().is_some()
    }
}

/// In-process session holding a user and a pre-issued token.
///
/// Used by the headless agent (token supplied through configuration) and
/// by tests.
pub struct LocalSession {
    user: watch::Sender<Option<SessionUser>>,
    token: Mutex<Option<String>>,
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSession {
    pub fn new() -> Self {
        let (user, _receiver) = watch::channel(None);
        Self {
            user,
            token: Mutex::new(None),
        }
    }

    pub fn signed_in(user: SessionUser, token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(user, token);
        session
    }

    pub fn sign_in(&self, user: SessionUser, token: impl Into<String>) {
        *lock(&self.token) = Some(token.into());
        self.user.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        *lock(&self.token) = None;
        self.user.send_replace(None);
    }

    /// Replaces the bearer token without changing the user.
    pub fn rotate_token(&self, token: impl Into<String>) {
        *lock(&self.token) = Some(token.into());
    }
}

#[async_trait]
impl SessionProvider for LocalSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.borrow().clone()
    }

    async fn id_token(&self) -> Result<Option<String>> {
        if self.user.borrow().is_none() {
            return Ok(None);
        }
        Ok(lock(&self.token).clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.user.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = LocalSession::new();
        assert!(!session.is_active());
        assert_eq!(session.id_token().await.unwrap(), None);

        session.sign_in(SessionUser::new("u1"), "token-1");
        assert_eq!(session.current_user().unwrap().uid, "u1");
        assert_eq!(session.id_token().await.unwrap().as_deref(), Some("token-1"));

        session.rotate_token("token-2");
        assert_eq!(session.id_token().await.unwrap().as_deref(), Some("token-2"));

        session.sign_out();
        assert!(!session.is_active());
        assert_eq!(session.id_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let session = LocalSession::new();
        let mut rx = session.subscribe();

        session.sign_in(SessionUser::new("u1"), "t");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.uid.as_str()), Some("u1"));

        session.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
