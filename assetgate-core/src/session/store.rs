//! Identity and session types, and the auth service trait

use super::events::AuthEvent;
use crate::error::AuthResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Identity metadata - flexible key-value store (display name, avatar, ...)
pub type IdentityMetadata = HashMap<String, serde_json::Value>;

/// Authenticated principal as known to the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identity ID (key of the role relation)
    pub id: String,

    /// Email address, if the service exposes one
    pub email: Option<String>,

    /// Display metadata
    #[serde(default)]
    pub metadata: IdentityMetadata,
}

impl Identity {
    /// Create an identity with no email or metadata
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), email: None, metadata: HashMap::new() }
    }

    /// Set email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Add a metadata value
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Display name from metadata, falling back to the email
    pub fn display_name(&self) -> Option<&str> {
        self.metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .or(self.email.as_deref())
    }
}

/// Proof of authentication for an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Access token issued by the auth service
    pub access_token: String,

    /// Refresh token, when the service issues one
    pub refresh_token: Option<String>,

    /// Identity this session belongs to
    pub identity: Identity,

    /// Issue time
    pub issued_at: DateTime<Utc>,

    /// Expiration time, enforced by the auth service
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session valid for `ttl`
    pub fn new(access_token: impl Into<String>, identity: Identity, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            identity,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// Set refresh token
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Check if the session is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Callback receiving auth state changes
///
/// Handlers run inside the auth service's notification path and must not call
/// back into the service.
pub type AuthEventHandler = Arc<dyn Fn(AuthEvent) + Send + Sync>;

/// Handle returned by [`AuthService::on_auth_state_change`]
///
/// Delivery stops on [`Subscription::unsubscribe`] or when the handle is dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when released
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Stop delivering events
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

/// External authentication service
///
/// Implement this trait to connect the auth store to a hosted auth backend.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Current session, if any
    async fn current_session(&self) -> AuthResult<Option<Session>>;

    /// Register a handler for auth state changes
    fn on_auth_state_change(&self, handler: AuthEventHandler) -> Subscription;

    /// End the current session
    ///
    /// The service reports the outcome through a `SignedOut` event.
    async fn sign_out(&self) -> AuthResult<()>;
}

#[async_trait::async_trait]
impl<S: AuthService + ?Sized> AuthService for Arc<S> {
    async fn current_session(&self) -> AuthResult<Option<Session>> {
        (**self).current_session().await
    }

    fn on_auth_state_change(&self, handler: AuthEventHandler) -> Subscription {
        (**self).on_auth_state_change(handler)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        (**self).sign_out().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_session_creation() {
        let identity = Identity::new("user-1").with_email("ada@example.com");
        let session = Session::new("token", identity.clone(), Duration::hours(1));

        assert_eq!(session.identity, identity);
        assert!(session.refresh_token.is_none());
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_expiration() {
        let session = Session::new("token", Identity::new("user-1"), Duration::seconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_display_name() {
        let identity = Identity::new("user-1").with_email("ada@example.com");
        assert_eq!(identity.display_name(), Some("ada@example.com"));

        let identity = identity.with_metadata("full_name", serde_json::json!("Ada Lovelace"));
        assert_eq!(identity.display_name(), Some("Ada Lovelace"));

        assert_eq!(Identity::new("user-2").display_name(), None);
    }

    #[test]
    fn test_subscription_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));

        let counter = released.clone();
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let counter = released.clone();
        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
