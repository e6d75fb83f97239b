//! In-memory auth service and role directory
//!
//! These implementations keep everything in process memory. They back the test
//! suite and the CLI simulator, and are handy for local development against no
//! hosted backend at all.

use super::events::{AuthEvent, AuthEventKind};
use super::store::{AuthEventHandler, AuthService, Identity, Session, Subscription};
use crate::error::{AuthError, AuthResult};
use crate::rbac::{Role, RoleDirectory};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

struct AuthState {
    session: Option<Session>,
    listeners: BTreeMap<u64, AuthEventHandler>,
    next_listener: u64,
    unavailable: Option<String>,
    session_ttl: chrono::Duration,
}

/// In-memory auth service
///
/// Events are delivered to handlers while the service's internal lock is held,
/// like hosted auth clients do. A handler that calls back into the service
/// deadlocks.
///
/// # Example
///
/// ```
/// use assetgate_core::session::{Identity, MemoryAuthService};
///
/// let auth = MemoryAuthService::new();
/// auth.sign_in(Identity::new("user-1"));
/// ```
#[derive(Clone)]
pub struct MemoryAuthService {
    inner: Arc<Mutex<AuthState>>,
}

impl MemoryAuthService {
    /// Create a service with no session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuthState {
                session: None,
                listeners: BTreeMap::new(),
                next_listener: 0,
                unavailable: None,
                session_ttl: chrono::Duration::hours(1),
            })),
        }
    }

    /// Create a service that already holds a session for `identity`
    pub fn with_session(identity: Identity) -> Self {
        let service = Self::new();
        {
            let mut state = service.lock();
            let session = Self::issue(identity, state.session_ttl);
            state.session = Some(session);
        }
        service
    }

    /// Make `current_session` fail (`Some`) or succeed again (`None`)
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_string);
    }

    /// Sign in and notify listeners
    pub fn sign_in(&self, identity: Identity) -> Session {
        self.start_session(AuthEventKind::SignedIn, identity)
    }

    /// Sign up (which also signs in) and notify listeners
    pub fn sign_up(&self, identity: Identity) -> Session {
        self.start_session(AuthEventKind::SignedUp, identity)
    }

    /// Issue a new access token for the current identity
    pub fn refresh_token(&self) -> Option<Session> {
        let mut state = self.lock();
        let identity = state.session.as_ref()?.identity.clone();
        let session = Self::issue(identity, state.session_ttl);
        state.session = Some(session.clone());
        Self::deliver(&state, AuthEvent::new(AuthEventKind::TokenRefreshed, Some(session.clone())));
        Some(session)
    }

    /// Replace the current identity's profile
    pub fn update_user(&self, identity: Identity) -> Option<Session> {
        let mut state = self.lock();
        let session = state.session.as_mut()?;
        session.identity = identity;
        let session = session.clone();
        Self::deliver(&state, AuthEvent::new(AuthEventKind::UserUpdated, Some(session.clone())));
        Some(session)
    }

    /// Deliver an arbitrary event without touching the stored session
    pub fn emit(&self, event: AuthEvent) {
        let state = self.lock();
        Self::deliver(&state, event);
    }

    /// Number of registered handlers
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Session currently held, without going through the async trait
    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    fn start_session(&self, kind: AuthEventKind, identity: Identity) -> Session {
        let mut state = self.lock();
        let session = Self::issue(identity, state.session_ttl);
        state.session = Some(session.clone());
        log::debug!("Memory auth: {} for {}", kind, session.identity.id);
        Self::deliver(&state, AuthEvent::new(kind, Some(session.clone())));
        session
    }

    fn issue(identity: Identity, ttl: chrono::Duration) -> Session {
        Session::new(Uuid::new_v4().to_string(), identity, ttl)
            .with_refresh_token(Uuid::new_v4().to_string())
    }

    // Called with the lock held
    fn deliver(state: &AuthState, event: AuthEvent) {
        for handler in state.listeners.values() {
            handler(event.clone());
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        lock_state(&self.inner)
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_state(inner: &Mutex<AuthState>) -> MutexGuard<'_, AuthState> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl AuthService for MemoryAuthService {
    async fn current_session(&self) -> AuthResult<Option<Session>> {
        let state = self.lock();
        if let Some(reason) = &state.unavailable {
            return Err(AuthError::ServiceUnavailable(reason.clone()));
        }
        Ok(state.session.clone().filter(|session| !session.is_expired()))
    }

    fn on_auth_state_change(&self, handler: AuthEventHandler) -> Subscription {
        let id = {
            let mut state = self.lock();
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.insert(id, handler);
            id
        };

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock_state(&inner).listeners.remove(&id);
            }
        })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let mut state = self.lock();
        if state.session.take().is_some() {
            log::debug!("Memory auth: signed out");
        }
        Self::deliver(&state, AuthEvent::signed_out());
        Ok(())
    }
}

struct DirectoryState {
    roles: RwLock<HashMap<String, Role>>,
    failure: RwLock<Option<String>>,
    paused: watch::Sender<bool>,
    role_lookups: AtomicUsize,
    admin_lookups: AtomicUsize,
}

/// In-memory role assignment relation
///
/// Lookups can be paused to hold them in flight, which lets tests interleave
/// auth events with pending resolutions deterministically.
#[derive(Clone)]
pub struct MemoryRoleDirectory {
    inner: Arc<DirectoryState>,
}

impl MemoryRoleDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::new(DirectoryState {
                roles: RwLock::new(HashMap::new()),
                failure: RwLock::new(None),
                paused,
                role_lookups: AtomicUsize::new(0),
                admin_lookups: AtomicUsize::new(0),
            }),
        }
    }

    /// Assign a role (replacing any previous one)
    pub fn assign(&self, identity_id: impl Into<String>, role: Role) {
        write_lock(&self.inner.roles).insert(identity_id.into(), role);
    }

    /// Remove an identity's role row
    pub fn revoke(&self, identity_id: &str) -> Option<Role> {
        write_lock(&self.inner.roles).remove(identity_id)
    }

    /// Make lookups fail (`Some`) or succeed again (`None`)
    pub fn set_failure(&self, reason: Option<&str>) {
        *write_lock(&self.inner.failure) = reason.map(str::to_string);
    }

    /// Hold every lookup until [`MemoryRoleDirectory::resume`]
    pub fn pause(&self) {
        self.inner.paused.send_replace(true);
    }

    /// Release held lookups
    pub fn resume(&self) {
        self.inner.paused.send_replace(false);
    }

    /// Number of `resolve_role` calls so far
    pub fn role_lookups(&self) -> usize {
        self.inner.role_lookups.load(Ordering::SeqCst)
    }

    /// Number of `resolve_is_admin` calls so far
    pub fn admin_lookups(&self) -> usize {
        self.inner.admin_lookups.load(Ordering::SeqCst)
    }

    async fn wait_until_released(&self) {
        let mut paused = self.inner.paused.subscribe();
        // The sender lives as long as self, so this only returns once released
        let _ = paused.wait_for(|paused| !*paused).await;
    }

    fn lookup(&self, identity_id: &str) -> AuthResult<Option<Role>> {
        if let Some(reason) = read_lock(&self.inner.failure).as_ref() {
            return Err(AuthError::Lookup(reason.clone()));
        }
        Ok(read_lock(&self.inner.roles).get(identity_id).copied())
    }
}

impl Default for MemoryRoleDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RoleDirectory for MemoryRoleDirectory {
    async fn resolve_role(&self, identity_id: &str) -> AuthResult<Option<Role>> {
        self.inner.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.wait_until_released().await;
        self.lookup(identity_id)
    }

    async fn resolve_is_admin(&self, identity_id: &str) -> AuthResult<bool> {
        self.inner.admin_lookups.fetch_add(1, Ordering::SeqCst);
        self.wait_until_released().await;
        Ok(self.lookup(identity_id)? == Some(Role::Admin))
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_auth_session_lifecycle() {
        let auth = MemoryAuthService::new();
        assert!(auth.current_session().await.unwrap().is_none());

        let session = auth.sign_in(Identity::new("user-1"));
        let current = auth.current_session().await.unwrap().unwrap();
        assert_eq!(current.access_token, session.access_token);

        let refreshed = auth.refresh_token().unwrap();
        assert_ne!(refreshed.access_token, session.access_token);
        assert_eq!(refreshed.identity.id, "user-1");

        auth.sign_out().await.unwrap();
        assert!(auth.current_session().await.unwrap().is_none());
        assert!(auth.refresh_token().is_none());
    }

    #[tokio::test]
    async fn test_memory_auth_events() {
        let auth = MemoryAuthService::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let subscription = auth.on_auth_state_change(Arc::new(move |event: AuthEvent| {
            sink.lock().unwrap().push(event.kind);
        }));
        assert_eq!(auth.listener_count(), 1);

        auth.sign_up(Identity::new("user-1"));
        auth.update_user(Identity::new("user-1").with_email("new@example.com"));
        auth.sign_out().await.unwrap();

        subscription.unsubscribe();
        assert_eq!(auth.listener_count(), 0);
        auth.sign_in(Identity::new("user-1"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![AuthEventKind::SignedUp, AuthEventKind::UserUpdated, AuthEventKind::SignedOut]
        );
    }

    #[tokio::test]
    async fn test_memory_auth_unavailable() {
        let auth = MemoryAuthService::with_session(Identity::new("user-1"));
        auth.set_unavailable(Some("connection refused"));

        let err = auth.current_session().await.unwrap_err();
        assert!(matches!(err, AuthError::ServiceUnavailable(_)));

        auth.set_unavailable(None);
        assert!(auth.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_directory_lookup() {
        let directory = MemoryRoleDirectory::new();
        directory.assign("user-1", Role::Admin);

        assert_eq!(directory.resolve_role("user-1").await.unwrap(), Some(Role::Admin));
        assert_eq!(directory.resolve_role("user-2").await.unwrap(), None);
        assert!(directory.resolve_is_admin("user-1").await.unwrap());
        assert_eq!(directory.role_lookups(), 2);
        assert_eq!(directory.admin_lookups(), 1);

        assert_eq!(directory.revoke("user-1"), Some(Role::Admin));
        assert!(!directory.resolve_is_admin("user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_directory_failure() {
        let directory = MemoryRoleDirectory::new();
        directory.set_failure(Some("relation missing"));

        let err = directory.resolve_role("user-1").await.unwrap_err();
        assert!(matches!(err, AuthError::Lookup(reason) if reason == "relation missing"));

        directory.set_failure(None);
        assert!(directory.resolve_role("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_directory_pause() {
        let directory = MemoryRoleDirectory::new();
        directory.assign("user-1", Role::Employee);
        directory.pause();

        let pending = {
            let directory = directory.clone();
            tokio::spawn(async move { directory.resolve_role("user-1").await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        directory.resume();
        assert_eq!(pending.await.unwrap().unwrap(), Some(Role::Employee));
    }
}
