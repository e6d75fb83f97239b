//! Auth store: the single owner of the authentication snapshot
//!
//! The store mirrors the auth service's session, resolves the signed-in
//! identity's role through a [`RoleDirectory`] and publishes the result as
//! whole [`AuthSnapshot`]s on a watch channel.
//!
//! All mutation happens on one worker task. The auth service's change handler
//! only enqueues the event, so role lookups (which call back into the backend)
//! always run after the notification has returned. Every auth event bumps a
//! generation counter; lookup results tagged with an older generation, or with
//! an identity that is no longer signed in, are dropped. Within a generation,
//! each lookup also carries a sequence number and only the newest completed
//! lookup is applied.

use super::events::{AuthEvent, AuthEventKind};
use super::store::{AuthService, Session};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::rbac::{AuthSnapshot, Role, RoleDirectory};
use crate::shell::{Severity, Shell};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

enum StoreCommand {
    Initialize { done: oneshot::Sender<()> },
    AuthChanged(AuthEvent),
    RefreshRole { reply: oneshot::Sender<Option<Role>> },
    WaitIdle { reply: oneshot::Sender<()> },
    Shutdown,
}

enum Purpose {
    AuthChange(AuthEventKind),
    Refresh(oneshot::Sender<Option<Role>>),
}

enum Completion {
    Initialized {
        generation: u64,
        fetched: AuthResult<Option<(Session, RoleResolution)>>,
        done: oneshot::Sender<()>,
    },
    Resolved {
        generation: u64,
        sequence: u64,
        identity_id: String,
        resolution: RoleResolution,
        purpose: Purpose,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RoleResolution {
    role: Option<Role>,
    is_admin: bool,
    error: Option<String>,
}

/// Look up the role (and admin flag) for one identity
///
/// Failures collapse to "no role"; the message is kept for diagnostics.
async fn resolve(directory: &dyn RoleDirectory, identity_id: &str, derive_admin_flag: bool) -> RoleResolution {
    if derive_admin_flag {
        return match directory.resolve_role(identity_id).await {
            Ok(role) => RoleResolution { role, is_admin: role == Some(Role::Admin), error: None },
            Err(e) => {
                log::warn!("Role lookup failed for {}: {}", identity_id, e);
                RoleResolution { error: Some(e.to_string()), ..RoleResolution::default() }
            }
        };
    }

    let (role, is_admin) =
        tokio::join!(directory.resolve_role(identity_id), directory.resolve_is_admin(identity_id));

    let mut errors = Vec::new();
    let role = match role {
        Ok(role) => role,
        Err(e) => {
            log::warn!("Role lookup failed for {}: {}", identity_id, e);
            errors.push(e.to_string());
            None
        }
    };
    let is_admin = match is_admin {
        Ok(flag) => flag,
        Err(e) => {
            log::warn!("Admin lookup failed for {}: {}", identity_id, e);
            errors.push(e.to_string());
            false
        }
    };

    RoleResolution {
        role,
        is_admin,
        error: if errors.is_empty() { None } else { Some(errors.join("; ")) },
    }
}

struct StoreWorker {
    auth: Arc<dyn AuthService>,
    directory: Arc<dyn RoleDirectory>,
    shell: Shell,
    config: Arc<AuthConfig>,
    state: Arc<watch::Sender<AuthSnapshot>>,
    commands: mpsc::UnboundedReceiver<StoreCommand>,
    lookups: JoinSet<Completion>,
    generation: u64,
    sequence: u64,
    applied_sequence: u64,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl StoreWorker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(StoreCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(joined) = self.lookups.join_next(), if !self.lookups.is_empty() => match joined {
                    Ok(completion) => self.complete(completion),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => log::error!("Auth store lookup task failed: {}", e),
                },
            }

            if self.lookups.is_empty() {
                for waiter in self.idle_waiters.drain(..) {
                    let _ = waiter.send(());
                }
            }
        }

        self.lookups.abort_all();
        log::debug!("Auth store worker stopped");
    }

    fn handle_command(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::Initialize { done } => self.initialize(done),
            StoreCommand::AuthChanged(event) => self.auth_changed(event),
            StoreCommand::RefreshRole { reply } => {
                let identity_id = self.state.borrow().identity_id().map(str::to_string);
                match identity_id {
                    Some(identity_id) => self.spawn_resolution(identity_id, Purpose::Refresh(reply)),
                    None => {
                        let _ = reply.send(None);
                    }
                }
            }
            StoreCommand::WaitIdle { reply } => self.idle_waiters.push(reply),
            StoreCommand::Shutdown => {}
        }
    }

    fn initialize(&mut self, done: oneshot::Sender<()>) {
        self.generation += 1;
        let generation = self.generation;
        let auth = Arc::clone(&self.auth);
        let directory = Arc::clone(&self.directory);
        let derive_admin_flag = self.config.derive_admin_flag;

        self.state.send_modify(|snapshot| snapshot.is_loading = true);
        self.lookups.spawn(async move {
            let fetched = match auth.current_session().await {
                Ok(Some(session)) => {
                    let resolution =
                        resolve(directory.as_ref(), &session.identity.id, derive_admin_flag).await;
                    Ok(Some((session, resolution)))
                }
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            };
            Completion::Initialized { generation, fetched, done }
        });
    }

    fn auth_changed(&mut self, event: AuthEvent) {
        self.generation += 1;
        log::debug!("Auth event {} (generation {})", event.kind, self.generation);

        let AuthEvent { kind, session } = event;
        match session {
            Some(session) => {
                let identity_id = session.identity.id.clone();
                self.state.send_modify(|snapshot| {
                    let same_identity = snapshot.identity_id() == Some(identity_id.as_str());
                    snapshot.identity = Some(session.identity.clone());
                    snapshot.session = Some(session);
                    if !same_identity {
                        snapshot.role = None;
                        snapshot.is_admin = false;
                        snapshot.role_error = None;
                        snapshot.is_loading = true;
                    }
                });
                self.spawn_resolution(identity_id, Purpose::AuthChange(kind));
            }
            None => {
                self.state.send_replace(AuthSnapshot::signed_out());
                self.redirect_to_login();
            }
        }
    }

    fn spawn_resolution(&mut self, identity_id: String, purpose: Purpose) {
        self.sequence += 1;
        let generation = self.generation;
        let sequence = self.sequence;
        let directory = Arc::clone(&self.directory);
        let derive_admin_flag = self.config.derive_admin_flag;

        self.lookups.spawn(async move {
            let resolution = resolve(directory.as_ref(), &identity_id, derive_admin_flag).await;
            Completion::Resolved { generation, sequence, identity_id, resolution, purpose }
        });
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Initialized { generation, fetched, done } => {
                if generation == self.generation {
                    self.apply_initial(fetched);
                } else {
                    log::debug!("Discarding superseded initial load (generation {})", generation);
                }
                let _ = done.send(());
            }
            Completion::Resolved { generation, sequence, identity_id, resolution, purpose } => {
                self.apply_resolution(generation, sequence, identity_id, resolution, purpose)
            }
        }
    }

    fn apply_initial(&mut self, fetched: AuthResult<Option<(Session, RoleResolution)>>) {
        match fetched {
            Ok(Some((session, RoleResolution { role, is_admin, error }))) => {
                log::info!(
                    "Auth store initialized for {} (role: {})",
                    session.identity.id,
                    role.map(|r| r.as_str()).unwrap_or("none")
                );
                self.state.send_replace(AuthSnapshot {
                    identity: Some(session.identity.clone()),
                    session: Some(session),
                    role,
                    is_admin,
                    is_loading: false,
                    role_error: error,
                });
            }
            Ok(None) => {
                log::info!("Auth store initialized without a session");
                self.state.send_replace(AuthSnapshot::signed_out());
            }
            Err(e) => {
                log::error!("Failed to load the current session: {}", e);
                self.state.send_replace(AuthSnapshot::signed_out());
                self.shell.notifier.notify(&self.config.session_error_message, Severity::Error);
            }
        }

        if self.state.borrow().role.is_none() {
            self.redirect_to_login();
        }
    }

    fn apply_resolution(
        &mut self,
        generation: u64,
        sequence: u64,
        identity_id: String,
        resolution: RoleResolution,
        purpose: Purpose,
    ) {
        let current = generation == self.generation
            && self.state.borrow().identity_id() == Some(identity_id.as_str());
        if !current {
            log::debug!("Discarding stale role resolution for {} (generation {})", identity_id, generation);
            if let Purpose::Refresh(reply) = purpose {
                let _ = reply.send(self.state.borrow().role);
            }
            return;
        }

        // A newer lookup for this identity already landed
        if sequence < self.applied_sequence {
            log::debug!("Discarding out-of-order role resolution for {} (sequence {})", identity_id, sequence);
            let role = self.state.borrow().role;
            self.finish(purpose, role);
            return;
        }
        self.applied_sequence = sequence;

        let RoleResolution { role, is_admin, error } = resolution;
        self.state.send_modify(|snapshot| {
            snapshot.role = role;
            snapshot.is_admin = is_admin;
            snapshot.role_error = error;
            snapshot.is_loading = false;
        });

        self.finish(purpose, role);
    }

    fn finish(&self, purpose: Purpose, role: Option<Role>) {
        match purpose {
            Purpose::Refresh(reply) => {
                let _ = reply.send(role);
            }
            Purpose::AuthChange(kind) if self.config.navigates_on(kind) => {
                let target = self.config.landing_for(role);
                log::debug!("Navigating to {} after {}", target, kind);
                self.shell.navigator.navigate(target);
            }
            Purpose::AuthChange(kind) => {
                log::debug!("Navigation suppressed after {}", kind);
            }
        }
    }

    fn redirect_to_login(&self) {
        let path = self.shell.navigator.current_path();
        if !self.config.is_auth_flow(&path) {
            self.shell.navigator.navigate(&self.config.login_path);
        }
    }
}

/// Authentication state owner
///
/// # Example
///
/// ```no_run
/// use assetgate_core::session::{AuthStore, MemoryAuthService, MemoryRoleDirectory};
/// use assetgate_core::shell::{RecordingShell, Shell};
/// use std::sync::Arc;
///
/// # async fn example() -> assetgate_core::error::AuthResult<()> {
/// let store = AuthStore::new(
///     Arc::new(MemoryAuthService::new()),
///     Arc::new(MemoryRoleDirectory::new()),
///     Shell::from_shared(Arc::new(RecordingShell::new("/"))),
/// );
/// store.init().await?;
/// let snapshot = store.snapshot();
/// # Ok(())
/// # }
/// ```
pub struct AuthStore {
    auth: Arc<dyn AuthService>,
    directory: Arc<dyn RoleDirectory>,
    shell: Shell,
    config: Arc<AuthConfig>,
    state: Arc<watch::Sender<AuthSnapshot>>,
    commands: mpsc::UnboundedSender<StoreCommand>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<StoreCommand>>>,
    subscription: Mutex<Option<super::Subscription>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AuthStore {
    /// Create a store with the default configuration
    pub fn new(auth: Arc<dyn AuthService>, directory: Arc<dyn RoleDirectory>, shell: Shell) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        let (commands, receiver) = mpsc::unbounded_channel();
        Self {
            auth,
            directory,
            shell,
            config: Arc::new(AuthConfig::default()),
            state: Arc::new(state),
            commands,
            receiver: Mutex::new(Some(receiver)),
            subscription: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    /// Replace the configuration (before [`AuthStore::init`])
    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Current snapshot
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Whether the worker is running
    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Subscribe to auth changes, load the current session and resolve its role
    ///
    /// Returns once the initial load has been applied (or superseded by a
    /// newer auth event). A second call fails with
    /// [`AuthError::AlreadyInitialized`].
    pub async fn init(&self) -> AuthResult<()> {
        let receiver = lock(&self.receiver).take().ok_or(AuthError::AlreadyInitialized)?;

        let commands = self.commands.clone();
        let subscription = self.auth.on_auth_state_change(Arc::new(move |event: AuthEvent| {
            // Enqueue only: the worker picks it up after the callback returns
            if commands.send(StoreCommand::AuthChanged(event)).is_err() {
                log::debug!("Auth event dropped, store is shut down");
            }
        }));
        *lock(&self.subscription) = Some(subscription);

        let worker = StoreWorker {
            auth: Arc::clone(&self.auth),
            directory: Arc::clone(&self.directory),
            shell: self.shell.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
            commands: receiver,
            lookups: JoinSet::new(),
            generation: 0,
            sequence: 0,
            applied_sequence: 0,
            idle_waiters: Vec::new(),
        };
        *lock(&self.worker) = Some(tokio::spawn(worker.run()));

        let (done, initialized) = oneshot::channel();
        self.send(StoreCommand::Initialize { done })?;
        initialized.await.map_err(|_| AuthError::StoreClosed)
    }

    /// Re-run the role lookup for the current identity
    ///
    /// Never navigates. Returns `None` without a lookup when signed out.
    pub async fn refresh_role(&self) -> AuthResult<Option<Role>> {
        self.ensure_initialized()?;
        let (reply, role) = oneshot::channel();
        self.send(StoreCommand::RefreshRole { reply })?;
        role.await.map_err(|_| AuthError::StoreClosed)
    }

    /// Wait until no lookup is in flight
    pub async fn wait_idle(&self) -> AuthResult<()> {
        self.ensure_initialized()?;
        let (reply, idle) = oneshot::channel();
        self.send(StoreCommand::WaitIdle { reply })?;
        idle.await.map_err(|_| AuthError::StoreClosed)
    }

    /// Unsubscribe from the auth service and stop the worker
    ///
    /// In-flight lookups are cancelled and their results never applied.
    pub async fn dispose(&self) {
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        let _ = self.commands.send(StoreCommand::Shutdown);

        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                if !e.is_cancelled() {
                    log::error!("Auth store worker failed: {}", e);
                }
            }
        }
    }

    fn ensure_initialized(&self) -> AuthResult<()> {
        if lock(&self.worker).is_none() {
            return Err(AuthError::NotInitialized);
        }
        Ok(())
    }

    fn send(&self, command: StoreCommand) -> AuthResult<()> {
        self.commands.send(command).map_err(|_| AuthError::StoreClosed)
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        if let Some(worker) = lock(&self.worker).take() {
            worker.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Identity, MemoryAuthService, MemoryRoleDirectory};
    use crate::shell::RecordingShell;

    fn setup(
        auth: MemoryAuthService,
        path: &str,
    ) -> (AuthStore, MemoryAuthService, MemoryRoleDirectory, Arc<RecordingShell>) {
        let directory = MemoryRoleDirectory::new();
        let shell = Arc::new(RecordingShell::new(path));
        let store = AuthStore::new(
            Arc::new(auth.clone()),
            Arc::new(directory.clone()),
            Shell::from_shared(shell.clone()),
        );
        (store, auth, directory, shell)
    }

    #[tokio::test]
    async fn test_snapshot_before_init() {
        let (store, _, _, _) = setup(MemoryAuthService::new(), "/");
        let snapshot = store.snapshot();
        assert!(snapshot.is_loading);
        assert!(snapshot.identity.is_none());
        assert!(!store.is_running());
        assert!(matches!(store.refresh_role().await, Err(AuthError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let (store, _, _, _) = setup(MemoryAuthService::new(), "/auth/login");
        store.init().await.unwrap();
        assert!(matches!(store.init().await, Err(AuthError::AlreadyInitialized)));
        store.dispose().await;
    }

    #[tokio::test]
    async fn test_init_with_admin_session() {
        let auth = MemoryAuthService::with_session(Identity::new("admin-1"));
        let (store, _, directory, shell) = setup(auth, "/admin");
        directory.assign("admin-1", Role::Admin);

        store.init().await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.role, Some(Role::Admin));
        assert!(snapshot.is_admin);
        assert!(!snapshot.is_loading);
        assert!(shell.navigations().is_empty());
        store.dispose().await;
    }

    #[tokio::test]
    async fn test_init_failure_notifies_once() {
        let auth = MemoryAuthService::new();
        auth.set_unavailable(Some("offline"));
        let (store, _, _, shell) = setup(auth, "/assets");

        store.init().await.unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.identity.is_none());
        assert!(!snapshot.is_loading);

        let notifications = shell.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Error);
        assert_eq!(shell.navigations(), vec!["/auth/login".to_string()]);
        store.dispose().await;
    }

    #[tokio::test]
    async fn test_handler_only_enqueues() {
        let (store, auth, directory, _) = setup(MemoryAuthService::new(), "/auth/login");
        directory.assign("u1", Role::Employee);
        store.init().await.unwrap();

        // Returns even though the lookup has not started
        auth.sign_in(Identity::new("u1"));
        store.wait_idle().await.unwrap();
        assert_eq!(store.snapshot().role, Some(Role::Employee));
        store.dispose().await;
    }

    #[tokio::test]
    async fn test_dispose_unsubscribes() {
        let (store, auth, _, _) = setup(MemoryAuthService::new(), "/auth/login");
        store.init().await.unwrap();
        assert_eq!(auth.listener_count(), 1);
        assert!(store.is_running());

        store.dispose().await;
        assert_eq!(auth.listener_count(), 0);
        assert!(!store.is_running());
        assert!(matches!(store.refresh_role().await, Err(AuthError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_derived_admin_flag_uses_single_lookup() {
        let auth = MemoryAuthService::with_session(Identity::new("u1"));
        let (store, _, directory, _) = setup(auth, "/");
        directory.assign("u1", Role::Admin);

        store.init().await.unwrap();
        assert_eq!(directory.role_lookups(), 1);
        assert_eq!(directory.admin_lookups(), 0);
        store.dispose().await;
    }

    #[tokio::test]
    async fn test_resolve_collapses_failures() {
        let directory = MemoryRoleDirectory::new();
        directory.set_failure(Some("permission denied"));

        let resolution = resolve(&directory, "u1", true).await;
        assert_eq!(resolution.role, None);
        assert!(!resolution.is_admin);
        assert!(resolution.error.unwrap().contains("permission denied"));

        let resolution = resolve(&directory, "u1", false).await;
        assert_eq!(resolution.role, None);
        assert!(resolution.error.is_some());
    }
}
