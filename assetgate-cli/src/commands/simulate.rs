//! Replay a fixture against the auth store with in-memory collaborators.
//!
//! Fixture format:
//!
//! ```toml
//! path = "/assets"              # screen the app starts on
//! session = "emp-1"             # identity already signed in (optional)
//! service_unavailable = false   # make the initial session fetch fail
//!
//! [roles]
//! emp-1 = "employee"
//! admin-1 = "admin"
//!
//! [[events]]
//! kind = "signed_in"
//! identity = "admin-1"
//!
//! [[events]]
//! kind = "signed_out"
//!
//! [[guards]]
//! name = "users"
//! allowed = ["admin"]
//! redirect_to = "/"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use assetgate_core::config::AssetGateConfig;
use assetgate_core::guard::{AccessDecision, AccessGuard, View};
use assetgate_core::rbac::{AuthSnapshot, Role};
use assetgate_core::session::{
    AuthEvent, AuthEventKind, AuthService, AuthStore, Identity, MemoryAuthService,
    MemoryRoleDirectory,
};
use assetgate_core::shell::{Notification, RecordingShell, Shell};
use serde::Deserialize;

use super::Outcome;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default = "default_path")]
    path: String,
    session: Option<String>,
    #[serde(default)]
    service_unavailable: bool,
    #[serde(default)]
    roles: BTreeMap<String, Role>,
    #[serde(default)]
    events: Vec<FixtureEvent>,
    #[serde(default)]
    guards: Vec<FixtureGuard>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureEvent {
    kind: AuthEventKind,
    identity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureGuard {
    name: String,
    allowed: Vec<Role>,
    redirect_to: Option<String>,
    #[serde(default)]
    show_alert: bool,
    #[serde(default)]
    show_toast: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// Collects report lines, flushing shell activity as it happens.
struct Report {
    lines: Vec<String>,
    seen_navigations: usize,
    seen_notifications: usize,
}

impl Report {
    fn new() -> Self {
        Self { lines: Vec::new(), seen_navigations: 0, seen_notifications: 0 }
    }

    fn line(&mut self, line: String) {
        self.lines.push(line);
    }

    fn shell_activity(&mut self, recorder: &RecordingShell) {
        let navigations = recorder.navigations();
        for path in &navigations[self.seen_navigations..] {
            self.lines.push(format!("  navigate {}", path));
        }
        self.seen_navigations = navigations.len();

        let notifications = recorder.notifications();
        for Notification { message, severity } in &notifications[self.seen_notifications..] {
            self.lines.push(format!("  notify [{}] {}", severity, message));
        }
        self.seen_notifications = notifications.len();
    }

    fn snapshot(&mut self, snapshot: &AuthSnapshot) {
        self.lines.push(format!(
            "  state identity={} role={} is_admin={} loading={}",
            snapshot.identity_id().unwrap_or("-"),
            snapshot.role.map(|role| role.as_str()).unwrap_or("-"),
            snapshot.is_admin,
            snapshot.is_loading
        ));
    }

    fn finish(self) -> String {
        let mut output = self.lines.join("\n");
        output.push('\n');
        output
    }
}

/// Load a fixture file and run it.
pub async fn run(fixture: &Path, config: &AssetGateConfig) -> Result<Outcome, String> {
    let content = std::fs::read_to_string(fixture)
        .map_err(|e| format!("failed to read {}: {}", fixture.display(), e))?;
    let fixture: Fixture = toml::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {}", fixture.display(), e))?;

    simulate(fixture, config).await.map(Outcome::ok)
}

async fn simulate(fixture: Fixture, config: &AssetGateConfig) -> Result<String, String> {
    let hierarchy = Arc::new(config.rbac.hierarchy().map_err(|e| format!("{:#}", e))?);

    let auth = match &fixture.session {
        Some(id) => MemoryAuthService::with_session(Identity::new(id.as_str())),
        None => MemoryAuthService::new(),
    };
    if fixture.service_unavailable {
        auth.set_unavailable(Some("simulated outage"));
    }

    let directory = MemoryRoleDirectory::new();
    for (id, role) in &fixture.roles {
        directory.assign(id.as_str(), *role);
    }

    let recorder = Arc::new(RecordingShell::new(fixture.path.as_str()));
    let shell = Shell::from_shared(recorder.clone());
    let store = AuthStore::new(Arc::new(auth.clone()), Arc::new(directory), shell.clone())
        .with_config(config.auth.clone());

    let mut report = Report::new();

    report.line(format!("init at {}", fixture.path));
    store.init().await.map_err(|e| e.to_string())?;
    report.shell_activity(&recorder);
    report.snapshot(&store.snapshot());

    for event in &fixture.events {
        report.line(format!(
            "event {}{}",
            event.kind,
            event.identity.as_deref().map(|id| format!(" ({})", id)).unwrap_or_default()
        ));
        // A failed service comes back for later events
        auth.set_unavailable(None);
        apply_event(&auth, event).await?;
        store.wait_idle().await.map_err(|e| e.to_string())?;
        report.shell_activity(&recorder);
        report.snapshot(&store.snapshot());
    }

    let snapshot = store.snapshot();
    for declared in &fixture.guards {
        let mut guard = AccessGuard::new(declared.allowed.clone(), declared.name.clone())
            .map_err(|e| format!("guard {}: {}", declared.name, e))?
            .with_checker(hierarchy.clone())
            .with_alert(declared.show_alert)
            .with_toast(declared.show_toast)
            .with_roleless_message(config.auth.roleless_message.clone());
        if let Some(target) = &declared.redirect_to {
            guard = guard.with_redirect(target.as_str());
        }

        let decision = guard.decide(&snapshot);
        let rendered = match (guard.render(&snapshot, &shell), decision) {
            (View::Content(content), _) if *content == declared.name => "render children".to_string(),
            (View::Content(_), _) => "render fallback".to_string(),
            (View::Alert(notice), _) => format!("alert: {}", notice),
            (View::Nothing, AccessDecision::Redirect(target)) => format!("redirect {}", target),
            (View::Nothing, _) => "render nothing".to_string(),
        };
        report.line(format!("guard {} [{}]: {}", declared.name, format_allowed(&declared.allowed), rendered));
        report.shell_activity(&recorder);
    }

    store.dispose().await;
    Ok(report.finish())
}

async fn apply_event(auth: &MemoryAuthService, event: &FixtureEvent) -> Result<(), String> {
    let identity = || {
        event
            .identity
            .as_deref()
            .map(Identity::new)
            .ok_or_else(|| format!("event {} needs an identity", event.kind))
    };

    match event.kind {
        AuthEventKind::SignedIn => {
            auth.sign_in(identity()?);
        }
        AuthEventKind::SignedUp => {
            auth.sign_up(identity()?);
        }
        AuthEventKind::SignedOut => auth.sign_out().await.map_err(|e| e.to_string())?,
        AuthEventKind::TokenRefreshed => {
            auth.refresh_token().ok_or("token_refreshed without a session")?;
        }
        AuthEventKind::UserUpdated => {
            auth.update_user(identity()?).ok_or("user_updated without a session")?;
        }
        kind => {
            let session = auth.session();
            auth.emit(AuthEvent::new(kind, session));
        }
    }
    Ok(())
}

fn format_allowed(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
}
