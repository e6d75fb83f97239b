//! Access guards - declarative role gates for views
//!
//! A guard wraps some content (`children`) and decides from the current
//! [`AuthSnapshot`] whether to render it:
//! - still loading: the loading fallback
//! - role grants one of the allowed roles: the children
//! - otherwise: redirect, inline denial notice or fallback
//!
//! Example:
//! ```
//! use assetgate_core::guard::{AccessDecision, AccessGuard};
//! use assetgate_core::rbac::{AuthSnapshot, Role};
//!
//! let guard = AccessGuard::new(vec![Role::Admin], "admin panel")
//!     .unwrap()
//!     .with_redirect("/");
//!
//! let decision = guard.decide(&AuthSnapshot::signed_out());
//! assert_eq!(decision, AccessDecision::Redirect("/".to_string()));
//! ```

mod decision;

pub use decision::{AccessDecision, DenialNotice, ROLELESS_MESSAGE};

use crate::error::{AuthError, AuthResult};
use crate::rbac::{AuthSnapshot, PermissionChecker, Role, RoleHierarchy};
use crate::shell::{Severity, Shell};
use std::sync::Arc;
use tokio::sync::watch;

/// What a render produced
#[derive(Debug, PartialEq)]
pub enum View<'a, C> {
    /// Children or one of the fallbacks
    Content(&'a C),
    /// Inline denial notice
    Alert(DenialNotice),
    /// Render nothing
    Nothing,
}

/// Declarative role gate
pub struct AccessGuard<C> {
    allowed_roles: Vec<Role>,
    children: C,
    fallback: Option<C>,
    loading_fallback: Option<C>,
    redirect_to: Option<String>,
    show_alert: bool,
    show_toast: bool,
    roleless_message: String,
    checker: Arc<dyn PermissionChecker>,
    // Identity the roleless toast was shown for
    toasted_for: Option<String>,
}

impl<C> std::fmt::Debug for AccessGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("allowed_roles", &self.allowed_roles)
            .field("redirect_to", &self.redirect_to)
            .field("show_alert", &self.show_alert)
            .field("show_toast", &self.show_toast)
            .finish()
    }
}

impl<C> AccessGuard<C> {
    /// Create a guard; `allowed_roles` must not be empty
    pub fn new(allowed_roles: Vec<Role>, children: C) -> AuthResult<Self> {
        if allowed_roles.is_empty() {
            return Err(AuthError::EmptyAllowedRoles);
        }
        Ok(Self {
            allowed_roles,
            children,
            fallback: None,
            loading_fallback: None,
            redirect_to: None,
            show_alert: false,
            show_toast: false,
            roleless_message: ROLELESS_MESSAGE.to_string(),
            checker: Arc::new(RoleHierarchy::declared()),
            toasted_for: None,
        })
    }

    /// Content rendered when access is denied without redirect or alert
    pub fn with_fallback(mut self, fallback: C) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Content rendered while the store is loading
    pub fn with_loading_fallback(mut self, loading: C) -> Self {
        self.loading_fallback = Some(loading);
        self
    }

    /// Navigate to `path` when access is denied
    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }

    /// Render an inline denial notice
    pub fn with_alert(mut self, enabled: bool) -> Self {
        self.show_alert = enabled;
        self
    }

    /// Toast once when a signed-in identity has no role
    pub fn with_toast(mut self, enabled: bool) -> Self {
        self.show_toast = enabled;
        self
    }

    pub fn with_roleless_message(mut self, message: impl Into<String>) -> Self {
        self.roleless_message = message.into();
        self
    }

    /// Use a configured hierarchy (or any other checker)
    pub fn with_checker(mut self, checker: Arc<dyn PermissionChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn allowed_roles(&self) -> &[Role] {
        &self.allowed_roles
    }

    /// Decide what to render for `snapshot`
    ///
    /// Pure: depends only on the snapshot and the guard's configuration.
    pub fn decide(&self, snapshot: &AuthSnapshot) -> AccessDecision {
        if snapshot.is_loading {
            return AccessDecision::Loading;
        }

        let has_access =
            snapshot.role.is_some() && self.checker.has_any_permission(snapshot.role, &self.allowed_roles);

        if has_access {
            AccessDecision::Grant
        } else if let Some(target) = &self.redirect_to {
            AccessDecision::Redirect(target.clone())
        } else if self.show_alert {
            AccessDecision::Alert(self.notice(snapshot))
        } else {
            AccessDecision::Fallback
        }
    }

    /// Decide and apply side effects (redirect, roleless toast)
    pub fn render(&mut self, snapshot: &AuthSnapshot, shell: &Shell) -> View<'_, C> {
        self.track_roleless(snapshot, shell);

        match self.decide(snapshot) {
            AccessDecision::Loading => self.loading_fallback.as_ref().map_or(View::Nothing, View::Content),
            AccessDecision::Grant => View::Content(&self.children),
            AccessDecision::Redirect(target) => {
                log::debug!("Access denied, redirecting to {}", target);
                shell.navigator.navigate(&target);
                View::Nothing
            }
            AccessDecision::Alert(notice) => View::Alert(notice),
            AccessDecision::Fallback => self.fallback.as_ref().map_or(View::Nothing, View::Content),
        }
    }

    /// Wait for the next snapshot and render it
    ///
    /// Returns `None` once the store is gone.
    pub async fn next_render(
        &mut self,
        updates: &mut watch::Receiver<AuthSnapshot>,
        shell: &Shell,
    ) -> Option<View<'_, C>> {
        updates.changed().await.ok()?;
        let snapshot = updates.borrow_and_update().clone();
        Some(self.render(&snapshot, shell))
    }

    fn notice(&self, snapshot: &AuthSnapshot) -> DenialNotice {
        match (snapshot.identity_id(), snapshot.role) {
            (None, _) => DenialNotice::Unauthenticated,
            (Some(identity_id), None) => DenialNotice::Roleless {
                identity_id: identity_id.to_string(),
                message: self.roleless_message.clone(),
            },
            (Some(_), Some(role)) => {
                DenialNotice::Insufficient { role, allowed: self.allowed_roles.clone() }
            }
        }
    }

    fn track_roleless(&mut self, snapshot: &AuthSnapshot, shell: &Shell) {
        let roleless_id = snapshot.identity_id().filter(|_| snapshot.is_roleless());
        let Some(identity_id) = roleless_id else {
            self.toasted_for = None;
            return;
        };

        if self.show_toast && self.toasted_for.as_deref() != Some(identity_id) {
            let notice = DenialNotice::Roleless {
                identity_id: identity_id.to_string(),
                message: self.roleless_message.clone(),
            };
            shell.notifier.notify(&notice.to_string(), Severity::Warning);
            self.toasted_for = Some(identity_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;
    use crate::shell::RecordingShell;

    fn signed_in(id: &str, role: Option<Role>) -> AuthSnapshot {
        AuthSnapshot {
            identity: Some(Identity::new(id)),
            role,
            is_admin: role == Some(Role::Admin),
            is_loading: false,
            ..AuthSnapshot::default()
        }
    }

    fn recording() -> (Arc<RecordingShell>, Shell) {
        let recorder = Arc::new(RecordingShell::new("/assets"));
        let shell = Shell::from_shared(recorder.clone());
        (recorder, shell)
    }

    #[test]
    fn test_empty_allowed_roles_rejected() {
        assert!(matches!(AccessGuard::new(vec![], ()), Err(AuthError::EmptyAllowedRoles)));
    }

    #[test]
    fn test_decide_loading() {
        let guard = AccessGuard::new(vec![Role::Employee], "children").unwrap();
        assert_eq!(guard.decide(&AuthSnapshot::default()), AccessDecision::Loading);
    }

    #[test]
    fn test_decide_grant_by_hierarchy() {
        let guard = AccessGuard::new(vec![Role::Employee], "children").unwrap();
        assert!(guard.decide(&signed_in("u1", Some(Role::Employee))).is_granted());
        assert!(guard.decide(&signed_in("u1", Some(Role::Admin))).is_granted());
        assert_eq!(guard.decide(&signed_in("u1", None)), AccessDecision::Fallback);
    }

    #[test]
    fn test_decide_order() {
        let snapshot = signed_in("u1", Some(Role::Employee));

        let guard = AccessGuard::new(vec![Role::Admin], "children")
            .unwrap()
            .with_redirect("/x")
            .with_alert(true);
        assert_eq!(guard.decide(&snapshot), AccessDecision::Redirect("/x".to_string()));

        let guard = AccessGuard::new(vec![Role::Admin], "children").unwrap().with_alert(true);
        assert_eq!(
            guard.decide(&snapshot),
            AccessDecision::Alert(DenialNotice::Insufficient {
                role: Role::Employee,
                allowed: vec![Role::Admin]
            })
        );
    }

    #[test]
    fn test_decide_alert_variants() {
        let guard = AccessGuard::new(vec![Role::Employee], ()).unwrap().with_alert(true);
        assert_eq!(
            guard.decide(&AuthSnapshot::signed_out()),
            AccessDecision::Alert(DenialNotice::Unauthenticated)
        );
        assert_eq!(
            guard.decide(&signed_in("u7", None)),
            AccessDecision::Alert(DenialNotice::Roleless {
                identity_id: "u7".to_string(),
                message: ROLELESS_MESSAGE.to_string()
            })
        );
    }

    #[test]
    fn test_decide_is_pure() {
        let guard = AccessGuard::new(vec![Role::Admin], ()).unwrap().with_alert(true);
        let snapshot = signed_in("u1", None);
        let first = guard.decide(&snapshot);
        for _ in 0..5 {
            assert_eq!(guard.decide(&snapshot), first);
        }
    }

    #[test]
    fn test_custom_checker() {
        // Employees outrank admins in this deployment
        let hierarchy = RoleHierarchy::from_ranks([(Role::Employee, 5), (Role::Admin, 1)]);
        let guard = AccessGuard::new(vec![Role::Admin], ()).unwrap().with_checker(Arc::new(hierarchy));
        assert!(guard.decide(&signed_in("u1", Some(Role::Employee))).is_granted());
    }

    #[test]
    fn test_render_content_and_fallbacks() {
        let (_, shell) = recording();
        let mut guard = AccessGuard::new(vec![Role::Admin], "panel")
            .unwrap()
            .with_fallback("denied")
            .with_loading_fallback("spinner");

        assert_eq!(guard.render(&AuthSnapshot::default(), &shell), View::Content(&"spinner"));
        assert_eq!(guard.render(&signed_in("u1", Some(Role::Admin)), &shell), View::Content(&"panel"));
        assert_eq!(guard.render(&signed_in("u1", Some(Role::Employee)), &shell), View::Content(&"denied"));
    }

    #[test]
    fn test_render_redirect_navigates() {
        let (recorder, shell) = recording();
        let mut guard = AccessGuard::new(vec![Role::Admin], "panel").unwrap().with_redirect("/x");

        assert_eq!(guard.render(&signed_in("u1", Some(Role::Employee)), &shell), View::Nothing);
        assert_eq!(recorder.navigations(), vec!["/x".to_string()]);
    }

    #[test]
    fn test_roleless_toast_latched() {
        let (recorder, shell) = recording();
        let mut guard = AccessGuard::new(vec![Role::Employee], ()).unwrap().with_toast(true);

        let roleless = signed_in("u1", None);
        guard.render(&roleless, &shell);
        guard.render(&roleless, &shell);
        assert_eq!(recorder.notifications().len(), 1);
        assert!(recorder.notifications()[0].message.contains("u1"));

        // Leaving and re-entering the roleless state toasts again
        guard.render(&signed_in("u1", Some(Role::Employee)), &shell);
        guard.render(&roleless, &shell);
        assert_eq!(recorder.notifications().len(), 2);

        // A different identity is a new transition
        guard.render(&signed_in("u2", None), &shell);
        assert_eq!(recorder.notifications().len(), 3);
    }

    #[test]
    fn test_custom_roleless_message_shared_by_alert_and_toast() {
        let (recorder, shell) = recording();
        let mut guard = AccessGuard::new(vec![Role::Employee], ())
            .unwrap()
            .with_alert(true)
            .with_toast(true)
            .with_roleless_message("Ask IT for access.");

        let alert = match guard.render(&signed_in("u3", None), &shell) {
            View::Alert(notice) => notice.to_string(),
            other => panic!("expected an alert, got {:?}", other),
        };
        assert!(alert.starts_with("Ask IT for access."));
        assert!(alert.contains("u3"));
        assert_eq!(recorder.notifications()[0].message, alert);
    }

    #[test]
    fn test_no_toast_while_loading_or_disabled() {
        let (recorder, shell) = recording();
        let mut guard = AccessGuard::new(vec![Role::Employee], ()).unwrap().with_toast(true);
        let mut loading = signed_in("u1", None);
        loading.is_loading = true;
        guard.render(&loading, &shell);
        assert!(recorder.notifications().is_empty());

        let mut quiet = AccessGuard::new(vec![Role::Employee], ()).unwrap();
        quiet.render(&signed_in("u1", None), &shell);
        assert!(recorder.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_next_render_follows_updates() {
        let (recorder, shell) = recording();
        let (tx, mut rx) = watch::channel(AuthSnapshot::default());
        let mut guard = AccessGuard::new(vec![Role::Employee], "list").unwrap().with_alert(true);

        tx.send_replace(signed_in("u1", Some(Role::Employee)));
        assert_eq!(guard.next_render(&mut rx, &shell).await, Some(View::Content(&"list")));

        tx.send_replace(signed_in("u1", None));
        assert!(matches!(
            guard.next_render(&mut rx, &shell).await,
            Some(View::Alert(DenialNotice::Roleless { .. }))
        ));

        drop(tx);
        assert!(guard.next_render(&mut rx, &shell).await.is_none());
        assert!(recorder.navigations().is_empty());
    }
}
