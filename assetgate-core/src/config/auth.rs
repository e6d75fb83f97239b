//! Auth store configuration

use crate::rbac::Role;
use crate::session::AuthEventKind;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Auth store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Login screen
    /// Env: ASSETGATE_LOGIN_PATH
    /// Default: "/auth/login"
    pub login_path: String,

    /// Landing screen for admins
    /// Env: ASSETGATE_ADMIN_LANDING
    /// Default: "/admin"
    pub admin_landing: String,

    /// Landing screen for employees
    /// Env: ASSETGATE_DEFAULT_LANDING
    /// Default: "/"
    pub default_landing: String,

    /// Screens that belong to the sign-in/sign-up flow
    /// Default: ["/auth"]
    pub auth_flow_prefixes: Vec<String>,

    /// Auth events that never trigger a landing redirect
    /// Default: ["signed_up"]
    pub suppress_navigation_on: Vec<AuthEventKind>,

    /// Derive `is_admin` from the role instead of a second lookup
    /// Env: ASSETGATE_DERIVE_ADMIN_FLAG
    /// Default: true
    pub derive_admin_flag: bool,

    /// Message shown when the session cannot be loaded at startup
    pub session_error_message: String,

    /// Toast shown to a signed-in identity without a role
    pub roleless_message: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/auth/login".to_string(),
            admin_landing: "/admin".to_string(),
            default_landing: "/".to_string(),
            auth_flow_prefixes: vec!["/auth".to_string()],
            suppress_navigation_on: vec![AuthEventKind::SignedUp],
            derive_admin_flag: true,
            session_error_message: "Unable to reach the authentication service. Please sign in again."
                .to_string(),
            roleless_message: "No role assigned to your account. Contact an administrator."
                .to_string(),
        }
    }
}

impl AuthConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set login path
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set landing screens
    pub fn with_landings(mut self, admin: impl Into<String>, default: impl Into<String>) -> Self {
        self.admin_landing = admin.into();
        self.default_landing = default.into();
        self
    }

    /// Set whether `is_admin` is derived from the role
    pub fn with_derive_admin_flag(mut self, derive: bool) -> Self {
        self.derive_admin_flag = derive;
        self
    }

    /// Set the events that never navigate
    pub fn with_suppressed_navigation(mut self, kinds: Vec<AuthEventKind>) -> Self {
        self.suppress_navigation_on = kinds;
        self
    }

    /// Whether `path` is part of the sign-in/sign-up flow
    pub fn is_auth_flow(&self, path: &str) -> bool {
        path == self.login_path
            || self.auth_flow_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Screen to land on after the role is known
    pub fn landing_for(&self, role: Option<Role>) -> &str {
        match role {
            Some(Role::Admin) => &self.admin_landing,
            Some(Role::Employee) => &self.default_landing,
            None => &self.login_path,
        }
    }

    /// Whether an event kind redirects once its role is resolved
    pub fn navigates_on(&self, kind: AuthEventKind) -> bool {
        !self.suppress_navigation_on.contains(&kind)
    }

    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| env::var(key).ok());
    }

    /// Apply `ASSETGATE_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("ASSETGATE_LOGIN_PATH") {
            self.login_path = path;
        }
        if let Some(path) = var("ASSETGATE_ADMIN_LANDING") {
            self.admin_landing = path;
        }
        if let Some(path) = var("ASSETGATE_DEFAULT_LANDING") {
            self.default_landing = path;
        }
        if let Some(derive) = var("ASSETGATE_DERIVE_ADMIN_FLAG") {
            self.derive_admin_flag = derive.parse().unwrap_or(true);
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("login_path", &self.login_path),
            ("admin_landing", &self.admin_landing),
            ("default_landing", &self.default_landing),
        ] {
            if !path.starts_with('/') {
                bail!("Invalid {}: '{}' must start with '/'", name, path);
            }
        }

        if self.auth_flow_prefixes.iter().any(|prefix| prefix.is_empty() || prefix == "/") {
            bail!("Invalid auth_flow_prefixes: a prefix cannot cover every screen");
        }

        if self.is_auth_flow(&self.admin_landing) || self.is_auth_flow(&self.default_landing) {
            bail!("Invalid landing screens: landings cannot be auth-flow screens");
        }

        Ok(())
    }
}
