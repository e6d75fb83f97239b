//! Authentication snapshot published by the auth store

use super::Role;
use crate::session::{Identity, Session};

/// Everything the UI needs to know about who is signed in
///
/// Snapshots are replaced as a whole, so a consumer never sees an identity from
/// one update paired with a role from another.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    /// Signed-in identity
    pub identity: Option<Identity>,

    /// Session mirrored from the auth service
    pub session: Option<Session>,

    /// Role resolved from the role relation (`None` = roleless or signed out)
    pub role: Option<Role>,

    /// Convenience flag, `role == Some(Admin)` unless resolved separately
    pub is_admin: bool,

    /// Initial load or role resolution for a new identity still in flight
    pub is_loading: bool,

    /// Last role lookup failure, kept for diagnostics only
    pub role_error: Option<String>,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            session: None,
            role: None,
            is_admin: false,
            is_loading: true,
            role_error: None,
        }
    }
}

impl AuthSnapshot {
    /// Empty, settled state (signed out)
    pub fn signed_out() -> Self {
        Self { is_loading: false, ..Self::default() }
    }

    /// Id of the signed-in identity
    pub fn identity_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// Whether an identity is present
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Check if the resolved role is exactly `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    /// Signed in, done loading, but no role assigned
    pub fn is_roleless(&self) -> bool {
        !self.is_loading && self.identity.is_some() && self.role.is_none()
    }
}
