//! Guard decisions

use crate::rbac::{format_roles, Role};
use std::fmt;

/// Default text for an identity without a role
pub const ROLELESS_MESSAGE: &str = "No role assigned to your account. Contact an administrator.";

/// What a guard renders for one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Store still loading: render the loading fallback
    Loading,
    /// Render the children
    Grant,
    /// Navigate away and render nothing
    Redirect(String),
    /// Render an inline denial notice
    Alert(DenialNotice),
    /// Render the fallback
    Fallback,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Grant)
    }
}

/// Why access was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialNotice {
    /// Nobody is signed in
    Unauthenticated,
    /// Signed in, but no role row exists (or the lookup failed)
    Roleless { identity_id: String, message: String },
    /// Signed in with a role below every allowed role
    Insufficient { role: Role, allowed: Vec<Role> },
}

impl fmt::Display for DenialNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialNotice::Unauthenticated => write!(f, "You must be signed in to view this page."),
            DenialNotice::Roleless { identity_id, message } => {
                write!(f, "{} (user id: {})", message, identity_id)
            }
            DenialNotice::Insufficient { role, allowed } => write!(
                f,
                "Access denied: your role '{}' does not grant access. Required: {}.",
                role,
                format_roles(allowed)
            ),
        }
    }
}
