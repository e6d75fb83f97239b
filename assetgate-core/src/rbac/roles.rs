//! Role definitions for RBAC

use crate::error::AuthError;
use assetgate_macros::RoleRank;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard role
///
/// Exactly one role is assigned to an identity, through the external role
/// assignment relation. Ranks are declared here; a higher rank includes every
/// lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, RoleRank)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Day-to-day asset, vendor and maintenance work
    #[rank(1)]
    Employee,

    /// User management, role assignment and audit logs
    #[rank(2)]
    Admin,
}

impl Role {
    /// Label used in the role relation and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Join roles for display, e.g. `admin, employee`
pub fn format_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}
