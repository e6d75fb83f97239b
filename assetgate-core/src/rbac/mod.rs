//! AssetGate RBAC (Role-Based Access Control) Module
//!
//! Roles, the role hierarchy evaluator, the snapshot of who is signed in, and the
//! role-directory seam used to resolve an identity's role.
//!
//! # Example
//! ```rust,ignore
//! use assetgate_core::rbac::{has_permission, Role};
//!
//! assert!(has_permission(Some(Role::Admin), Role::Employee));
//! assert!(!has_permission(Some(Role::Employee), Role::Admin));
//! assert!(!has_permission(None, Role::Employee));
//! ```

mod context;
mod hierarchy;
mod roles;
mod traits;

// Public exports
pub use context::AuthSnapshot;
pub use hierarchy::RoleHierarchy;
pub use roles::{format_roles, Role};
pub use traits::RoleDirectory;

use std::sync::OnceLock;

/// Trait for checking whether a held role satisfies a required one
///
/// Implement this trait to plug a custom policy into the access guard.
pub trait PermissionChecker: Send + Sync {
    /// Check if `held` grants access to features requiring `required`
    ///
    /// Must return `false` when `held` is `None`.
    fn has_permission(&self, held: Option<Role>, required: Role) -> bool;

    /// `true` iff `held` satisfies at least one of `allowed`
    fn has_any_permission(&self, held: Option<Role>, allowed: &[Role]) -> bool {
        allowed.iter().any(|required| self.has_permission(held, *required))
    }
}

/// Evaluate against the declared hierarchy
pub fn has_permission(held: Option<Role>, required: Role) -> bool {
    static DECLARED: OnceLock<RoleHierarchy> = OnceLock::new();
    DECLARED.get_or_init(RoleHierarchy::declared).has_permission(held, required)
}
