//! Role hierarchy evaluation
//!
//! A hierarchy is a static rank table: access is granted when the held role ranks
//! at least as high as the required one. Tables are built once (from the declared
//! `#[rank]` attributes or from configuration) and never mutated afterwards.

use super::{PermissionChecker, Role};
use crate::error::{AuthError, AuthResult};
use std::collections::HashMap;

/// Immutable rank table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHierarchy {
    ranks: HashMap<Role, u8>,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::declared()
    }
}

impl RoleHierarchy {
    /// Hierarchy from the ranks declared on [`Role`]
    pub fn declared() -> Self {
        Self { ranks: Role::declared_ranks().into_iter().collect() }
    }

    /// Hierarchy from an explicit table
    ///
    /// Roles missing from the table are never granted anything.
    pub fn from_ranks(ranks: impl IntoIterator<Item = (Role, u8)>) -> Self {
        Self { ranks: ranks.into_iter().collect() }
    }

    /// Hierarchy from configuration labels (`"admin" = 2`)
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = (&'a str, u8)>) -> AuthResult<Self> {
        let mut ranks = HashMap::new();
        for (label, rank) in labels {
            let role: Role = label.parse()?;
            if ranks.insert(role, rank).is_some() {
                return Err(AuthError::Config(format!("duplicate rank for role '{}'", role)));
            }
        }
        Ok(Self { ranks })
    }

    /// Rank of a role, `None` when it has no entry
    pub fn rank(&self, role: Role) -> Option<u8> {
        self.ranks.get(&role).copied()
    }

    /// Roles without an entry in this table
    pub fn unranked(&self) -> Vec<Role> {
        Role::ALL.iter().copied().filter(|role| !self.ranks.contains_key(role)).collect()
    }

    /// `true` iff `held` is present and ranks at least as high as `required`
    pub fn has_permission(&self, held: Option<Role>, required: Role) -> bool {
        let Some(held) = held else {
            return false;
        };

        match (self.rank(held), self.rank(required)) {
            (Some(held_rank), Some(required_rank)) => held_rank >= required_rank,
            _ => {
                log::warn!(
                    "Role hierarchy has no rank for '{}' or '{}', denying access",
                    held,
                    required
                );
                false
            }
        }
    }
}

impl PermissionChecker for RoleHierarchy {
    fn has_permission(&self, held: Option<Role>, required: Role) -> bool {
        RoleHierarchy::has_permission(self, held, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_role_never_granted() {
        let hierarchy = RoleHierarchy::declared();
        for required in Role::ALL {
            assert!(!hierarchy.has_permission(None, *required));
        }
    }

    #[test]
    fn test_equal_rank_is_granted() {
        let hierarchy = RoleHierarchy::declared();
        for role in Role::ALL {
            assert!(hierarchy.has_permission(Some(*role), *role));
        }
    }

    #[test]
    fn test_admin_outranks_employee() {
        let hierarchy = RoleHierarchy::declared();
        assert!(hierarchy.has_permission(Some(Role::Admin), Role::Employee));
        assert!(!hierarchy.has_permission(Some(Role::Employee), Role::Admin));
    }

    #[test]
    fn test_unranked_role_fails_closed() {
        let hierarchy = RoleHierarchy::from_ranks([(Role::Employee, 1)]);
        assert_eq!(hierarchy.unranked(), vec![Role::Admin]);

        // Held role missing from the table
        assert!(!hierarchy.has_permission(Some(Role::Admin), Role::Employee));
        // Required role missing from the table
        assert!(!hierarchy.has_permission(Some(Role::Employee), Role::Admin));
        assert!(hierarchy.has_permission(Some(Role::Employee), Role::Employee));
    }

    #[test]
    fn test_from_labels() {
        let hierarchy = RoleHierarchy::from_labels([("admin", 10), ("employee", 5)]).unwrap();
        assert_eq!(hierarchy.rank(Role::Admin), Some(10));
        assert_eq!(hierarchy.rank(Role::Employee), Some(5));

        assert!(RoleHierarchy::from_labels([("owner", 3)]).is_err());
        assert!(RoleHierarchy::from_labels([("admin", 1), ("Admin", 2)]).is_err());
    }

    #[test]
    fn test_any_permission() {
        let hierarchy = RoleHierarchy::declared();
        assert!(hierarchy.has_any_permission(Some(Role::Employee), &[Role::Admin, Role::Employee]));
        assert!(!hierarchy.has_any_permission(Some(Role::Employee), &[Role::Admin]));
        assert!(!hierarchy.has_any_permission(Some(Role::Admin), &[]));
    }

    #[test]
    fn test_checker_trait_object() {
        let checker: std::sync::Arc<dyn PermissionChecker> =
            std::sync::Arc::new(RoleHierarchy::declared());
        assert!(checker.has_permission(Some(Role::Admin), Role::Admin));
        assert!(!checker.has_permission(None, Role::Employee));
    }
}
