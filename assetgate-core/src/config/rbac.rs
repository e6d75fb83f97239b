//! RBAC configuration

use crate::rbac::{Role, RoleHierarchy};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Role label -> rank; higher ranks include lower ones
    pub ranks: BTreeMap<String, u8>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            ranks: Role::declared_ranks()
                .into_iter()
                .map(|(role, rank)| (role.as_str().to_string(), rank))
                .collect(),
        }
    }
}

impl RbacConfig {
    /// Set a role's rank
    pub fn with_rank(mut self, role: Role, rank: u8) -> Self {
        self.ranks.insert(role.as_str().to_string(), rank);
        self
    }

    /// Build the immutable hierarchy described by this configuration
    pub fn hierarchy(&self) -> Result<RoleHierarchy> {
        RoleHierarchy::from_labels(self.ranks.iter().map(|(label, rank)| (label.as_str(), *rank)))
            .context("Invalid [rbac.ranks] table")
    }

    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| env::var(key).ok());
    }

    /// Apply `ASSETGATE_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        // ASSETGATE_RANK_ADMIN=3, ASSETGATE_RANK_EMPLOYEE=1
        for role in Role::ALL {
            let key = format!("ASSETGATE_RANK_{}", role.as_str().to_ascii_uppercase());
            if let Some(value) = var(&key) {
                if let Ok(rank) = value.parse() {
                    self.ranks.insert(role.as_str().to_string(), rank);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let hierarchy = self.hierarchy()?;
        let unranked = hierarchy.unranked();
        if !unranked.is_empty() {
            log::warn!(
                "Roles without a rank will be denied everywhere: {}",
                crate::rbac::format_roles(&unranked)
            );
        }
        if unranked.len() == Role::ALL.len() {
            bail!("Invalid [rbac.ranks]: no role has a rank");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_declared() {
        let config = RbacConfig::default();
        assert_eq!(config.hierarchy().unwrap(), RoleHierarchy::declared());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_label_rejected() {
        let mut config = RbacConfig::default();
        config.ranks.insert("owner".to_string(), 9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        let config = RbacConfig { ranks: BTreeMap::new() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_rank() {
        let config = RbacConfig::default().with_rank(Role::Employee, 2);
        let hierarchy = config.hierarchy().unwrap();
        // Equal ranks grant each other
        assert!(hierarchy.has_permission(Some(Role::Employee), Role::Admin));
    }
}
