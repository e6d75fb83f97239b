//! Idle timeout configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Sign out after a period of inactivity
    /// Env: ASSETGATE_IDLE_ENABLED
    /// Default: false
    pub enabled: bool,

    /// Inactivity period in seconds
    /// Env: ASSETGATE_IDLE_TIMEOUT
    /// Default: 1800 (30 minutes)
    pub timeout_secs: u64,

    /// How often inactivity is checked, in seconds
    /// Default: 30
    pub check_interval_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self { enabled: false, timeout_secs: 1800, check_interval_secs: 30 }
    }
}

impl IdleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| env::var(key).ok());
    }

    /// Apply `ASSETGATE_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(enabled) = var("ASSETGATE_IDLE_ENABLED") {
            self.enabled = enabled.parse().unwrap_or(false);
        }
        if let Some(timeout) = var("ASSETGATE_IDLE_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("Invalid idle timeout_secs: must be greater than 0");
        }
        if self.check_interval_secs == 0 {
            bail!("Invalid idle check_interval_secs: must be greater than 0");
        }
        if self.check_interval_secs > self.timeout_secs {
            bail!("Invalid idle check_interval_secs: must not exceed timeout_secs");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_defaults() {
        let config = IdleConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.timeout(), Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_idle_validation() {
        let config = IdleConfig { enabled: true, timeout_secs: 10, check_interval_secs: 60 };
        assert!(config.validate().is_err());

        let config = IdleConfig { enabled: true, timeout_secs: 0, check_interval_secs: 0 };
        assert!(config.validate().is_err());
    }
}
