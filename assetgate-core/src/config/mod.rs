//! Configuration system for AssetGate
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Code** (builder methods on each section)
//! 2. **Environment Variables** (`ASSETGATE_*`)
//! 3. **Config File** (`assetgate.toml`)
//! 4. **Defaults**
//!
//! Every section is optional in the file; missing keys keep their defaults.
//!
//! # Example
//!
//! ```no_run
//! use assetgate_core::config::AssetGateConfig;
//!
//! // Defaults, then assetgate.toml if present, then the environment
//! let config = AssetGateConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod auth;
pub mod idle;
pub mod logging;
pub mod rbac;

pub use auth::AuthConfig;
pub use idle::IdleConfig;
pub use logging::LoggingSettings;
pub use rbac::RbacConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE: &str = "assetgate.toml";

/// Complete AssetGate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetGateConfig {
    pub auth: AuthConfig,
    pub rbac: RbacConfig,
    pub idle: IdleConfig,
    pub logging: LoggingSettings,
}

impl AssetGateConfig {
    /// Load from `assetgate.toml` in the working directory
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Defaults, then `path` if it exists, then environment variables
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.auth.merge(other.auth);
        self.rbac.merge(other.rbac);
        self.idle.merge(other.idle);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply `ASSETGATE_*` overrides to every section, reading through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        self.auth.apply_env(&var);
        self.rbac.apply_env(&var);
        self.idle.apply_env(&var);
        self.logging.apply_env(&var);
    }

    pub fn validate(&self) -> Result<()> {
        self.auth.validate().context("Invalid [auth] section")?;
        self.rbac.validate().context("Invalid [rbac] section")?;
        self.idle.validate().context("Invalid [idle] section")?;
        self.logging.validate().context("Invalid [logging] section")?;
        Ok(())
    }
}
