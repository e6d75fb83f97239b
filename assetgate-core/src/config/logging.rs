//! Logging configuration

use crate::logging::{LogFormat, LogLevel, LoggingConfig};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// "error", "warn", "info", "debug" or "trace"
    /// Env: ASSETGATE_LOG_LEVEL
    pub level: String,

    /// "human", "json" or "logfmt"
    /// Env: ASSETGATE_LOG_FORMAT
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string() }
    }
}

impl LoggingSettings {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| env::var(key).ok());
    }

    /// Apply `ASSETGATE_*` overrides read through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(level) = var("ASSETGATE_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = var("ASSETGATE_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level.parse::<LogLevel>().is_err() {
            bail!("Invalid log level: {}", self.level);
        }
        if self.format.parse::<LogFormat>().is_err() {
            bail!("Invalid log format: {} (expected human, json or logfmt)", self.format);
        }
        Ok(())
    }

    /// Logger configuration for [`crate::logging::init_logging`]
    pub fn to_logging_config(&self) -> Result<LoggingConfig> {
        self.validate()?;
        let level = self.level.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
        let format = self.format.parse::<LogFormat>().map_err(anyhow::Error::msg)?;
        Ok(LoggingConfig::default().with_level(level).with_format(format))
    }
}
