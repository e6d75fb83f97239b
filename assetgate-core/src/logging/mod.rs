//! AssetGate logging
//!
//! A small backend for the standard `log` crate. Library code only uses the
//! `log` macros; applications install the backend once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use assetgate_core::logging::{LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::production().with_context_field("service", "assetgate");
//! assetgate_core::logging::init_logging(&config).unwrap();
//!
//! log::info!("Auth store starting");
//! ```

pub mod config;
pub mod destinations;
pub mod formatter;

pub use config::{LogLevel, LoggingConfig};
pub use destinations::{LogEntry, LogOutput};
pub use formatter::LogFormat;

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the AssetGate logger
///
/// Safe to call more than once; only the first call has an effect. Fails if
/// another logger was installed first.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = install(config);
    });
    result
}

fn install(config: &LoggingConfig) -> anyhow::Result<()> {
    let logger = AssetGateLogger { config: config.clone() };
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))?;
    log::set_max_level(config.level.to_level_filter());
    Ok(())
}

struct AssetGateLogger {
    config: LoggingConfig,
}

impl AssetGateLogger {
    fn outputs(&self) -> &[LogOutput] {
        const FALLBACK: &[LogOutput] = &[LogOutput::Stdout { format: None }];
        if self.config.outputs.is_empty() {
            FALLBACK
        } else {
            &self.config.outputs
        }
    }
}

impl log::Log for AssetGateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::from(self.config.level)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_log_record(record, &self.config);
        for output in self.outputs() {
            let line = output.format(&self.config.format).format_entry(&entry);
            let _ = match output {
                LogOutput::Stdout { .. } => writeln!(std::io::stdout().lock(), "{}", line),
                LogOutput::Stderr { .. } => writeln!(std::io::stderr().lock(), "{}", line),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_logger_respects_level() {
        let logger = AssetGateLogger { config: LoggingConfig::default().with_level(LogLevel::Warn) };

        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let debug = log::Metadata::builder().level(log::Level::Debug).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_empty_outputs_fall_back_to_stdout() {
        let config = LoggingConfig { outputs: vec![], ..LoggingConfig::default() };
        let logger = AssetGateLogger { config };
        assert_eq!(logger.outputs(), &[LogOutput::Stdout { format: None }]);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::development();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_ok());
    }
}
