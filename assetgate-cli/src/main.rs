//! AssetGate CLI: role checks, configuration and session simulation.
//!
//! ```bash
//! assetgate check employee admin
//! assetgate config --file assetgate.toml
//! assetgate simulate fixtures/sign-in.toml
//! ```
//!
//! See `assetgate --help` for all available commands and options.

mod commands;

use assetgate_core::config::{AssetGateConfig, CONFIG_FILE};
use assetgate_core::logging::{init_logging, LogLevel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assetgate", about = "AssetGate access-control tool", version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log store activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a held role grants a required role
    Check {
        /// Held role, or "-" for none
        held: String,

        /// Required role
        required: String,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Read this file instead of --config
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Run the auth store against a fixture and report what happened
    Simulate {
        /// Fixture file (TOML)
        fixture: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { held, required } => commands::check::run(&held, &required, &cli.config),
        Commands::Config { file } => commands::config::run(file.as_deref().unwrap_or(&cli.config)),
        Commands::Simulate { fixture } => match load_config(&cli.config, cli.verbose) {
            Ok(config) => commands::simulate::run(&fixture, &config).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(outcome) => {
            print!("{}", outcome.output);
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: &std::path::Path, verbose: bool) -> Result<AssetGateConfig, String> {
    let config = AssetGateConfig::load_from(path).map_err(|e| format!("{:#}", e))?;
    config.validate().map_err(|e| format!("{:#}", e))?;

    let mut logging = config.logging.to_logging_config().map_err(|e| format!("{:#}", e))?;
    if verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    init_logging(&logging).map_err(|e| format!("{:#}", e))?;

    Ok(config)
}
