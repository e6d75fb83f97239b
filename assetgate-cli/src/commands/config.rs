use std::path::Path;

use assetgate_core::config::AssetGateConfig;

use super::Outcome;

/// Load, validate and render the effective configuration.
pub fn run(path: &Path) -> Result<Outcome, String> {
    let config = AssetGateConfig::load_from(path).map_err(|e| format!("{:#}", e))?;
    config.validate().map_err(|e| format!("{:#}", e))?;
    let rendered = config.to_toml().map_err(|e| format!("{:#}", e))?;

    let source = if path.exists() {
        format!("# Loaded from {}\n", path.display())
    } else {
        "# No configuration file, using defaults\n".to_string()
    };
    Ok(Outcome::ok(format!("{}{}", source, rendered)))
}
