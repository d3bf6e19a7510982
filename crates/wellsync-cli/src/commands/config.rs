//! Configuration commands.

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &CliConfig) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", CliConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &CliConfig) -> CliResult<()> {
    config.engine_config().map_err(CliError::Config)?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        google
            .to_provider_config()
            .map_err(|e| CliError::Config(format!("invalid Google settings: {}", e)))?;
        println!("Google settings are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(config: &CliConfig) -> CliResult<()> {
    println!("config: {}", CliConfig::default_path().display());
    println!("calendars: {}", config.local_root().display());
    println!("settings: {}", config.settings_path().display());
    Ok(())
}
