//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KilnConfig;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates `kiln.toml` from a project directory.
///
/// A missing file is not an error: the default configuration is returned.
pub fn load_config(project_dir: &Path) -> Result<KilnConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(KilnConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` document from a string.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks values serde cannot: non-empty distinct port names and positive limits.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    let elab = &config.elaborate;
    if elab.clock_port.is_empty() {
        return Err(invalid("elaborate.clock_port", "must not be empty"));
    }
    if elab.reset_port.is_empty() {
        return Err(invalid("elaborate.reset_port", "must not be empty"));
    }
    if elab.clock_port == elab.reset_port {
        return Err(invalid(
            "elaborate.reset_port",
            "must differ from elaborate.clock_port",
        ));
    }
    if elab.max_depth == 0 {
        return Err(invalid("elaborate.max_depth", "must be greater than zero"));
    }
    if elab.hook_drain_limit == 0 {
        return Err(invalid(
            "elaborate.hook_drain_limit",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
