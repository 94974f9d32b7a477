//! TOML config file loading.

use crate::schema::ShimConfig;
use crate::validation;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use webview_dll_common::ConfigError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WEBVIEW_DLL_CONFIG";

/// Load config from a specific TOML file path.
///
/// Missing fields take their defaults. A config that fails validation is
/// replaced by the defaults with a warning.
pub fn load_from_path(path: &Path) -> Result<ShimConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: ShimConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(ShimConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from `WEBVIEW_DLL_CONFIG`, else the platform default path.
///
/// An explicitly named file must exist. The platform file is optional.
pub fn load_default() -> Result<ShimConfig, ConfigError> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
        return load_from_path(Path::new(&explicit));
    }

    let path = default_config_path()?;
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(ShimConfig::default());
    }
    load_from_path(&path)
}

/// Get the platform-specific default config file path.
///
/// On Linux: `~/.config/webview-dll/config.toml`
/// On Windows: `%APPDATA%\webview-dll\config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("webview-dll").join("config.toml"))
}
