//! Configuration for the webview shim.
//!
//! An optional TOML file supplies window defaults, the logging directive
//! and a devtools override. Every field has a default, so an absent or
//! partial file works.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{DebugConfig, LoggingConfig, ShimConfig, WindowConfig};
pub use toml_loader::{default_config_path, load_from_path, CONFIG_ENV_VAR};

use webview_dll_common::ConfigError;

/// Load config from `WEBVIEW_DLL_CONFIG` or the platform default path.
///
/// A missing file yields the defaults; a library never creates one.
pub fn load_config() -> Result<ShimConfig, ConfigError> {
    toml_loader::load_default()
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ShimConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
