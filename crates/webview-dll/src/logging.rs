//! One-time tracing setup for the host process.

use std::sync::{Once, OnceLock};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use webview_dll_config::ShimConfig;

/// Overrides the configured filter directive when set.
pub const LOG_ENV_VAR: &str = "WEBVIEW_DLL_LOG";

const DEFAULT_DIRECTIVE: &str = "webview_dll=info";

static INIT: Once = Once::new();
static SETTINGS: OnceLock<ShimConfig> = OnceLock::new();

/// The filter directive to install: the environment first, then config.
pub fn directive(env: Option<&str>, config: &ShimConfig) -> String {
    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(config.logging.level.as_str())
        .to_string()
}

fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Load config and install a subscriber. Runs once per process; a
/// subscriber the host application already installed is left alone.
pub fn init() {
    INIT.call_once(|| {
        let (config, load_error) = match webview_dll_config::load_config() {
            Ok(config) => (config, None),
            Err(e) => (ShimConfig::default(), Some(e)),
        };

        let env = std::env::var(LOG_ENV_VAR).ok();
        let directive = directive(env.as_deref(), &config);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter(&directive))
            .try_init();

        info!(version = env!("CARGO_PKG_VERSION"), filter = %directive, "webview shim loaded");
        if let Some(e) = load_error {
            warn!("Config load failed, using defaults: {e}");
        }
        debug!(config = %webview_dll_config::config_to_json(&config), "effective config");
        let _ = SETTINGS.set(config);
    });
}

/// Process-wide configuration, loaded on first use.
pub fn settings() -> ShimConfig {
    init();
    SETTINGS.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directive_wins() {
        let config = ShimConfig::default();
        assert_eq!(directive(Some("webview_dll=trace"), &config), "webview_dll=trace");
    }

    #[test]
    fn blank_env_falls_back_to_config() {
        let mut config = ShimConfig::default();
        config.logging.level = "webview_dll_core=debug".into();
        assert_eq!(directive(Some("  "), &config), "webview_dll_core=debug");
        assert_eq!(directive(None, &config), "webview_dll_core=debug");
    }

    #[test]
    fn bad_directive_still_builds_a_filter() {
        let _ = filter("not a [valid directive");
    }

    #[test]
    fn settings_are_stable() {
        assert_eq!(settings(), settings());
    }
}
