//! Configuration schema.

use serde::{Deserialize, Serialize};

/// Defaults applied to every newly created top-level window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial window title.
    pub title: String,
    /// Initial inner width in logical pixels (valid range: 1-16384).
    pub width: u32,
    /// Initial inner height in logical pixels (valid range: 1-16384).
    pub height: u32,
    /// Custom user agent; the engine default when absent.
    pub user_agent: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "WebView".to_string(),
            width: 640,
            height: 480,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `WEBVIEW_DLL_LOG` wins
    /// over this when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "webview_dll=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Force devtools on or off regardless of the flag passed at creation.
    pub devtools: Option<bool>,
}

impl DebugConfig {
    /// Resolve the devtools setting for one creation call.
    pub fn devtools_for(&self, requested: bool) -> bool {
        self.devtools.unwrap_or(requested)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ShimConfig {
    pub window: WindowConfig,
    pub logging: LoggingConfig,
    pub debug: DebugConfig,
}
