use std::path::PathBuf;

use crate::handle::Handle;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    #[error("unknown webview handle: {0}")]
    UnknownHandle(Handle),

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("event loop unavailable: {0}")]
    LoopUnavailable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
