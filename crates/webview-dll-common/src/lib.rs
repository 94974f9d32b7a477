pub mod errors;
pub mod handle;
pub mod types;
pub mod version;

pub use errors::{ConfigError, ShimError};
pub use handle::{Handle, HANDLE_ERROR};
pub use types::{AccessKind, SizeHint};
pub use version::{EngineVersion, VersionInfo};

pub type Result<T> = std::result::Result<T, ShimError>;
