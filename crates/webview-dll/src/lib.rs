//! C ABI over a native webview.
//!
//! Instances are named by opaque 64-bit handles (`0` is never a valid
//! handle). The first successful `CreateWebViewInstance` fixes the thread
//! that owns the event loop and every view; see `include/webview_dll.h`
//! for the exported surface.

mod callbacks;
mod codes;
mod exports;
mod guard;
mod host;
mod logging;

pub use callbacks::{BindFn, DestroyFn, DispatchFn};
pub use codes::{VHOST_FAILED, VHOST_FOLDER_MISSING, VHOST_INVALID_ARGUMENT, VHOST_OK};
pub use exports::*;
pub use logging::LOG_ENV_VAR;
pub use webview_dll_common::{AccessKind, SizeHint, VersionInfo, HANDLE_ERROR};
