//! Engine-independent core of the webview shim.
//!
//! Provides:
//! - The `Engine` / `WebView` abstraction a native backend implements
//! - The handle registry and per-handle context records
//! - A FIFO dispatch queue drained on the loop thread
//! - The script bridge behind bind / unbind / return
//! - Virtual host mappings served from local folders
//! - `Runtime`, which ties the above into the flat operation set

pub mod bridge;
pub mod callbacks;
pub mod dispatch;
pub mod engine;
pub mod files;
pub mod registry;
pub mod runtime;
pub mod virtual_host;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::PageScripts;
pub use callbacks::{BindCallback, HandleCallback};
pub use engine::{
    Engine, LoopMessage, LoopRemote, MessageHandler, ParentWindow, RunMode, ViewOptions, WebView,
};
pub use registry::{Registry, SharedRegistry};
pub use runtime::{RemoteHandle, Runtime};
pub use virtual_host::{
    HostResponse, RequestSource, VirtualHostTable, PAGE_SCRIPTS_HOST, VIRTUAL_HOST_SCHEME,
};
