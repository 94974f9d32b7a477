//! The seam between the shim and a native webview implementation.

use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use webview_dll_common::{AccessKind, EngineVersion, Result, SizeHint};

use crate::bridge::PageScripts;

/// A native window supplied by the caller to embed a view into.
///
/// Depending on the platform this is an `HWND`, an `NSView*` or an X11
/// window id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentWindow(NonNull<c_void>);

impl ParentWindow {
    /// `None` for a null pointer, which requests a new top-level window.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Everything an engine needs to build one view.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Enable developer tools where the platform supports them.
    pub debug: bool,
    /// Embed into this window instead of opening a top-level one.
    pub parent: Option<ParentWindow>,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub user_agent: Option<String>,
    /// Script that must run before any page script on every navigation.
    pub bootstrap_script: String,
    /// Served to every new document right after the bootstrap. Changes
    /// apply from the next navigation on.
    pub page_scripts: PageScripts,
}

/// Receives each raw message posted by page script. A returned script is
/// evaluated in the same view.
pub type MessageHandler = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Requests delivered to the event loop from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMessage {
    /// Dispatch jobs are queued.
    Wake,
    /// Leave the running loop.
    Terminate,
}

/// How the loop waits for native messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Block in the platform's own message loop.
    Blocking,
    /// Repeatedly peek and pump pending messages.
    Pump,
}

/// Thread-safe sender into the engine's event loop.
pub trait LoopRemote: Send + Sync {
    fn send(&self, message: LoopMessage) -> Result<()>;
}

/// One native webview instance. Dropping it closes the view and its window.
pub trait WebView {
    /// Native window reference (`HWND`, `NSView*`, X11 window id, ...).
    fn window(&self) -> *mut c_void;
    fn set_title(&self, title: &str) -> Result<()>;
    fn set_size(&self, width: i32, height: i32, hint: SizeHint) -> Result<()>;
    fn navigate(&self, url: &str) -> Result<()>;
    fn set_html(&self, html: &str) -> Result<()>;
    /// Evaluate a script in the current page, result discarded.
    fn eval(&self, js: &str) -> Result<()>;
    /// Serve `host` from `folder` (already absolute and existing).
    fn map_virtual_host(&self, host: &str, folder: &Path, access: AccessKind) -> Result<()>;
}

/// A native webview backend. Confined to the thread that created it.
pub trait Engine {
    type View: WebView;

    fn create_view(&self, options: &ViewOptions, on_message: MessageHandler)
        -> Result<Self::View>;

    /// Run the event loop until `LoopMessage::Terminate` or until a
    /// top-level window is closed. `on_wake` runs on every `Wake`.
    fn run(&self, mode: RunMode, on_wake: &dyn Fn()) -> Result<()>;

    fn remote(&self) -> Arc<dyn LoopRemote>;

    /// Static version descriptor of the backend.
    fn version() -> EngineVersion;
}
