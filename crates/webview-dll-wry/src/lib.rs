//! `wry` + `winit` backend for the webview shim.
//!
//! Top-level views get their own winit window with a child webview
//! covering the client area. Embedded views are built as children of the
//! caller's native window.

mod engine;
mod event_loop;
mod geometry;
mod parent;
mod protocol;
mod view;

pub use engine::WryEngine;
pub use event_loop::ProxyRemote;
pub use view::WryView;
