//! The process-wide runtime behind the exported functions.
//!
//! The runtime, its engine and every view live on the thread of the first
//! successful `CreateWebViewInstance`. Only `CheckWebViewExists`,
//! `DispatchWebView` and `TerminateWebView` are served from other threads;
//! everything else called off that thread is refused with a warning.

use std::cell::OnceCell;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use tracing::{info, warn};
use webview_dll_common::{Handle, Result, ShimError};
use webview_dll_core::{ParentWindow, RemoteHandle, Runtime};
use webview_dll_wry::WryEngine;

use crate::logging;

pub type ShimRuntime = Runtime<WryEngine>;

thread_local! {
    static RUNTIME: OnceCell<ShimRuntime> = const { OnceCell::new() };
}

static REMOTE: OnceLock<RemoteHandle> = OnceLock::new();
static LOOP_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Create a view, bringing the runtime up on first use.
pub fn create(debug: bool, parent: Option<ParentWindow>) -> Handle {
    let current = thread::current().id();
    if let Some(owner) = LOOP_THREAD.get() {
        if *owner != current {
            warn!("CreateWebViewInstance called off the loop thread, refused");
            return Handle::NONE;
        }
    }

    RUNTIME.with(|cell| {
        if cell.get().is_none() {
            let engine = match WryEngine::new() {
                Ok(engine) => engine,
                Err(e) => {
                    warn!(error = %e, "webview engine unavailable");
                    return Handle::NONE;
                }
            };
            let runtime = Runtime::new(engine, logging::settings());
            let _ = REMOTE.set(runtime.remote().clone());
            let _ = LOOP_THREAD.set(current);
            let _ = cell.set(runtime);
            info!(thread = ?current, "runtime started");
        }
        match cell.get() {
            Some(runtime) => runtime.create(debug, parent),
            None => Handle::NONE,
        }
    })
}

/// Run `f` against the runtime on the loop thread.
pub fn with_runtime<T>(f: impl FnOnce(&ShimRuntime) -> Result<T>) -> Result<T> {
    RUNTIME.with(|cell| match cell.get() {
        Some(runtime) => f(runtime),
        None if LOOP_THREAD.get().is_some() => Err(ShimError::LoopUnavailable(
            "called off the thread that owns the webviews".into(),
        )),
        None => Err(ShimError::LoopUnavailable("no webview has been created".into())),
    })
}

/// The thread-safe part of the runtime, if it is up.
pub fn remote() -> Result<&'static RemoteHandle> {
    REMOTE
        .get()
        .ok_or_else(|| ShimError::LoopUnavailable("no webview has been created".into()))
}

/// Log a failed call. Unknown handles are expected traffic and stay at
/// debug level.
pub fn report(export: &'static str, handle: Handle, error: &ShimError) {
    match error {
        ShimError::UnknownHandle(_) => tracing::debug!(export, %handle, "unknown handle"),
        other => warn!(export, %handle, error = %other, "call failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_absent_before_first_create() {
        // Each test thread starts without a runtime of its own.
        let result = with_runtime(|_| Ok(()));
        assert!(matches!(result, Err(ShimError::LoopUnavailable(_))));
    }
}
