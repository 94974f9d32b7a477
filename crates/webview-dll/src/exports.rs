//! The exported C functions.
//!
//! Every function is panic-safe and tolerates null pointers and unknown
//! handles: those become no-ops or the neutral return value, with a log
//! line explaining why.

#![allow(non_snake_case)]

use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_void};
use std::sync::Arc;

use webview_dll_common::{
    AccessKind, Handle, Result, ShimError, SizeHint, VersionInfo, HANDLE_ERROR,
};
use webview_dll_core::{ParentWindow, RunMode};

use crate::callbacks::{BindFn, DestroyFn, DispatchFn, ForeignBinding, ForeignDestroy, ForeignDispatch};
use crate::codes;
use crate::guard::{c_path, c_str, ffi_guard};
use crate::host::{self, ShimRuntime};
use crate::logging;

/// Run `f` against the runtime, logging any failure.
fn call<T>(
    export: &'static str,
    handle: u64,
    f: impl FnOnce(&ShimRuntime, Handle) -> Result<T>,
) -> Result<T> {
    logging::init();
    let handle = Handle::from_raw(handle);
    let result = host::with_runtime(|rt| f(rt, handle));
    if let Err(e) = &result {
        host::report(export, handle, e);
    }
    result
}

/// Like [`call`] but served from any thread.
fn call_remote<T>(
    export: &'static str,
    handle: u64,
    f: impl FnOnce(&webview_dll_core::RemoteHandle, Handle) -> Result<T>,
) -> Result<T> {
    logging::init();
    let handle = Handle::from_raw(handle);
    let result = host::remote().and_then(|remote| f(remote, handle));
    if let Err(e) = &result {
        host::report(export, handle, e);
    }
    result
}

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn required<'a>(ptr: *const c_char, what: &str) -> Result<Cow<'a, str>> {
    // SAFETY: forwarded contract.
    unsafe { c_str(ptr) }.ok_or_else(|| ShimError::InvalidArgument(format!("{what} is null")))
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create a webview. `wnd` null opens a new top-level window, otherwise the
/// view is embedded into that native window. Returns `HANDLE_ERROR` on
/// failure.
///
/// # Safety
///
/// `wnd` must be null or a live native window (`HWND`, `NSView*` or X11
/// window id) that outlives the instance.
#[no_mangle]
pub unsafe extern "C" fn CreateWebViewInstance(debug: c_int, wnd: *mut c_void) -> u64 {
    ffi_guard("CreateWebViewInstance", HANDLE_ERROR, || {
        logging::init();
        host::create(debug != 0, ParentWindow::from_ptr(wnd)).as_raw()
    })
}

#[no_mangle]
pub extern "C" fn DestroyWebView(handle: u64) {
    ffi_guard("DestroyWebView", (), || {
        let _ = call("DestroyWebView", handle, |rt, h| {
            rt.destroy(h);
            Ok(())
        });
    })
}

/// `1` if the handle names a live instance, otherwise `0`. Any thread.
#[no_mangle]
pub extern "C" fn CheckWebViewExists(handle: u64) -> c_int {
    ffi_guard("CheckWebViewExists", 0, || {
        let handle = Handle::from_raw(handle);
        match host::remote() {
            Ok(remote) => c_int::from(remote.exists(handle)),
            Err(_) => 0,
        }
    })
}

/// Run the event loop until terminated or the window closes.
#[no_mangle]
pub extern "C" fn RunWebView(handle: u64) {
    ffi_guard("RunWebView", (), || {
        let _ = call("RunWebView", handle, |rt, h| rt.run(h, RunMode::Blocking));
    })
}

/// Like `RunWebView`, pumping pending messages in a loop.
#[no_mangle]
pub extern "C" fn RunWebView1(handle: u64) {
    ffi_guard("RunWebView1", (), || {
        let _ = call("RunWebView1", handle, |rt, h| rt.run(h, RunMode::Pump));
    })
}

/// Register `func` to run once when the instance is destroyed. Any thread.
///
/// # Safety
///
/// `func` must be null or a function that is safe to call with the handle
/// until the instance is destroyed.
#[no_mangle]
pub unsafe extern "C" fn SetWebViewOnDestroy(handle: u64, func: Option<DestroyFn>) {
    ffi_guard("SetWebViewOnDestroy", (), || {
        let _ = call_remote("SetWebViewOnDestroy", handle, |remote, h| {
            let func = func.ok_or_else(|| ShimError::InvalidArgument("callback is null".into()))?;
            remote.set_destroy_callback(h, Arc::new(ForeignDestroy::new(func)))
        });
    })
}

/// Stop the running loop. Any thread.
#[no_mangle]
pub extern "C" fn TerminateWebView(handle: u64) {
    ffi_guard("TerminateWebView", (), || {
        let _ = call_remote("TerminateWebView", handle, |remote, h| remote.terminate(h));
    })
}

/// Queue `func(handle, arg)` to run on the loop thread. Any thread.
///
/// # Safety
///
/// `func` must be null or a function that is safe to call with `arg` on
/// the loop thread.
#[no_mangle]
pub unsafe extern "C" fn DispatchWebView(handle: u64, func: Option<DispatchFn>, arg: *mut c_void) {
    ffi_guard("DispatchWebView", (), || {
        let _ = call_remote("DispatchWebView", handle, |remote, h| {
            let func = func.ok_or_else(|| ShimError::InvalidArgument("callback is null".into()))?;
            remote.dispatch(h, Arc::new(ForeignDispatch::new(func, arg)))
        });
    })
}

// -----------------------------------------------------------------------------
// Window and content
// -----------------------------------------------------------------------------

/// Native window of the instance, or null.
#[no_mangle]
pub extern "C" fn GetWebViewWindow(handle: u64) -> *mut c_void {
    ffi_guard("GetWebViewWindow", std::ptr::null_mut(), || {
        call("GetWebViewWindow", handle, |rt, h| rt.window(h)).unwrap_or(std::ptr::null_mut())
    })
}

/// # Safety
///
/// `title` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn SetWebViewTitle(handle: u64, title: *const c_char) {
    ffi_guard("SetWebViewTitle", (), || {
        let _ = call("SetWebViewTitle", handle, |rt, h| {
            // SAFETY: caller contract.
            let title = unsafe { required(title, "title") }?;
            rt.set_title(h, &title)
        });
    })
}

#[no_mangle]
pub extern "C" fn SetWebViewSize(handle: u64, width: c_int, height: c_int, hints: c_int) {
    ffi_guard("SetWebViewSize", (), || {
        let _ = call("SetWebViewSize", handle, |rt, h| {
            rt.set_size(h, width, height, SizeHint::try_from(hints)?)
        });
    })
}

/// # Safety
///
/// `url` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn NavigateWebView(handle: u64, url: *const c_char) {
    ffi_guard("NavigateWebView", (), || {
        let _ = call("NavigateWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let url = unsafe { required(url, "url") }?;
            rt.navigate(h, &url)
        });
    })
}

/// # Safety
///
/// `html` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn SetWebViewHTML(handle: u64, html: *const c_char) {
    ffi_guard("SetWebViewHTML", (), || {
        let _ = call("SetWebViewHTML", handle, |rt, h| {
            // SAFETY: caller contract.
            let html = unsafe { required(html, "html") }?;
            rt.set_html(h, &html)
        });
    })
}

/// Load `html_file` as the page content. `1` on success, `0` if the file
/// is missing or unreadable, or the call fails.
///
/// # Safety
///
/// `html_file` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn SetWebViewHTMLFromFile(handle: u64, html_file: *const c_char) -> c_int {
    ffi_guard("SetWebViewHTMLFromFile", 0, || {
        codes::flag(&call("SetWebViewHTMLFromFile", handle, |rt, h| {
            // SAFETY: caller contract.
            let path = unsafe { c_path(html_file) }
                .ok_or_else(|| ShimError::InvalidArgument("path is null".into()))?;
            rt.set_html_from_file(h, &path)
        }))
    })
}

// -----------------------------------------------------------------------------
// Scripts and bindings
// -----------------------------------------------------------------------------

/// # Safety
///
/// `js` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn InitWebView(handle: u64, js: *const c_char) {
    ffi_guard("InitWebView", (), || {
        let _ = call("InitWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let js = unsafe { required(js, "script") }?;
            rt.init(h, &js)
        });
    })
}

/// # Safety
///
/// `js` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn EvalWebView(handle: u64, js: *const c_char) {
    ffi_guard("EvalWebView", (), || {
        let _ = call("EvalWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let js = unsafe { required(js, "script") }?;
            rt.eval(h, &js)
        });
    })
}

/// Expose `name` to page script. Calls arrive as `func(seq, request, arg)`
/// with `request` a JSON array of the arguments.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string. `func` must be
/// null or a function that is safe to call with `arg` on the loop thread
/// until the name is unbound or the instance destroyed.
#[no_mangle]
pub unsafe extern "C" fn BindWebView(
    handle: u64,
    name: *const c_char,
    func: Option<BindFn>,
    arg: *mut c_void,
) {
    ffi_guard("BindWebView", (), || {
        let _ = call("BindWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let name = unsafe { required(name, "name") }?;
            let func = func.ok_or_else(|| ShimError::InvalidArgument("callback is null".into()))?;
            rt.bind(h, &name, Arc::new(ForeignBinding::new(func, arg)))
        });
    })
}

/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn UnBindWebView(handle: u64, name: *const c_char) {
    ffi_guard("UnBindWebView", (), || {
        let _ = call("UnBindWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let name = unsafe { required(name, "name") }?;
            rt.unbind(h, &name)
        });
    })
}

/// Settle bound call `seq`: `status` 0 resolves with `result`, anything
/// else rejects with it.
///
/// # Safety
///
/// `seq` and `result` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn ReturnWebView(handle: u64, seq: *const c_char, status: c_int, result: *const c_char) {
    ffi_guard("ReturnWebView", (), || {
        let _ = call("ReturnWebView", handle, |rt, h| {
            // SAFETY: caller contract.
            let seq = unsafe { required(seq, "seq") }?;
            // SAFETY: caller contract.
            let result = unsafe { c_str(result) }.unwrap_or(Cow::Borrowed("null"));
            rt.resolve(h, &seq, status, &result)
        });
    })
}

// -----------------------------------------------------------------------------
// Virtual hosts and version
// -----------------------------------------------------------------------------

/// Serve `url`'s host from `folder`. Returns `0` on success, `-1` if the
/// folder does not exist, `-2` for a bad argument and `-3` for any other
/// failure.
///
/// # Safety
///
/// `url` and `folder` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn SetWebViewVituralHostName(
    handle: u64,
    url: *const c_char,
    folder: *const c_char,
    option: c_int,
) -> c_int {
    ffi_guard("SetWebViewVituralHostName", codes::VHOST_FAILED, || {
        logging::init();
        let args = (|| -> Result<_> {
            let access = AccessKind::try_from(option)?;
            // SAFETY: caller contract.
            let url = unsafe { required(url, "url") }?.into_owned();
            // SAFETY: caller contract.
            let folder = unsafe { c_path(folder) }
                .ok_or_else(|| ShimError::InvalidArgument("folder is null".into()))?;
            Ok((url, folder, access))
        })();
        let result = match args {
            Ok((url, folder, access)) => call("SetWebViewVituralHostName", handle, |rt, h| {
                rt.set_virtual_host_mapping(h, &url, &folder, access)
            }),
            Err(e) => {
                host::report("SetWebViewVituralHostName", Handle::from_raw(handle), &e);
                Err(e)
            }
        };
        codes::virtual_host_code(&result)
    })
}

/// Fill `out_info` with the engine version. Null is ignored.
///
/// # Safety
///
/// `out_info` must be null or point to writable `WebViewVersionInfo`
/// storage.
#[no_mangle]
pub unsafe extern "C" fn GetWebViewVersionInfo(out_info: *mut VersionInfo) {
    ffi_guard("GetWebViewVersionInfo", (), || {
        if out_info.is_null() {
            return;
        }
        let info = VersionInfo::from(&ShimRuntime::version());
        // SAFETY: non-null and writable per the caller's contract.
        unsafe { out_info.write(info) };
    })
}
