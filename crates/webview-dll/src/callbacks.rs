//! C function pointers adapted to the core callback traits.

use std::ffi::{c_char, c_void, CString};

use tracing::warn;
use webview_dll_common::Handle;
use webview_dll_core::{BindCallback, HandleCallback};

pub type DispatchFn = unsafe extern "C" fn(handle: u64, arg: *mut c_void);
pub type BindFn = unsafe extern "C" fn(seq: *const c_char, request: *const c_char, arg: *mut c_void);
pub type DestroyFn = unsafe extern "C" fn(handle: u64);

/// `fn(handle, arg)` queued by `DispatchWebView`.
pub struct ForeignDispatch {
    func: DispatchFn,
    arg: *mut c_void,
}

// SAFETY: the pointer is never dereferenced here; it is handed back to the
// caller's own function on the loop thread, as the C contract requires.
unsafe impl Send for ForeignDispatch {}
unsafe impl Sync for ForeignDispatch {}

impl ForeignDispatch {
    pub fn new(func: DispatchFn, arg: *mut c_void) -> Self {
        Self { func, arg }
    }
}

impl HandleCallback for ForeignDispatch {
    fn invoke(&self, handle: Handle) {
        // SAFETY: the caller supplied a valid function for this argument.
        unsafe { (self.func)(handle.as_raw(), self.arg) }
    }
}

/// `fn(handle)` registered by `SetWebViewOnDestroy`.
pub struct ForeignDestroy {
    func: DestroyFn,
}

impl ForeignDestroy {
    pub fn new(func: DestroyFn) -> Self {
        Self { func }
    }
}

impl HandleCallback for ForeignDestroy {
    fn invoke(&self, handle: Handle) {
        // SAFETY: the caller supplied a valid function.
        unsafe { (self.func)(handle.as_raw()) }
    }
}

/// `fn(seq, request, arg)` registered by `BindWebView`.
pub struct ForeignBinding {
    func: BindFn,
    arg: *mut c_void,
}

// SAFETY: see `ForeignDispatch`.
unsafe impl Send for ForeignBinding {}
unsafe impl Sync for ForeignBinding {}

impl ForeignBinding {
    pub fn new(func: BindFn, arg: *mut c_void) -> Self {
        Self { func, arg }
    }
}

impl BindCallback for ForeignBinding {
    fn invoke(&self, seq: &str, request: &str) {
        let (Ok(seq), Ok(request)) = (CString::new(seq), CString::new(request)) else {
            warn!("bound call dropped: NUL byte in call id or arguments");
            return;
        };
        // SAFETY: both strings outlive the call; the caller supplied a
        // valid function for this argument.
        unsafe { (self.func)(seq.as_ptr(), request.as_ptr(), self.arg) }
    }
}
