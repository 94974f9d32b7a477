//! Callback abstractions handed across the shim.
//!
//! Each is a single `invoke` capability so that foreign function pointers
//! (with their context argument) and Rust closures are stored the same way.

use webview_dll_common::Handle;

/// Invoked with the handle it was registered for (dispatch, destroy).
pub trait HandleCallback: Send + Sync {
    fn invoke(&self, handle: Handle);
}

impl<F> HandleCallback for F
where
    F: Fn(Handle) + Send + Sync,
{
    fn invoke(&self, handle: Handle) {
        self(handle)
    }
}

/// Invoked when page script calls a bound global function.
///
/// `seq` identifies the call and must be passed back to
/// `Runtime::resolve`. `request` is a JSON array of the call arguments.
pub trait BindCallback: Send + Sync {
    fn invoke(&self, seq: &str, request: &str);
}

impl<F> BindCallback for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn invoke(&self, seq: &str, request: &str) {
        self(seq, request)
    }
}
