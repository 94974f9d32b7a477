//! Native window handles crossing the C boundary.

use std::ffi::c_void;

use webview_dll_core::ParentWindow;
use wry::raw_window_handle::{
    HandleError, HasWindowHandle, RawWindowHandle, WindowHandle,
};

/// Caller-owned native window that a view is embedded into.
pub struct ParentHandle(ParentWindow);

impl ParentHandle {
    pub fn new(parent: ParentWindow) -> Self {
        Self(parent)
    }
}

impl HasWindowHandle for ParentHandle {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        let raw = raw_handle(self.0.as_ptr())?;
        // SAFETY: the caller guarantees the window outlives every view
        // embedded into it.
        Ok(unsafe { WindowHandle::borrow_raw(raw) })
    }
}

#[cfg(target_os = "windows")]
fn raw_handle(ptr: *mut c_void) -> Result<RawWindowHandle, HandleError> {
    use std::num::NonZeroIsize;
    use wry::raw_window_handle::Win32WindowHandle;

    let hwnd = NonZeroIsize::new(ptr as isize).ok_or(HandleError::Unavailable)?;
    Ok(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)))
}

#[cfg(target_os = "macos")]
fn raw_handle(ptr: *mut c_void) -> Result<RawWindowHandle, HandleError> {
    use std::ptr::NonNull;
    use wry::raw_window_handle::AppKitWindowHandle;

    let ns_view = NonNull::new(ptr).ok_or(HandleError::Unavailable)?;
    Ok(RawWindowHandle::AppKit(AppKitWindowHandle::new(ns_view)))
}

#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn raw_handle(ptr: *mut c_void) -> Result<RawWindowHandle, HandleError> {
    use wry::raw_window_handle::XlibWindowHandle;

    if ptr.is_null() {
        return Err(HandleError::Unavailable);
    }
    Ok(RawWindowHandle::Xlib(XlibWindowHandle::new(ptr as std::ffi::c_ulong)))
}

#[cfg(not(any(
    target_os = "windows",
    target_os = "macos",
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn raw_handle(_ptr: *mut c_void) -> Result<RawWindowHandle, HandleError> {
    Err(HandleError::NotSupported)
}

/// The platform pointer behind a window: `HWND`, `NSView*`, X11 window id
/// or Wayland surface. Null when the handle is unavailable.
pub fn native_pointer(window: &impl HasWindowHandle) -> *mut c_void {
    let Ok(handle) = window.window_handle() else {
        return std::ptr::null_mut();
    };
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => h.hwnd.get() as *mut c_void,
        RawWindowHandle::AppKit(h) => h.ns_view.as_ptr(),
        RawWindowHandle::Xlib(h) => h.window as *mut c_void,
        RawWindowHandle::Xcb(h) => h.window.get() as usize as *mut c_void,
        RawWindowHandle::Wayland(h) => h.surface.as_ptr(),
        _ => std::ptr::null_mut(),
    }
}
