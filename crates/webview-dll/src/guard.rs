//! Panic containment and C string conversion at the ABI boundary.

use std::borrow::Cow;
use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use tracing::error;

/// Run `f`, turning a panic into `fallback`. No unwind crosses into C.
pub fn ffi_guard<T>(name: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(export = name, panic = %message, "panic contained at C boundary");
            fallback
        }
    }
}

/// Borrow a C string. `None` for null. Invalid UTF-8 is replaced.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays
/// valid for `'a`.
pub unsafe fn c_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
}

/// A C string naming a filesystem path.
///
/// # Safety
///
/// Same as [`c_str`].
pub unsafe fn c_path(ptr: *const c_char) -> Option<PathBuf> {
    // SAFETY: forwarded contract.
    unsafe { c_str(ptr) }.map(|s| PathBuf::from(s.as_ref()))
}
