//! Integer results of the exported functions.

use std::ffi::c_int;

use webview_dll_common::{Result, ShimError};

pub const VHOST_OK: c_int = 0;
pub const VHOST_FOLDER_MISSING: c_int = -1;
pub const VHOST_INVALID_ARGUMENT: c_int = -2;
pub const VHOST_FAILED: c_int = -3;

/// Result code of `SetWebViewVituralHostName`.
pub fn virtual_host_code(result: &Result<()>) -> c_int {
    match result {
        Ok(()) => VHOST_OK,
        Err(ShimError::PathNotFound(_)) => VHOST_FOLDER_MISSING,
        Err(ShimError::InvalidArgument(_)) => VHOST_INVALID_ARGUMENT,
        Err(_) => VHOST_FAILED,
    }
}

/// `1` for success, `0` otherwise.
pub fn flag<T>(result: &Result<T>) -> c_int {
    c_int::from(result.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use webview_dll_common::Handle;

    #[test]
    fn virtual_host_codes() {
        assert_eq!(virtual_host_code(&Ok(())), 0);
        assert_eq!(
            virtual_host_code(&Err(ShimError::PathNotFound(PathBuf::from("./Assets")))),
            -1
        );
        assert_eq!(
            virtual_host_code(&Err(ShimError::InvalidArgument("access kind 7".into()))),
            -2
        );
        assert_eq!(
            virtual_host_code(&Err(ShimError::UnknownHandle(Handle::from_raw(9)))),
            -3
        );
        assert_eq!(virtual_host_code(&Err(ShimError::Engine("gone".into()))), -3);
    }

    #[test]
    fn flags() {
        assert_eq!(flag(&Ok(())), 1);
        assert_eq!(flag::<()>(&Err(ShimError::Engine("x".into()))), 0);
    }
}
