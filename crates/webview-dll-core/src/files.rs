//! Filesystem helpers behind the file-backed operations.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use webview_dll_common::{Result, ShimError};

/// Read an HTML file into memory, unchanged.
///
/// The path is resolved against the current directory first. Bytes that
/// are not valid UTF-8 are replaced (with a warning); everything else is
/// passed through byte for byte.
pub fn read_html_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ShimError::PathNotFound(path.to_path_buf()));
    }
    let absolute = std::path::absolute(path)?;
    let bytes = std::fs::read(&absolute)?;
    debug!(path = %absolute.display(), len = bytes.len(), "html file read");

    match String::from_utf8(bytes) {
        Ok(html) => Ok(html),
        Err(e) => {
            warn!(path = %absolute.display(), "html file is not valid UTF-8, replacing bad bytes");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Resolve an existing folder to an absolute path.
pub fn resolve_folder(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(ShimError::PathNotFound(path.to_path_buf()));
    }
    Ok(std::path::absolute(path)?)
}
