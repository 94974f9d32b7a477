//! Library version descriptor and its fixed-layout C mirror.

use std::ffi::{c_char, c_uint};

use serde::{Deserialize, Serialize};

pub const VERSION_NUMBER_CAPACITY: usize = 32;
pub const PRE_RELEASE_CAPACITY: usize = 48;
pub const BUILD_METADATA_CAPACITY: usize = 48;

/// Version reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// SemVer `MAJOR.MINOR.PATCH`.
    pub version_number: String,
    /// Pre-release label prefixed with `-`, or empty.
    pub pre_release: String,
    /// Build metadata prefixed with `+`, or empty.
    pub build_metadata: String,
}

impl EngineVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            version_number: format!("{major}.{minor}.{patch}"),
            pre_release: String::new(),
            build_metadata: String::new(),
        }
    }

    pub fn with_pre_release(mut self, label: &str) -> Self {
        self.pre_release = prefixed('-', label);
        self
    }

    pub fn with_build_metadata(mut self, meta: &str) -> Self {
        self.build_metadata = prefixed('+', meta);
        self
    }
}

fn prefixed(prefix: char, value: &str) -> String {
    if value.is_empty() || value.starts_with(prefix) {
        value.to_string()
    } else {
        format!("{prefix}{value}")
    }
}

/// C-layout copy of an [`EngineVersion`], filled into caller storage.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct VersionInfo {
    pub major: c_uint,
    pub minor: c_uint,
    pub patch: c_uint,
    pub version_number: [c_char; VERSION_NUMBER_CAPACITY],
    pub pre_release: [c_char; PRE_RELEASE_CAPACITY],
    pub build_metadata: [c_char; BUILD_METADATA_CAPACITY],
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 0,
            patch: 0,
            version_number: [0; VERSION_NUMBER_CAPACITY],
            pre_release: [0; PRE_RELEASE_CAPACITY],
            build_metadata: [0; BUILD_METADATA_CAPACITY],
        }
    }
}

impl From<&EngineVersion> for VersionInfo {
    fn from(v: &EngineVersion) -> Self {
        let mut info = Self {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
            ..Default::default()
        };
        copy_truncated(&mut info.version_number, &v.version_number);
        copy_truncated(&mut info.pre_release, &v.pre_release);
        copy_truncated(&mut info.build_metadata, &v.build_metadata);
        info
    }
}

impl VersionInfo {
    pub fn version_number_str(&self) -> String {
        read_c_buf(&self.version_number)
    }

    pub fn pre_release_str(&self) -> String {
        read_c_buf(&self.pre_release)
    }

    pub fn build_metadata_str(&self) -> String {
        read_c_buf(&self.build_metadata)
    }
}

/// Copy `src` into `dst`, truncated to `dst.len() - 1` bytes and always
/// NUL-terminated. The tail of `dst` is zeroed.
fn copy_truncated(dst: &mut [c_char], src: &str) {
    dst.fill(0);
    let n = src.len().min(dst.len().saturating_sub(1));
    for (d, s) in dst.iter_mut().zip(&src.as_bytes()[..n]) {
        *d = *s as c_char;
    }
}

fn read_c_buf(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
