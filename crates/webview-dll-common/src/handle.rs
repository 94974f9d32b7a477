use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw value returned across the C ABI when no instance could be created.
pub const HANDLE_ERROR: u64 = 0;

/// Opaque identifier of one webview instance.
///
/// Handles are allocated by the registry from a counter and are never
/// reused, so a stale handle can not address a newer instance.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// The "no handle" sentinel.
    pub const NONE: Handle = Handle(HANDLE_ERROR);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == HANDLE_ERROR
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_zero() {
        assert_eq!(Handle::NONE.as_raw(), 0);
        assert!(Handle::NONE.is_none());
        assert_eq!(Handle::default(), Handle::NONE);
    }

    #[test]
    fn raw_round_trip() {
        let h = Handle::from_raw(0xdead_beef);
        assert_eq!(h.as_raw(), 0xdead_beef);
        assert!(!h.is_none());
    }

    #[test]
    fn display_is_raw_value() {
        assert_eq!(Handle::from_raw(17).to_string(), "17");
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Handle::from_raw(5)).unwrap();
        assert_eq!(json, "5");
    }
}
