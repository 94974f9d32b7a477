use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ShimError;

/// How a requested window size constrains the user.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeHint {
    /// Width and height are the current size; the user may resize freely.
    #[default]
    None = 0,
    /// Width and height are the minimum bounds.
    Min = 1,
    /// Width and height are the maximum bounds.
    Max = 2,
    /// The window can not be resized by the user.
    Fixed = 3,
}

impl TryFrom<i32> for SizeHint {
    type Error = ShimError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Min),
            2 => Ok(Self::Max),
            3 => Ok(Self::Fixed),
            other => Err(ShimError::InvalidArgument(format!("size hint {other}"))),
        }
    }
}

/// Cross-origin policy of a virtual host mapping.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessKind {
    /// All cross-origin access is refused, sub-resources included.
    #[default]
    Deny = 0,
    /// All cross-origin access is allowed, CORS-checked requests included.
    Allow = 1,
    /// Plain sub-resource loads are allowed, CORS-checked requests are not.
    DenyCors = 2,
}

impl TryFrom<i32> for AccessKind {
    type Error = ShimError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deny),
            1 => Ok(Self::Allow),
            2 => Ok(Self::DenyCors),
            other => Err(ShimError::InvalidArgument(format!("access kind {other}"))),
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deny => "deny",
            Self::Allow => "allow",
            Self::DenyCors => "deny-cors",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_hint_from_c_values() {
        assert_eq!(SizeHint::try_from(0).unwrap(), SizeHint::None);
        assert_eq!(SizeHint::try_from(1).unwrap(), SizeHint::Min);
        assert_eq!(SizeHint::try_from(2).unwrap(), SizeHint::Max);
        assert_eq!(SizeHint::try_from(3).unwrap(), SizeHint::Fixed);
    }

    #[test]
    fn size_hint_rejects_out_of_range() {
        assert!(SizeHint::try_from(4).is_err());
        assert!(SizeHint::try_from(-1).is_err());
    }

    #[test]
    fn access_kind_from_c_values() {
        assert_eq!(AccessKind::try_from(0).unwrap(), AccessKind::Deny);
        assert_eq!(AccessKind::try_from(1).unwrap(), AccessKind::Allow);
        assert_eq!(AccessKind::try_from(2).unwrap(), AccessKind::DenyCors);
    }

    #[test]
    fn access_kind_rejects_sentinel_and_garbage() {
        // 3 is the C header's "count" marker, not a policy.
        let err = AccessKind::try_from(3).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: access kind 3");
        assert!(AccessKind::try_from(i32::MAX).is_err());
    }

    #[test]
    fn discriminants_match_c_enums() {
        assert_eq!(SizeHint::Fixed as i32, 3);
        assert_eq!(AccessKind::DenyCors as i32, 2);
    }

    #[test]
    fn access_kind_display() {
        assert_eq!(AccessKind::Allow.to_string(), "allow");
        assert_eq!(AccessKind::DenyCors.to_string(), "deny-cors");
    }
}
