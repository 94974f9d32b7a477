//! Size and bounds conversion between the C surface, winit and wry.

use webview_dll_common::SizeHint;
use winit::dpi::{LogicalSize, PhysicalSize};

// =============================================================================
// BOUNDS
// =============================================================================

/// A wry rect at the origin covering a physical client area.
pub fn fill_physical(size: PhysicalSize<u32>) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(0, 0)),
        size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(size.width, size.height)),
    }
}

/// A wry rect at the origin with a logical size.
pub fn fill_logical(width: u32, height: u32) -> wry::Rect {
    wry::Rect {
        position: wry::dpi::Position::Logical(wry::dpi::LogicalPosition::new(0.0, 0.0)),
        size: wry::dpi::Size::Logical(wry::dpi::LogicalSize::new(
            f64::from(width),
            f64::from(height),
        )),
    }
}

/// Negative sizes from the caller clamp to zero.
pub fn dimension(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

// =============================================================================
// SIZE HINTS
// =============================================================================

/// What a size hint asks of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSizing {
    /// New inner size, if the hint changes it.
    pub inner: Option<LogicalSize<f64>>,
    pub min: Option<LogicalSize<f64>>,
    pub max: Option<LogicalSize<f64>>,
    /// `Some` if the hint changes resizability.
    pub resizable: Option<bool>,
}

pub fn window_sizing(width: i32, height: i32, hint: SizeHint) -> WindowSizing {
    let size = LogicalSize::new(f64::from(dimension(width)), f64::from(dimension(height)));
    match hint {
        SizeHint::None => WindowSizing {
            inner: Some(size),
            min: None,
            max: None,
            resizable: Some(true),
        },
        SizeHint::Min => WindowSizing {
            inner: None,
            min: Some(size),
            max: None,
            resizable: None,
        },
        SizeHint::Max => WindowSizing {
            inner: None,
            min: None,
            max: Some(size),
            resizable: None,
        },
        SizeHint::Fixed => WindowSizing {
            inner: Some(size),
            min: None,
            max: None,
            resizable: Some(false),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_fill_starts_at_origin() {
        let rect = fill_physical(PhysicalSize::new(800, 600));
        match rect.position {
            wry::dpi::Position::Physical(pos) => assert_eq!((pos.x, pos.y), (0, 0)),
            _ => panic!("expected physical position"),
        }
        match rect.size {
            wry::dpi::Size::Physical(size) => assert_eq!((size.width, size.height), (800, 600)),
            _ => panic!("expected physical size"),
        }
    }

    #[test]
    fn logical_fill_uses_requested_size() {
        let rect = fill_logical(640, 480);
        match rect.size {
            wry::dpi::Size::Logical(size) => {
                assert!((size.width - 640.0).abs() < f64::EPSILON);
                assert!((size.height - 480.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected logical size"),
        }
    }

    #[test]
    fn negative_dimension_is_zero() {
        assert_eq!(dimension(-5), 0);
        assert_eq!(dimension(0), 0);
        assert_eq!(dimension(1024), 1024);
    }

    #[test]
    fn none_hint_resizes_and_unlocks() {
        let sizing = window_sizing(480, 320, SizeHint::None);
        assert_eq!(sizing.inner, Some(LogicalSize::new(480.0, 320.0)));
        assert_eq!(sizing.resizable, Some(true));
        assert!(sizing.min.is_none() && sizing.max.is_none());
    }

    #[test]
    fn fixed_hint_locks_size() {
        let sizing = window_sizing(480, 320, SizeHint::Fixed);
        assert_eq!(sizing.inner, Some(LogicalSize::new(480.0, 320.0)));
        assert_eq!(sizing.resizable, Some(false));
    }

    #[test]
    fn min_and_max_only_set_bounds() {
        let min = window_sizing(200, 100, SizeHint::Min);
        assert_eq!(min.min, Some(LogicalSize::new(200.0, 100.0)));
        assert!(min.inner.is_none() && min.resizable.is_none());

        let max = window_sizing(1920, 1080, SizeHint::Max);
        assert_eq!(max.max, Some(LogicalSize::new(1920.0, 1080.0)));
        assert!(max.inner.is_none());
    }
}
