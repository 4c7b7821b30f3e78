#![forbid(unsafe_code)]

//! Geometric primitives.

/// An integer rectangle handed to graphics APIs (scissor regions, viewports).
///
/// Origin at top-left; `x`/`y` may be negative when content is scrolled or
/// positioned off-screen, extents never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Convert floating-point layout output into a pixel rectangle.
    ///
    /// Every component is floored. Negative or NaN extents become zero and
    /// coordinates saturate at the `i32` range.
    pub fn from_f32(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            width: width.floor().max(0.0) as u32,
            height: height.floor().max(0.0) as u32,
        }
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_floors_components() {
        let r = Rect::from_f32(10.9, -0.5, 199.99, 50.0);
        assert_eq!(r, Rect::new(10, -1, 199, 50));
    }

    #[test]
    fn from_f32_clamps_negative_extent() {
        let r = Rect::from_f32(0.0, 0.0, -3.0, f32::NAN);
        assert_eq!(r.width, 0);
        assert_eq!(r.height, 0);
        assert!(r.is_empty());
    }
}
