use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Width and height of a drawable surface or frame, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Same size with the axes swapped (portrait <-> landscape).
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle, y axis pointing down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle of `size` centered on `center`.
    pub fn from_center(center: Point2<f32>, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(center.x - hw, center.y - hh, center.x + hw, center.y + hh)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Inclusive containment test; edges count as inside.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Scale each coordinate independently.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(
            self.left * sx,
            self.top * sy,
            self.right * sx,
            self.bottom * sy,
        )
    }

    /// Grow (or shrink, for negative `d`) every edge by `d`.
    pub fn inflated(&self, d: f32) -> Self {
        Self::new(self.left - d, self.top - d, self.right + d, self.bottom + d)
    }

    /// Scale width and height around the center.
    pub fn scaled_about_center(&self, s: f32) -> Self {
        Self::from_center(self.center(), self.width() * s, self.height() * s)
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width().abs() + self.height().abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_and_extent() {
        let r = Rect::new(100.0, 650.0, 900.0, 1350.0);
        assert_relative_eq!(r.width(), 800.0);
        assert_relative_eq!(r.height(), 700.0);
        assert_eq!(r.center(), Point2::new(500.0, 1000.0));
    }

    #[test]
    fn contains_is_inclusive_on_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point2::new(0.0, 10.0)));
        assert!(r.contains(Point2::new(5.0, 5.0)));
        assert!(!r.contains(Point2::new(10.01, 5.0)));
        assert!(!r.contains(Point2::new(5.0, -0.01)));
    }

    #[test]
    fn scaled_about_center_keeps_center() {
        let r = Rect::new(10.0, 20.0, 30.0, 60.0);
        let s = r.scaled_about_center(1.5);
        assert_eq!(s.center(), r.center());
        assert_relative_eq!(s.width(), 30.0);
        assert_relative_eq!(s.height(), 60.0);
    }

    #[test]
    fn rect_serializes_with_named_edges() {
        let json = serde_json::to_string(&Rect::new(1.0, 2.0, 3.0, 4.0)).expect("json");
        assert_eq!(json, r#"{"left":1.0,"top":2.0,"right":3.0,"bottom":4.0}"#);
    }
}
