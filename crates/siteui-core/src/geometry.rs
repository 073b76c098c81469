#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.

/// A viewport-relative rectangle, as reported by `getBoundingClientRect`.
///
/// Origin is the top-left corner of the viewport; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge, relative to the viewport top.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top edge. Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Area in square pixels. Negative extents count as empty.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point lies inside the rectangle (edges inclusive on the
    /// top-left, exclusive on the bottom-right).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with another rectangle, or `None` if they are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < x || bottom < y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Fraction of this rectangle's area that lies inside `viewport`.
    ///
    /// Follows the IntersectionObserver definition: intersection area divided
    /// by target area. A zero-area target that touches the viewport counts as
    /// fully visible. The result is always in `[0.0, 1.0]`.
    pub fn visible_fraction(&self, viewport: &Rect) -> f64 {
        let Some(overlap) = self.intersection(viewport) else {
            return 0.0;
        };
        let area = self.area();
        if area <= 0.0 {
            return 1.0;
        }
        (overlap.area() / area).clamp(0.0, 1.0)
    }
}
