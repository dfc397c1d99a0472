//! Basic geometry in flow coordinates.
//!
//! All values are `f64` pixels. The y axis points down.

use serde::{Deserialize, Serialize};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`.
    #[inline]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A width and a height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check if the size has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    /// Rectangle spanning two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Whether the point lies inside, edges included on the min side only.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            origin: self.origin.translate(dx, dy),
            size: self.size,
        }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Point::new(self.min_x().min(other.min_x()), self.min_y().min(other.min_y())),
            Point::new(self.max_x().max(other.max_x()), self.max_y().max(other.max_y())),
        )
    }
}

/// Padding around content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The same padding on all four sides.
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// One element of an outline path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
}

impl PathElement {
    /// The point of a move or line, `None` for a close.
    pub fn point(&self) -> Option<Point> {
        match self {
            PathElement::MoveTo(p) | PathElement::LineTo(p) => Some(*p),
            PathElement::ClosePath => None,
        }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        match self {
            PathElement::MoveTo(p) => PathElement::MoveTo(p.translate(dx, dy)),
            PathElement::LineTo(p) => PathElement::LineTo(p.translate(dx, dy)),
            PathElement::ClosePath => PathElement::ClosePath,
        }
    }
}

/// Accumulates path elements.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    elements: Vec<PathElement>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.elements.push(PathElement::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.elements.push(PathElement::LineTo(Point::new(x, y)));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.elements.push(PathElement::ClosePath);
        self
    }

    /// Closed outline of a rectangle.
    pub fn add_rect(&mut self, rect: Rect) -> &mut Self {
        self.move_to(rect.min_x(), rect.min_y())
            .line_to(rect.max_x(), rect.min_y())
            .line_to(rect.max_x(), rect.max_y())
            .line_to(rect.min_x(), rect.max_y())
            .close()
    }

    /// Append already-built elements, translated by `(dx, dy)`.
    pub fn extend_translated(&mut self, elements: &[PathElement], dx: f64, dy: f64) -> &mut Self {
        self.elements
            .extend(elements.iter().map(|e| e.translate(dx, dy)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn build(self) -> Vec<PathElement> {
        self.elements
    }
}

/// Bounding box of every point in `path`.
pub fn path_bounds(path: &[PathElement]) -> Option<Rect> {
    let mut points = path.iter().filter_map(PathElement::point);
    let first = points.next()?;
    let (mut min, mut max) = (first, first);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some(Rect::from_corners(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.max_x(), 40.0);
        assert_eq!(r.max_y(), 60.0);
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(!r.contains(Point::new(40.0, 20.0)));
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn test_insets() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(insets.horizontal(), 6.0);
        assert_eq!(insets.vertical(), 4.0);
        assert_eq!(Insets::uniform(2.5).left, 2.5);
    }

    #[test]
    fn test_path_builder_rect_and_bounds() {
        let mut builder = PathBuilder::new();
        builder.add_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        let path = builder.build();
        assert_eq!(path.len(), 5);
        assert_eq!(path[4], PathElement::ClosePath);
        assert_eq!(path_bounds(&path), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(path_bounds(&[]), None);
    }
}
