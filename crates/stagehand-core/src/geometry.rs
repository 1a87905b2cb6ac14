//! Geometric primitives used by layout runs.
//!
//! - [`Point`] - A 2D coordinate on the canvas
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Coordinates follow the screen convention used by the host canvas:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     ▼
//!    +Y
//! ```

use serde::{Deserialize, Serialize};

/// A 2D point on the canvas.
///
/// # Examples
///
/// ```
/// # use stagehand_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Euclidean length of the vector from the origin to this point
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Returns true when both coordinates are finite numbers
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point on a circle of `radius` around `self` at `angle` radians.
    pub fn polar_offset(self, radius: f32, angle: f32) -> Self {
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y + radius * angle.sin(),
        }
    }
}

/// Width and height of an element or of the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// The point halfway across both dimensions, measured from the origin
    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Multiplies both dimensions by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Returns true if either dimension is zero or not a finite positive number
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds of `size` centered on `center`
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty iterator
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn max_point(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns true if the point lies inside or on the edge of the bounds
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_size_center() {
        let center = Size::new(800.0, 600.0).center();
        assert_approx_eq!(f32, center.x(), 400.0);
        assert_approx_eq!(f32, center.y(), 300.0);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(Size::new(0.0, 10.0).is_degenerate());
        assert!(Size::new(10.0, f32::NAN).is_degenerate());
        assert!(!Size::new(10.0, 10.0).is_degenerate());
    }

    #[test]
    fn test_bounds_from_center_contains_edges() {
        let bounds = Bounds::new_from_center(Point::new(400.0, 300.0), Size::new(800.0, 600.0));
        assert!(bounds.contains(Point::new(0.0, 0.0)));
        assert!(bounds.contains(Point::new(800.0, 600.0)));
        assert!(!bounds.contains(Point::new(800.1, 10.0)));
    }

    #[test]
    fn test_enclosing_empty_is_none() {
        assert!(Bounds::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_enclosing_points() {
        let bounds = Bounds::enclosing([
            Point::new(-5.0, 2.0),
            Point::new(10.0, -3.0),
            Point::new(1.0, 7.0),
        ])
        .unwrap();

        assert_eq!(bounds.min_point(), Point::new(-5.0, -3.0));
        assert_eq!(bounds.max_point(), Point::new(10.0, 7.0));
        assert_approx_eq!(f32, bounds.width(), 15.0);
        assert_approx_eq!(f32, bounds.height(), 10.0);
    }

    #[test]
    fn test_polar_offset() {
        let p = Point::new(1.0, 1.0).polar_offset(2.0, std::f32::consts::FRAC_PI_2);
        assert_approx_eq!(f32, p.x(), 1.0, epsilon = 1e-5);
        assert_approx_eq!(f32, p.y(), 3.0, epsilon = 1e-5);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Every input point lies inside the enclosing bounds.
    fn check_enclosing_contains_all(points: Vec<Point>) -> Result<(), TestCaseError> {
        let bounds = Bounds::enclosing(points.iter().copied()).unwrap();
        for p in points {
            prop_assert!(bounds.contains(p));
        }
        Ok(())
    }

    /// Adding then subtracting the same offset returns the original point.
    fn check_add_sub_inverse(p: Point, offset: Point) -> Result<(), TestCaseError> {
        let back = p.add_point(offset).sub_point(offset);
        prop_assert!(approx_eq!(f32, back.x(), p.x(), epsilon = 1e-3));
        prop_assert!(approx_eq!(f32, back.y(), p.y(), epsilon = 1e-3));
        Ok(())
    }

    proptest! {
        #[test]
        fn enclosing_contains_all(points in prop::collection::vec(point_strategy(), 1..32)) {
            check_enclosing_contains_all(points)?;
        }

        #[test]
        fn add_sub_inverse(p in point_strategy(), offset in point_strategy()) {
            check_add_sub_inverse(p, offset)?;
        }
    }
}
