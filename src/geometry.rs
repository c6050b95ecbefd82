//! Planar geometry for plate layouts. Coordinates are in millimetres with the
//! origin at a plate corner, X along the length and Y along the width.

use nalgebra::Vector2;

/// Position in the plate plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Distance along the plate length.
    pub x: f64,
    /// Distance along the plate width.
    pub y: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }
}

impl From<Vector2<f64>> for Point {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// A circular hole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Centre of the circle.
    pub center: Point,
    /// Diameter in millimetres.
    pub diameter: f64,
}

impl Circle {
    /// Create a [`Circle`].
    #[must_use]
    pub const fn new(center: Point, diameter: f64) -> Self {
        Self { center, diameter }
    }

    /// Half the diameter.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Enclosed area in square millimetres.
    #[must_use]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius().powi(2)
    }

    /// Whether the circle lies entirely inside `rect`, touching allowed.
    #[must_use]
    pub fn within(&self, rect: &Rect) -> bool {
        let r = self.radius();
        self.center.x - r >= rect.min.x
            && self.center.x + r <= rect.max.x
            && self.center.y - r >= rect.min.y
            && self.center.y + r <= rect.max.y
    }

    /// Whether the interiors of two circles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Circle) -> bool {
        self.center.distance(other.center) < self.radius() + other.radius()
    }

    /// Whether the interior of the circle overlaps the interior of `rect`.
    #[must_use]
    pub fn intersects(&self, rect: &Rect) -> bool {
        rect.distance_to(self.center) < self.radius()
    }
}

/// An axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Corner with the smallest coordinates.
    pub min: Point,
    /// Corner with the largest coordinates.
    pub max: Point,
}

impl Rect {
    /// Create a [`Rect`] from two opposite corners in any order.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Extent along X.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along Y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Enclosed area in square millimetres.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Distance from `point` to the rectangle; zero when inside.
    #[must_use]
    pub fn distance_to(&self, point: Point) -> f64 {
        let closest = Point::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        );
        point.distance(closest)
    }

    /// Whether the interiors of two rectangles overlap or the rectangles touch.
    #[must_use]
    pub fn touches(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use paramcad::point;
///
/// let corner = point(30.0, 30.0);
/// assert_eq!(corner.x, 30.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_to_vector_roundtrip() {
        let corner = Point::new(1.0, 2.0);
        let vector: Vector2<f64> = corner.into();
        assert_eq!(vector, Vector2::new(1.0, 2.0));
        assert_eq!(Point::from(vector), corner);
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(point(0.0, 0.0).distance(point(3.0, 4.0)), 5.0);
    }

    #[test]
    fn rect_normalises_corners() {
        let rect = Rect::new(point(10.0, 5.0), point(0.0, 0.0));
        assert_eq!(rect.min, point(0.0, 0.0));
        assert_relative_eq!(rect.area(), 50.0);
    }

    #[test]
    fn circle_inside_and_outside_plate() {
        let plate = Rect::new(point(0.0, 0.0), point(300.0, 200.0));
        assert!(Circle::new(point(30.0, 30.0), 18.0).within(&plate));
        assert!(Circle::new(point(9.0, 30.0), 18.0).within(&plate));
        assert!(!Circle::new(point(5.0, 30.0), 18.0).within(&plate));
    }

    #[test]
    fn circle_rect_intersection_uses_closest_point() {
        let notch = Rect::new(point(130.0, 0.0), point(170.0, 12.0));
        assert!(!Circle::new(point(150.0, 30.0), 18.0).intersects(&notch));
        assert!(Circle::new(point(150.0, 20.0), 18.0).intersects(&notch));
        assert!(!Circle::new(point(120.0, 20.0), 18.0).intersects(&notch));
    }

    #[test]
    fn circles_touching_do_not_overlap() {
        let a = Circle::new(point(0.0, 0.0), 10.0);
        assert!(!a.overlaps(&Circle::new(point(10.0, 0.0), 10.0)));
        assert!(a.overlaps(&Circle::new(point(9.0, 0.0), 10.0)));
    }
}
