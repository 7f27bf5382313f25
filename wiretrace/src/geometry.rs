//! Pixel-space geometry shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate (x grows right, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance(self, other)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Calculate distance between two points
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    let dx = f64::from(p1.x - p2.x);
    let dy = f64::from(p1.y - p2.y);
    (dx * dx + dy * dy).sqrt()
}

/// Orientation of the directed segment `start -> end` in degrees, in (-180, 180].
pub fn angle_degrees(start: &Point, end: &Point) -> f64 {
    let dx = f64::from(end.x - start.x);
    let dy = f64::from(end.y - start.y);
    dy.atan2(dx).to_degrees()
}

/// Smallest angular distance (degrees) from `angle` to any multiple of 90°.
pub fn axis_deviation(angle: f64) -> f64 {
    let folded = angle.rem_euclid(90.0);
    folded.min(90.0 - folded)
}

/// Scalar projection of `point` onto the direction `origin -> towards`.
///
/// Returns 0 for a degenerate direction.
pub fn projection(origin: &Point, towards: &Point, point: &Point) -> f64 {
    let dx = f64::from(towards.x - origin.x);
    let dy = f64::from(towards.y - origin.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return 0.0;
    }
    (f64::from(point.x - origin.x) * dx + f64::from(point.y - origin.y) * dy) / len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let p1 = Point::new(0, 0);
        let p2 = Point::new(3, 4);
        assert!((distance(&p1, &p2) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_deviation() {
        assert!(axis_deviation(0.0) < 1e-9);
        assert!(axis_deviation(90.0) < 1e-9);
        assert!(axis_deviation(-90.0) < 1e-9);
        assert!(axis_deviation(180.0) < 1e-9);
        assert!((axis_deviation(45.0) - 45.0).abs() < 1e-9);
        assert!((axis_deviation(-80.0) - 10.0).abs() < 1e-9);
        assert!((axis_deviation(100.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection() {
        let o = Point::new(0, 0);
        let t = Point::new(10, 0);
        assert!((projection(&o, &t, &Point::new(7, 3)) - 7.0).abs() < 1e-9);
        assert!((projection(&o, &t, &Point::new(-2, 5)) + 2.0).abs() < 1e-9);
        assert_eq!(projection(&o, &o, &Point::new(4, 4)), 0.0);
    }
}
