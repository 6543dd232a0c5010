use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds centered on `center` with the given full size
    pub fn from_center(center: Point, size: Point) -> Self {
        let half = size.multiply(0.5);
        Self::new(center.subtract(&half), center.add(&half))
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks if a point is within the bounds (inclusive)
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Returns a new bounds expanded by the given amount on every side
    pub fn expanded(&self, amount: f64) -> Bounds {
        Bounds::new(
            Point::new(self.min.x - amount, self.min.y - amount),
            Point::new(self.max.x + amount, self.max.y + amount),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center() {
        let bounds = Bounds::from_center(Point::new(100.0, 100.0), Point::new(50.0, 20.0));
        assert_eq!(bounds.min, Point::new(75.0, 90.0));
        assert_eq!(bounds.max, Point::new(125.0, 110.0));
        assert_eq!(bounds.center(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(Point::new(10.0, 20.0), Point::new(30.0, 40.0));
        assert!(bounds.contains(&Point::new(15.0, 25.0)));
        assert!(bounds.contains(&Point::new(30.0, 40.0)));
        assert!(!bounds.contains(&Point::new(5.0, 25.0)));
    }

    #[test]
    fn test_expanded_grows_every_side() {
        let bounds = Bounds::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0)).expanded(5.0);
        assert_eq!(bounds.min, Point::new(-5.0, -5.0));
        assert_eq!(bounds.max, Point::new(15.0, 15.0));
        assert!(bounds.contains(&Point::new(14.0, -4.0)));
    }
}
