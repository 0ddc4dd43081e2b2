use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The four corners of an axis-aligned obstacle rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lt: Point,
    pub lb: Point,
    pub rt: Point,
    pub rb: Point,
}

/// Obstacle rectangle in pixel space, rebuilt for every frame.
///
/// The corners always describe an axis-aligned rectangle: construction takes
/// the hull of whatever four points the detector reported. `distance` stays
/// `None` until the box has been measured.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub coordinates: Coordinates,
    pub width: u32,
    pub height: u32,
    pub distance: Option<f64>,
}

impl BoundingBox {
    /// Builds a box from four raw corner points in any order.
    pub fn from_corners(corners: [Point; 4]) -> Self {
        let left = corners.iter().map(|p| p.x).min().unwrap_or_default();
        let right = corners.iter().map(|p| p.x).max().unwrap_or_default();
        let top = corners.iter().map(|p| p.y).min().unwrap_or_default();
        let bottom = corners.iter().map(|p| p.y).max().unwrap_or_default();

        Self::from_edges(left, top, right, bottom)
    }

    /// Builds a box from its left, top, right and bottom pixel edges.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let (left, right) = (left.min(right), left.max(right));
        let (top, bottom) = (top.min(bottom), top.max(bottom));

        Self {
            coordinates: Coordinates {
                lt: Point::new(left, top),
                lb: Point::new(left, bottom),
                rt: Point::new(right, top),
                rb: Point::new(right, bottom),
            },
            width: right.abs_diff(left),
            height: bottom.abs_diff(top),
            distance: None,
        }
    }

    pub fn left(&self) -> i32 {
        self.coordinates.lt.x
    }

    pub fn right(&self) -> i32 {
        self.coordinates.rb.x
    }

    pub fn top(&self) -> i32 {
        self.coordinates.lt.y
    }

    pub fn bottom(&self) -> i32 {
        self.coordinates.lb.y
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.left() as f64 + self.width as f64 / 2.0,
            self.top() as f64 + self.height as f64 / 2.0,
        )
    }

    /// Radius of the smallest circle enclosing all four corners.
    pub fn min_enclosing_circle(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64) / 2.0
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} at {}",
            self.width, self.height, self.coordinates.lt
        )?;
        match self.distance {
            Some(distance) => write!(f, ", {distance}cm"),
            None => write!(f, ", unmeasured"),
        }
    }
}
