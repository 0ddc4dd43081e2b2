mod bounding_box;
mod point;

pub use bounding_box::{BoundingBox, Coordinates};
pub use point::Point;
