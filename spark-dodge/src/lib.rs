pub mod calibrate;
pub mod dodge;
pub mod filter;
pub mod geometry;
pub mod maze;
pub mod measure;
pub mod respond;

pub use calibrate::{CalibrationConstant, CalibrationError, Calibrator, SizeMetric};
pub use dodge::{Direction, DirectionPlan, DodgeStatus, Dodger, ForwardFirst, MovePolicy};
pub use filter::ObstacleFilter;
pub use geometry::{BoundingBox, Point};
pub use maze::{generate_maze, Cell, Footprint, MazeError, OccupancyGrid};
pub use measure::{MeasurementError, Measurementor};
pub use respond::{Guidance, ResponseTable};

/// Edge length of one maze cell in pixels.
pub const DEFAULT_RESOLUTION: u32 = 90;

/// Distances are reported with this many decimals.
pub(crate) const DISTANCE_DECIMALS: i32 = 2;

/// Rounds to two decimals, the precision distances and timings are reported with.
pub fn round_hundredths(value: f64) -> f64 {
    let factor = 10f64.powi(DISTANCE_DECIMALS);
    (value * factor).round() / factor
}
