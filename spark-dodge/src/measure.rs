use crate::calibrate::{CalibrationConstant, SizeMetric};
use crate::geometry::BoundingBox;
use crate::round_hundredths;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MeasurementError {
    #[error("apparent size must be a positive number, got {0}")]
    ZeroApparentSize(f64),
}

/// Estimates the distance of an obstacle from its apparent size.
#[derive(Debug, Copy, Clone)]
pub struct Measurementor {
    constant: CalibrationConstant,
    metric: SizeMetric,
}

impl Measurementor {
    pub fn new(constant: CalibrationConstant) -> Self {
        Self {
            constant,
            metric: SizeMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: SizeMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn constant(&self) -> &CalibrationConstant {
        &self.constant
    }

    /// Distance in calibration units, rounded to two decimals.
    ///
    /// A raw estimate below the reference distance is corrected to
    /// `reference + raw`; near-field boxes are otherwise underestimated.
    pub fn measure(&self, apparent_size: f64) -> Result<f64, MeasurementError> {
        if !(apparent_size.is_finite() && apparent_size > 0.0) {
            return Err(MeasurementError::ZeroApparentSize(apparent_size));
        }

        let raw = self.constant.scale() / apparent_size;
        let reference = self.constant.reference_distance();
        let distance = if raw < reference { reference + raw } else { raw };

        Ok(round_hundredths(distance))
    }

    /// Measures a box and records the result on it.
    pub fn measure_box(&self, bbox: &mut BoundingBox) -> Result<f64, MeasurementError> {
        let apparent_size = self.metric.apparent_size(bbox);
        let distance = self.measure(apparent_size)?;
        debug!("apparent size {apparent_size:.2}px -> {distance}cm");

        bbox.distance = Some(distance);
        Ok(distance)
    }
}
