use crate::geometry::BoundingBox;
use log::info;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("reference apparent size must be a positive number, got {0}")]
    InvalidApparentSize(f64),
    #[error("reference distance must be a positive number, got {0}")]
    InvalidReferenceDistance(f64),
    #[error("real object size must be a positive number, got {0}")]
    InvalidRealSize(f64),
    #[error("focal length must be a positive number, got {0}")]
    InvalidFocalLength(f64),
}

/// Which pixel measurement of a box stands for its apparent size.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    /// Radius of the minimum enclosing circle, steadier under partial occlusion.
    #[default]
    EnclosingRadius,
    Width,
}

impl SizeMetric {
    pub fn apparent_size(self, bbox: &BoundingBox) -> f64 {
        match self {
            SizeMetric::EnclosingRadius => bbox.min_enclosing_circle(),
            SizeMetric::Width => bbox.width as f64,
        }
    }
}

/// Session-wide focal-length constant. Immutable once built.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CalibrationConstant {
    reference_distance: f64,
    reference_size: f64,
    real_size: f64,
    focal_length: f64,
}

impl CalibrationConstant {
    /// Wraps an already known focal length, with the object scale folded in
    /// (real size of one).
    pub fn from_focal_length(
        reference_distance: f64,
        focal_length: f64,
    ) -> Result<Self, CalibrationError> {
        if !is_positive(reference_distance) {
            return Err(CalibrationError::InvalidReferenceDistance(reference_distance));
        }
        if !is_positive(focal_length) {
            return Err(CalibrationError::InvalidFocalLength(focal_length));
        }

        Ok(Self {
            reference_distance,
            reference_size: focal_length / reference_distance,
            real_size: 1.0,
            focal_length,
        })
    }

    pub fn reference_distance(&self) -> f64 {
        self.reference_distance
    }

    pub fn reference_size(&self) -> f64 {
        self.reference_size
    }

    pub fn real_size(&self) -> f64 {
        self.real_size
    }

    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Combined constant a distance is derived from: `distance = scale / apparent size`.
    pub fn scale(&self) -> f64 {
        self.focal_length * self.real_size
    }
}

/// Derives the focal length from a reference object observed at a known distance.
#[derive(Debug, Copy, Clone)]
pub struct Calibrator {
    reference_distance: f64,
    real_size: f64,
}

impl Calibrator {
    pub fn new(reference_distance: f64) -> Self {
        Self {
            reference_distance,
            real_size: 1.0,
        }
    }

    pub fn with_real_size(mut self, real_size: f64) -> Self {
        self.real_size = real_size;
        self
    }

    /// `focal_length = apparent_size * D0 / real_size`
    pub fn calibrate(&self, apparent_size: f64) -> Result<CalibrationConstant, CalibrationError> {
        if !is_positive(self.reference_distance) {
            return Err(CalibrationError::InvalidReferenceDistance(
                self.reference_distance,
            ));
        }
        if !is_positive(self.real_size) {
            return Err(CalibrationError::InvalidRealSize(self.real_size));
        }
        if !is_positive(apparent_size) {
            return Err(CalibrationError::InvalidApparentSize(apparent_size));
        }

        let focal_length = apparent_size * self.reference_distance / self.real_size;
        info!(
            "Calibrated focal length {:.2} from apparent size {:.2} at {}cm",
            focal_length, apparent_size, self.reference_distance
        );

        Ok(CalibrationConstant {
            reference_distance: self.reference_distance,
            reference_size: apparent_size,
            real_size: self.real_size,
            focal_length,
        })
    }

    /// Calibrates from a reference box, reading its apparent size with `metric`.
    pub fn calibrate_box(
        &self,
        reference: &BoundingBox,
        metric: SizeMetric,
    ) -> Result<CalibrationConstant, CalibrationError> {
        self.calibrate(metric.apparent_size(reference))
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
