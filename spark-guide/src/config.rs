use anyhow::{Context, Result};
use serde::Deserialize;
use spark_dodge::{
    CalibrationConstant, CalibrationError, Calibrator, MazeError, Point, SizeMetric,
    DEFAULT_RESOLUTION,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    pub log_level: String,
    pub frame: FrameConfig,
    pub calibration: CalibrationConfig,
    pub maze: MazeConfig,
    pub capture: CaptureConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Distance of the reference object, in cm.
    pub reference_distance: f64,
    pub real_size: f64,
    /// Apparent size of the reference object, in pixels.
    pub reference_size: f64,
    /// Corners of the reference object; takes precedence over `reference_size`.
    pub reference_box: Option<[Point; 4]>,
    pub size_metric: SizeMetric,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub resolution: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub max_consecutive_failures: u32,
    pub retry_delay_ms: u64,
    /// Pause after a frame that produced guidance, giving the user time to act on it.
    pub guidance_pause_ms: u64,
    /// Frames slower than this are reported.
    pub frame_budget_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub environmental_model: PathBuf,
    pub response_table: Option<PathBuf>,
    pub channel_capacity: usize,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame: FrameConfig::default(),
            calibration: CalibrationConfig::default(),
            maze: MazeConfig::default(),
            capture: CaptureConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 630,
            height: 360,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            reference_distance: 30.0,
            real_size: 1.0,
            reference_size: 150.0,
            reference_box: None,
            size_metric: SizeMetric::EnclosingRadius,
        }
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            retry_delay_ms: 100,
            guidance_pause_ms: 1000,
            frame_budget_ms: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            environmental_model: PathBuf::from("data/environmentalModel.json"),
            response_table: None,
            channel_capacity: 4,
        }
    }
}

impl GuideConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.maze.validate()?;
        Ok(config)
    }

    /// Falls back to the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl CalibrationConfig {
    pub fn calibrate(&self) -> Result<CalibrationConstant, CalibrationError> {
        let calibrator = Calibrator::new(self.reference_distance).with_real_size(self.real_size);
        match self.reference_box {
            Some(corners) => calibrator.calibrate_box(
                &spark_dodge::BoundingBox::from_corners(corners),
                self.size_metric,
            ),
            None => calibrator.calibrate(self.reference_size),
        }
    }
}

impl MazeConfig {
    pub fn validate(&self) -> Result<(), MazeError> {
        if self.resolution == 0 {
            return Err(MazeError::ZeroResolution);
        }
        Ok(())
    }
}

impl CaptureConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn guidance_pause(&self) -> Duration {
        Duration::from_millis(self.guidance_pause_ms)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }
}
