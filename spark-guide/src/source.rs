use anyhow::{Context, Result};
use bytes::Bytes;
use log::{info, warn};
use serde::Deserialize;
use spark_dodge::Point;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Four corner points as reported by the detector, in any order.
pub type RawDetection = [Point; 4];

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read frame {0}")]
    ReadFailed(u64),
    #[error("frame source is exhausted")]
    Exhausted,
}

/// One raster frame. The pixels are opaque to the guide.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Camera side of the guide. Implementations hold the device for as long as
/// they live and release it on drop.
pub trait FrameSource {
    fn read(&mut self) -> Result<Frame, CaptureError>;
}

pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Vec<RawDetection>;
}

#[derive(Debug, Deserialize)]
struct Recording {
    width: u32,
    height: u32,
    /// `null` entries replay as failed reads.
    frames: Vec<Option<Vec<RawDetection>>>,
}

/// Detections recorded from an earlier session, replayed frame by frame.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    width: u32,
    height: u32,
    frames: Arc<[Option<Vec<RawDetection>>]>,
}

impl ReplayFeed {
    pub fn from_json(json: &str) -> Result<Self> {
        let recording: Recording = serde_json::from_str(json)?;
        Ok(Self {
            width: recording.width,
            height: recording.height,
            frames: recording.frames.into(),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid recording {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Width and height of the recorded frames.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Splits the recording into its camera and detector halves.
    pub fn split(self) -> (ReplayCamera, ReplayDetector) {
        info!(
            "Replaying {} frames of {}x{}",
            self.frames.len(),
            self.width,
            self.height
        );
        let camera = ReplayCamera {
            feed: self.clone(),
            cursor: 0,
        };
        (camera, ReplayDetector { feed: self })
    }
}

pub struct ReplayCamera {
    feed: ReplayFeed,
    cursor: u64,
}

impl FrameSource for ReplayCamera {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        let sequence = self.cursor;
        let entry = self
            .feed
            .frames
            .get(sequence as usize)
            .ok_or(CaptureError::Exhausted)?;
        self.cursor += 1;

        if entry.is_none() {
            return Err(CaptureError::ReadFailed(sequence));
        }

        Ok(Frame {
            sequence,
            width: self.feed.width,
            height: self.feed.height,
            data: Bytes::new(),
        })
    }
}

impl Drop for ReplayCamera {
    fn drop(&mut self) {
        info!("Released replay camera after {} frames", self.cursor);
    }
}

pub struct ReplayDetector {
    feed: ReplayFeed,
}

impl Detector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<RawDetection> {
        match self.feed.frames.get(frame.sequence as usize) {
            Some(Some(detections)) => detections.clone(),
            _ => {
                warn!("No recorded detections for frame {}", frame.sequence);
                Vec::new()
            }
        }
    }
}
