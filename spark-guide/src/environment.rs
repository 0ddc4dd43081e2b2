use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spark_dodge::geometry::Coordinates;
use spark_dodge::BoundingBox;
use std::path::Path;

/// One measured obstacle as published in the environmental model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalRecord {
    pub coordinates: Coordinates,
    pub width: u32,
    pub height: u32,
    pub distance: f64,
}

impl EnvironmentalRecord {
    /// `None` for boxes that were never measured.
    pub fn from_box(bbox: &BoundingBox) -> Option<Self> {
        Some(Self {
            coordinates: bbox.coordinates,
            width: bbox.width,
            height: bbox.height,
            distance: bbox.distance?,
        })
    }
}

pub fn records(obstacles: &[BoundingBox]) -> Vec<EnvironmentalRecord> {
    obstacles
        .iter()
        .filter_map(EnvironmentalRecord::from_box)
        .collect()
}

/// Replaces the model file with this frame's records.
pub fn write_environmental_model(path: impl AsRef<Path>, records: &[EnvironmentalRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_environmental_model(path: impl AsRef<Path>) -> Result<Vec<EnvironmentalRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
