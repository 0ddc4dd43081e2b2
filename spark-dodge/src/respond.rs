use crate::dodge::{Direction, DirectionPlan, DodgeStatus};
use anyhow::{Context, Result};
use hashbrown::HashMap;
use log::warn;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Distance buckets, in cm, for guidance straight ahead.
pub const FORWARD_THRESHOLDS: [u32; 3] = [30, 50, 100];
/// Distance buckets, in cm, for guidance to either side.
pub const LATERAL_THRESHOLDS: [u32; 4] = [50, 100, 150, 200];

/// What the user should do next, and how close the nearest obstacle is.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Guidance {
    pub direction: Direction,
    pub distance: Option<f64>,
}

impl Guidance {
    /// First move of a found plan, or `Stop` for anything else.
    pub fn from_plan(status: DodgeStatus, plan: &DirectionPlan, nearest: Option<f64>) -> Self {
        let direction = match (status, plan.first()) {
            (DodgeStatus::Found, Some(direction)) => *direction,
            _ => Direction::Stop,
        };

        Self {
            direction,
            distance: nearest,
        }
    }

    /// Response key, e.g. `^50` or `<150`. Distances past the last bucket, or
    /// unknown ones, fall back to the bare symbol.
    pub fn key(&self) -> String {
        let thresholds: &[u32] = match self.direction {
            Direction::Forward => &FORWARD_THRESHOLDS,
            Direction::Left | Direction::Right => &LATERAL_THRESHOLDS,
            Direction::Stop => &[],
        };

        let symbol = self.direction.symbol();
        let bucket = self.distance.and_then(|distance| {
            thresholds
                .iter()
                .find(|threshold| (distance as u32) <= **threshold)
        });

        match bucket {
            Some(threshold) => format!("{symbol}{threshold}"),
            None => symbol.to_string(),
        }
    }
}

impl Display for Guidance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.distance {
            Some(distance) => write!(f, "{} ({}cm)", self.direction, distance),
            None => write!(f, "{}", self.direction),
        }
    }
}

/// Spoken phrase for every response key.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    phrases: HashMap<String, String>,
}

impl Default for ResponseTable {
    fn default() -> Self {
        let phrases = [
            ("^", "Path ahead is clear, keep walking"),
            ("^30", "Obstacle right in front of you, slow down"),
            ("^50", "Obstacle about half a meter ahead"),
            ("^100", "Obstacle about one meter ahead"),
            ("<", "Bear left"),
            ("<50", "Step left now"),
            ("<100", "Move left within one meter"),
            ("<150", "Move left within one and a half meters"),
            ("<200", "Move left within two meters"),
            (">", "Bear right"),
            (">50", "Step right now"),
            (">100", "Move right within one meter"),
            (">150", "Move right within one and a half meters"),
            (">200", "Move right within two meters"),
            ("!", "Stop, there is no safe way forward"),
        ]
        .into_iter()
        .map(|(key, phrase)| (key.to_string(), phrase.to_string()))
        .collect();

        Self { phrases }
    }
}

impl ResponseTable {
    /// Built-in phrases overridden by the entries of a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: HashMap<String, String> =
            serde_json::from_str(json).context("response table must be a JSON object of strings")?;

        let mut table = Self::default();
        table.phrases.extend(overrides);
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read response table {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn phrase(&self, guidance: &Guidance) -> String {
        let key = guidance.key();
        if let Some(phrase) = self.phrases.get(&key) {
            return phrase.clone();
        }

        warn!("No phrase for response key {key}");
        self.phrases
            .get(guidance.direction.symbol().to_string().as_str())
            .cloned()
            .unwrap_or_else(|| guidance.to_string())
    }
}
