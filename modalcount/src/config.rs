//! Counting engine configuration

use crate::error::{CounterError, Result};
use crate::types::RoadUserClass;
use serde::{Deserialize, Serialize};
use sorttrack::kalman::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE};
use sorttrack::{DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_AGE, DEFAULT_MIN_HITS};
use std::path::Path;

/// Configuration for the counting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Minimum IoU for a detection to update a track
    pub iou_threshold: f32,
    /// Matches needed before a track is reported once the tracker has warmed up
    pub min_hits: u32,
    /// Consecutive missed frames a track survives before deletion
    pub max_age: u32,
    /// Detections below this confidence are dropped before tracking
    pub min_confidence: f32,
    /// Measurement noise covariance diagonal
    pub measurement_noise: [f32; 4],
    /// Process noise covariance diagonal
    pub process_noise: [f32; 7],
    /// Classes to count; detections of other classes are dropped
    pub classes: Vec<RoadUserClass>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_hits: DEFAULT_MIN_HITS,
            max_age: DEFAULT_MAX_AGE,
            min_confidence: 0.5,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            process_noise: DEFAULT_PROCESS_NOISE,
            classes: RoadUserClass::DEFAULT_CLASSES.to_vec(),
        }
    }
}

impl CounterConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading counter configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(reject(format!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(reject(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        let noise_ok = self
            .measurement_noise
            .iter()
            .chain(self.process_noise.iter())
            .all(|v| v.is_finite() && *v > 0.0);
        if !noise_ok {
            return Err(reject("noise diagonals must be finite and positive"));
        }
        if self.classes.is_empty() {
            return Err(reject("at least one class must be counted"));
        }
        Ok(())
    }
}

fn reject<S: Into<String>>(msg: S) -> CounterError {
    let msg = msg.into();
    log::warn!("Rejecting counter configuration: {}", msg);
    CounterError::config(msg)
}
