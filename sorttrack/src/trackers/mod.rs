//! Multi-object tracking implementations
//!
//! Trackers share the [`MultiObjectTracker`] interface so that callers can
//! hold one behind a `Box<dyn MultiObjectTracker>`, one instance per camera.

use crate::bbox::Bbox;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod sorttrack;

pub use sorttrack::{
    assign_detections_to_tracks, SortMultiTracker, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_AGE,
    DEFAULT_MIN_HITS,
};

/// A track reported for the current step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackedBox {
    pub id: u32,
    pub bbox: Bbox<f32>,
}

/// Common interface for multi-object trackers
pub trait MultiObjectTracker: Send {
    /// Advance one step with this frame's detection boxes and return the
    /// tracks that qualify for output
    fn update(&mut self, detection_boxes: &[Bbox<f32>]) -> Vec<TrackedBox>;

    /// Clear all trackers
    fn clear_trackers(&mut self);

    /// Get number of active tracklets
    fn num_tracklets(&self) -> usize;

    /// Ids of every track in the active set, reported or not
    fn active_ids(&self) -> Vec<u32>;

    /// Get current step count
    fn get_step_count(&self) -> u32;
}

impl MultiObjectTracker for SortMultiTracker {
    fn update(&mut self, detection_boxes: &[Bbox<f32>]) -> Vec<TrackedBox> {
        self.update(detection_boxes)
    }

    fn clear_trackers(&mut self) {
        self.clear_trackers()
    }

    fn num_tracklets(&self) -> usize {
        self.tracklets.len()
    }

    fn active_ids(&self) -> Vec<u32> {
        self.tracklets.keys().copied().collect()
    }

    fn get_step_count(&self) -> u32 {
        self.n_steps
    }
}
