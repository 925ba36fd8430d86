//! Pure Rust IOU-based SORT tracking library
//!
//! Keeps temporally stable identities for boxes reported by an upstream
//! detector: a constant-velocity Kalman filter per track, optimal IoU
//! assignment between predictions and detections, and a confirm/evict
//! lifecycle.
//!
//! ```rust,ignore
//! use sorttrack::{Bbox, MultiObjectTracker, SortMultiTracker};
//!
//! let mut tracker: Box<dyn MultiObjectTracker> = Box::new(SortMultiTracker::default());
//! let tracks = tracker.update(&[Bbox::new(10.0, 10.0, 50.0, 50.0)]);
//! ```

pub mod bbox;
pub mod box_tracker;
pub mod hungarian; // Hungarian algorithm for optimal assignment
pub mod kalman;
pub mod trackers;

pub use bbox::{calculate_iou, Bbox};
pub use box_tracker::{KalmanBoxTracker, KalmanBoxTrackerParams, TrackState};
pub use hungarian::{AssignmentResult, HungarianSolver};
pub use trackers::{
    assign_detections_to_tracks, MultiObjectTracker, SortMultiTracker, TrackedBox,
    DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_AGE, DEFAULT_MIN_HITS,
};
