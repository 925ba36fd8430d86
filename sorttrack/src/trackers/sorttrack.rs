//! SORT (Simple Online Real-time Tracking) implementation

use crate::bbox::{ious, Bbox};
use crate::box_tracker::{KalmanBoxTracker, KalmanBoxTrackerParams};
use crate::hungarian::{AssignmentResult, HungarianSolver};
use crate::kalman::{DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE};
use crate::trackers::TrackedBox;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_AGE: u32 = 5;
pub const DEFAULT_MIN_HITS: u32 = 3;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Assign detection boxes to predicted track boxes.
///
/// Pairs are chosen by maximizing total IoU over the whole frame; any
/// chosen pair whose IoU is below `iou_threshold` is split and both sides
/// are reported unmatched. Indices refer to positions in the input slices.
pub fn assign_detections_to_tracks(
    detections: &[Bbox<f32>],
    tracks: &[Bbox<f32>],
    iou_threshold: f32,
) -> AssignmentResult {
    if detections.is_empty() || tracks.is_empty() {
        return AssignmentResult {
            assignments: Vec::new(),
            unassigned_detections: (0..detections.len()).collect(),
            unassigned_tracks: (0..tracks.len()).collect(),
        };
    }

    let det_track_ious = ious(detections, tracks);
    HungarianSolver::solve_iou(det_track_ious.view(), iou_threshold)
}

/// SORT (Simple Online Real-time Tracking) tracker
#[derive(Debug, Clone)]
pub struct SortMultiTracker {
    pub max_age: u32,
    pub min_hits: u32,
    pub iou_threshold: f32,
    next_track_id: u32,
    measurement_noise: [f32; 4],
    process_noise: [f32; 7],
    pub tracklets: BTreeMap<u32, KalmanBoxTracker>,
    pub n_steps: u32,
}

impl Default for SortMultiTracker {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_AGE,
            DEFAULT_MIN_HITS,
            DEFAULT_IOU_THRESHOLD,
            DEFAULT_MEASUREMENT_NOISE,
            DEFAULT_PROCESS_NOISE,
        )
    }
}

impl SortMultiTracker {
    pub fn new(
        max_age: u32,
        min_hits: u32,
        iou_threshold: f32,
        measurement_noise: [f32; 4],
        process_noise: [f32; 7],
    ) -> Self {
        log::info!(
            "Creating SortMultiTracker: max_age={}, min_hits={}, iou_threshold={:.3}",
            max_age,
            min_hits,
            iou_threshold
        );
        SortMultiTracker {
            max_age,
            min_hits,
            iou_threshold,
            next_track_id: 0,
            measurement_noise,
            process_noise,
            tracklets: BTreeMap::new(),
            n_steps: 0,
        }
    }

    /// Predict new positions for all tracklets and drop the ones that diverged.
    ///
    /// Returns the surviving track ids and their predicted boxes, in the same order.
    pub fn predict_and_cleanup(&mut self) -> (Vec<u32>, Vec<Bbox<f32>>) {
        let mut track_ids = Vec::with_capacity(self.tracklets.len());
        let mut predicted = Vec::with_capacity(self.tracklets.len());
        let mut diverged = Vec::new();

        for (&track_id, tracklet) in self.tracklets.iter_mut() {
            let b = tracklet.predict();
            if b.is_finite() {
                track_ids.push(track_id);
                predicted.push(b);
            } else {
                diverged.push(track_id);
            }
        }

        for track_id in diverged {
            log::debug!("Dropping track {}: prediction is not finite", track_id);
            self.tracklets.remove(&track_id);
        }

        (track_ids, predicted)
    }

    /// Remove tracklets that have gone more than `max_age` steps without a match
    pub fn remove_stale_tracklets(&mut self) {
        let max_age = self.max_age;
        self.tracklets.retain(|track_id, tracklet| {
            let keep = tracklet.time_since_update <= max_age;
            if !keep {
                log::debug!(
                    "Deleting track {} after {} missed steps",
                    track_id,
                    tracklet.time_since_update
                );
            }
            keep
        });
    }

    /// Update matched tracklets and age the unmatched ones.
    ///
    /// Returns the indices of detections left without a track.
    pub fn update_tracklets(
        &mut self,
        detection_boxes: &[Bbox<f32>],
        track_ids: &[u32],
        tracklet_boxes: &[Bbox<f32>],
    ) -> Vec<usize> {
        let assignment =
            assign_detections_to_tracks(detection_boxes, tracklet_boxes, self.iou_threshold);

        log::debug!(
            "Step {}: {} matched, {} unmatched detections, {} unmatched tracks",
            self.n_steps,
            assignment.assignments.len(),
            assignment.unassigned_detections.len(),
            assignment.unassigned_tracks.len()
        );

        for &(det_idx, track_idx) in &assignment.assignments {
            let track_id = track_ids[track_idx];
            if let Some(tracklet) = self.tracklets.get_mut(&track_id) {
                if let Err(e) = tracklet.update(&detection_boxes[det_idx]) {
                    log::debug!("Dropping track {}: {}", track_id, e);
                    self.tracklets.remove(&track_id);
                }
            }
        }

        for &track_idx in &assignment.unassigned_tracks {
            if let Some(tracklet) = self.tracklets.get_mut(&track_ids[track_idx]) {
                tracklet.mark_missed();
            }
        }

        assignment.unassigned_detections
    }

    /// Create new tracklets from unmatched detections.
    ///
    /// Boxes without a finite positive area cannot seed a filter and are skipped.
    pub fn create_tracklets(&mut self, boxes: impl IntoIterator<Item = Bbox<f32>>) {
        for bbox in boxes {
            if !bbox.has_area() {
                log::debug!("Not seeding a track from degenerate box {}", bbox);
                continue;
            }
            let id = self.next_track_id;
            self.next_track_id += 1;
            log::debug!("Creating track {} at {}", id, bbox);
            self.tracklets.insert(
                id,
                KalmanBoxTracker::new(KalmanBoxTrackerParams {
                    id,
                    bbox,
                    meas_var: Some(self.measurement_noise),
                    proc_var: Some(self.process_noise),
                }),
            );
        }
    }

    /// Boxes of tracks matched this step that have proven themselves, or any
    /// matched track while the tracker is still warming up.
    pub fn get_tracklet_boxes(&self) -> Vec<TrackedBox> {
        let warming_up = self.n_steps <= self.min_hits;
        self.tracklets
            .values()
            .filter(|t| t.time_since_update == 0 && (t.hits >= self.min_hits || warming_up))
            .map(|t| TrackedBox {
                id: t.id,
                bbox: t.bbox(),
            })
            .filter(|t| t.bbox.is_finite())
            .collect()
    }

    /// Main update function - the core SORT algorithm
    pub fn update(&mut self, detection_boxes: &[Bbox<f32>]) -> Vec<TrackedBox> {
        self.n_steps += 1;

        let detection_boxes: Vec<Bbox<f32>> = detection_boxes
            .iter()
            .filter(|b| {
                let usable = b.has_area();
                if !usable {
                    log::debug!("Step {}: ignoring degenerate detection {}", self.n_steps, b);
                }
                usable
            })
            .copied()
            .collect();

        // Step 1: Predict new positions for all tracklets
        let (track_ids, tracklet_boxes) = self.predict_and_cleanup();

        // Step 2: Expired tracks can no longer be matched
        self.remove_stale_tracklets();
        let (track_ids, tracklet_boxes): (Vec<u32>, Vec<Bbox<f32>>) = track_ids
            .into_iter()
            .zip(tracklet_boxes)
            .filter(|(id, _)| self.tracklets.contains_key(id))
            .unzip();

        // Step 3: Associate detections with tracklets and update them
        let unmatched_detections =
            self.update_tracklets(&detection_boxes, &track_ids, &tracklet_boxes);

        // Step 4: Create new tracklets from unmatched detections
        self.create_tracklets(unmatched_detections.into_iter().map(|i| detection_boxes[i]));

        // Step 5: Return qualifying tracklet boxes
        self.get_tracklet_boxes()
    }

    /// Clear all trackers and restart id assignment
    pub fn clear_trackers(&mut self) {
        self.tracklets.clear();
        self.next_track_id = 0;
        self.n_steps = 0;
    }

    /// Get current number of trackers
    pub fn num_trackers(&self) -> usize {
        self.tracklets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::box_tracker::TrackState;

    fn square(x: f32, y: f32, size: f32) -> Bbox<f32> {
        Bbox::new(x, y, x + size, y + size)
    }

    #[test]
    fn test_association_scenario() {
        let detections = [square(0.0, 0.0, 10.0), square(20.0, 20.0, 10.0)];
        let tracks = [square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)];

        let result = assign_detections_to_tracks(&detections, &tracks, 0.3);
        assert_eq!(result.assignments, vec![(0, 0)]);
        assert_eq!(result.unassigned_detections, vec![1]);
        assert_eq!(result.unassigned_tracks, vec![1]);
    }

    #[test]
    fn test_association_degenerate() {
        let boxes = [square(0.0, 0.0, 10.0), square(50.0, 0.0, 10.0)];

        let result = assign_detections_to_tracks(&boxes, &[], 0.3);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned_detections, vec![0, 1]);

        let result = assign_detections_to_tracks(&[], &boxes, 0.3);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned_tracks, vec![0, 1]);
    }

    #[test]
    fn test_sort_basic() {
        let mut tracker = SortMultiTracker::default();
        let detections = [square(10.0, 10.0, 40.0), square(60.0, 60.0, 40.0)];

        let tracks = tracker.update(&detections);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[1].id, 1);

        tracker.clear_trackers();
        assert_eq!(tracker.num_trackers(), 0);
        let tracks = tracker.update(&detections[..1]);
        assert_eq!(tracks[0].id, 0);
    }

    #[test]
    fn test_first_step_scenario() {
        let mut tracker = SortMultiTracker::default();
        tracker.update(&[square(0.0, 0.0, 10.0), square(100.0, 100.0, 10.0)]);

        // one detection overlaps a track, the other is new
        let out = tracker.update(&[square(0.0, 0.0, 10.0), square(20.0, 20.0, 10.0)]);
        assert_eq!(tracker.num_trackers(), 3);
        assert_eq!(tracker.tracklets[&0].hits, 1);
        assert_eq!(tracker.tracklets[&1].time_since_update, 1);
        assert_eq!(tracker.tracklets[&1].state(3), TrackState::Lost);
        assert_eq!(tracker.tracklets[&2].hits, 0);

        let ids: Vec<u32> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_stable_id_for_steady_box() {
        let mut tracker = SortMultiTracker::default();
        for frame in 1..=10 {
            let out = tracker.update(&[square(50.0, 50.0, 20.0)]);
            assert_eq!(out.len(), 1, "frame {}", frame);
            assert_eq!(out[0].id, 0);
        }
        assert_eq!(tracker.tracklets[&0].hits, 9);
    }

    #[test]
    fn test_tentative_hidden_after_warm_up() {
        let mut tracker = SortMultiTracker::default();
        for _ in 0..5 {
            tracker.update(&[square(0.0, 0.0, 10.0)]);
        }

        // a new object after the warm-up must earn min_hits matches first
        let far = square(200.0, 200.0, 10.0);
        let mut visible = Vec::new();
        for _ in 0..5 {
            let out = tracker.update(&[square(0.0, 0.0, 10.0), far]);
            visible.push(out.iter().any(|t| t.id == 1));
        }
        assert_eq!(visible, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_missed_track_deleted_after_max_age() {
        let mut tracker = SortMultiTracker::default();
        for _ in 0..4 {
            tracker.update(&[square(0.0, 0.0, 10.0)]);
        }

        for missed in 1..=tracker.max_age {
            let out = tracker.update(&[]);
            assert!(out.is_empty());
            assert_eq!(tracker.tracklets[&0].time_since_update, missed);
        }

        tracker.update(&[]);
        assert!(tracker.tracklets.is_empty());
    }

    #[test]
    fn test_reappearing_after_expiry_gets_new_id() {
        let mut tracker = SortMultiTracker::default();
        let b = square(30.0, 30.0, 20.0);
        for _ in 0..10 {
            tracker.update(&[b]);
        }
        for _ in 0..tracker.max_age {
            tracker.update(&[]);
        }
        tracker.update(&[b]);
        assert!(!tracker.tracklets.contains_key(&0));
        assert!(tracker.tracklets.contains_key(&1));
    }

    #[test]
    fn test_short_gap_keeps_id() {
        let mut tracker = SortMultiTracker::default();
        let b = square(30.0, 30.0, 20.0);
        for _ in 0..10 {
            tracker.update(&[b]);
        }
        for _ in 0..2 {
            tracker.update(&[]);
        }
        let out = tracker.update(&[b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 0);
    }

    #[test]
    fn test_crossing_objects_keep_ids() {
        let mut tracker = SortMultiTracker::new(
            5,
            1,
            0.3,
            DEFAULT_MEASUREMENT_NOISE,
            DEFAULT_PROCESS_NOISE,
        );
        // two boxes moving towards each other along the x axis on separate rows
        for step in 0..12 {
            let s = step as f32 * 4.0;
            let out = tracker.update(&[square(s, 0.0, 20.0), square(100.0 - s, 15.0, 20.0)]);
            for t in &out {
                if t.id == 0 {
                    assert!(t.bbox.center_y() < 15.0);
                } else {
                    assert_eq!(t.id, 1);
                    assert!(t.bbox.center_y() > 15.0);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_detection_never_tracked() {
        let mut tracker = SortMultiTracker::default();
        let flat = Bbox::new(50.0, 10.0, 50.0, 30.0);
        for _ in 0..5 {
            let out = tracker.update(&[square(0.0, 0.0, 20.0), flat]);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].id, 0);
            assert!(out[0].bbox.is_finite());
        }
        assert_eq!(tracker.num_trackers(), 1);

        tracker.create_tracklets([flat, Bbox::new(f32::NAN, 0.0, 10.0, 10.0)]);
        assert_eq!(tracker.num_trackers(), 1);
    }

    #[test]
    fn test_nan_detection_does_not_take_over_track() {
        let mut tracker = SortMultiTracker::default();
        let b = square(40.0, 40.0, 20.0);
        for _ in 0..4 {
            tracker.update(&[b]);
        }

        let out = tracker.update(&[Bbox::new(f32::NAN, 40.0, 60.0, 60.0)]);
        assert!(out.is_empty());
        assert_eq!(tracker.tracklets[&0].time_since_update, 1);

        let out = tracker.update(&[b]);
        let ids: Vec<u32> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0]);
        assert!(out[0].bbox.is_finite());
    }

    #[test]
    fn test_diverged_prediction_removed_before_association() {
        let mut tracker = SortMultiTracker::default();
        tracker.update(&[square(0.0, 0.0, 10.0)]);

        // zero-area seed: the first prediction has no finite box
        let flat = Bbox::new(100.0, 100.0, 100.0, 120.0);
        tracker.tracklets.insert(
            1,
            KalmanBoxTracker::new(KalmanBoxTrackerParams {
                id: 1,
                bbox: flat,
                meas_var: None,
                proc_var: None,
            }),
        );
        tracker.next_track_id = 2;

        let (ids, boxes) = tracker.clone().predict_and_cleanup();
        assert_eq!(ids, vec![0]);
        assert!(boxes.iter().all(|b| b.is_finite()));

        let out = tracker.update(&[square(0.0, 0.0, 10.0), square(95.0, 100.0, 10.0)]);
        assert!(!tracker.tracklets.contains_key(&1));
        let ids: Vec<u32> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert!(out.iter().all(|t| t.bbox.is_finite()));
    }

    #[test]
    fn test_diverged_update_deletes_track() {
        let mut tracker =
            SortMultiTracker::new(5, 3, 0.3, [f32::NAN; 4], DEFAULT_PROCESS_NOISE);
        let b = square(10.0, 10.0, 30.0);

        let out = tracker.update(&[b]);
        assert_eq!(out[0].id, 0);

        // matched, but the correction cannot produce a finite state
        let out = tracker.update(&[b]);
        assert!(out.is_empty());
        assert_eq!(tracker.num_trackers(), 0);

        let out = tracker.update(&[b]);
        let ids: Vec<u32> = out.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
