//! Class attribution and exactly-once counting of tracked objects
//!
//! Tracker output boxes are filter-smoothed, so they no longer equal any
//! detection box. Each reported track takes the class of the detection whose
//! center is nearest to its own. This is a heuristic: two objects of
//! different classes crossing paths can swap labels.

use crate::types::{ClassCounts, Detection, RoadUserClass, TrackedObject};
use sorttrack::{Bbox, TrackedBox};
use std::collections::{HashMap, HashSet};

/// Class of the detection whose box center is nearest to `bbox`.
///
/// Ties go to the detection that comes first. `None` when there are no detections.
pub fn attribute_class(bbox: &Bbox<f32>, detections: &[Detection]) -> Option<RoadUserClass> {
    let mut best: Option<(f32, RoadUserClass)> = None;
    for det in detections {
        let distance = bbox.center_distance(&det.bbox);
        match best {
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, det.class)),
        }
    }
    best.map(|(_, class)| class)
}

/// Per-session counting state
#[derive(Debug, Clone)]
pub struct ClassAggregator {
    classes: Vec<RoadUserClass>,
    /// Per class: track id -> display number. Append-only within a session.
    seen_ids: HashMap<RoadUserClass, HashMap<u32, u32>>,
    counts: ClassCounts,
    /// Last class attributed to each track still held by the tracker
    last_class: HashMap<u32, RoadUserClass>,
}

impl ClassAggregator {
    pub fn new(classes: &[RoadUserClass]) -> Self {
        Self {
            classes: classes.to_vec(),
            seen_ids: HashMap::new(),
            counts: ClassCounts::new(classes),
            last_class: HashMap::new(),
        }
    }

    /// Attribute classes to this frame's reported tracks and update counts
    pub fn observe(
        &mut self,
        tracks: &[TrackedBox],
        detections: &[Detection],
    ) -> Vec<TrackedObject> {
        let mut objects = Vec::with_capacity(tracks.len());
        for track in tracks {
            let class = attribute_class(&track.bbox, detections)
                .or_else(|| self.last_class.get(&track.id).copied());

            let mut display_id = None;
            if let Some(class) = class {
                self.last_class.insert(track.id, class);
                display_id = Some(self.record(track.id, class));
            }

            objects.push(TrackedObject {
                track_id: track.id,
                bbox: track.bbox,
                class,
                display_id,
            });
        }
        objects
    }

    /// Count `track_id` under `class` unless already counted there.
    /// Returns the track's display number within the class.
    pub fn record(&mut self, track_id: u32, class: RoadUserClass) -> u32 {
        let seen = self.seen_ids.entry(class).or_default();
        if let Some(&display_id) = seen.get(&track_id) {
            return display_id;
        }

        let display_id = self.counts.increment(class) as u32;
        seen.insert(track_id, display_id);
        log::debug!("Counted {} #{} (track {})", class, display_id, track_id);
        display_id
    }

    /// Forget remembered classes of tracks the tracker no longer holds.
    /// Counts and seen ids are untouched.
    pub fn retain_tracks(&mut self, active_ids: &[u32]) {
        let active: HashSet<u32> = active_ids.iter().copied().collect();
        self.last_class.retain(|id, _| active.contains(id));
    }

    pub fn counts(&self) -> &ClassCounts {
        &self.counts
    }

    pub fn last_class(&self, track_id: u32) -> Option<RoadUserClass> {
        self.last_class.get(&track_id).copied()
    }

    /// Start a new counting session
    pub fn reset(&mut self) {
        self.seen_ids.clear();
        self.last_class.clear();
        self.counts = ClassCounts::new(&self.classes);
    }
}
