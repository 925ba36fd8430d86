/// Tracking utilities for format conversions
///
/// Converts between detector output and the box lists the tracker consumes.
use crate::types::{Detection, RoadUserClass};
use sorttrack::Bbox;

/// Keep detections of counted classes at or above `min_confidence` whose
/// boxes are finite with positive width and height, preserving detector order
pub fn filter_detections(
    detections: &[Detection],
    classes: &[RoadUserClass],
    min_confidence: f32,
) -> Vec<Detection> {
    detections
        .iter()
        .enumerate()
        .filter(|(i, det)| {
            if !det.bbox.has_area() {
                log::debug!("Skipping detection {}: degenerate box {}", i, det.bbox);
                return false;
            }
            classes.contains(&det.class) && det.confidence >= min_confidence
        })
        .map(|(_, det)| *det)
        .collect()
}

/// Boxes in tracker input order
pub fn detections_to_tracker_format(detections: &[Detection]) -> Vec<Bbox<f32>> {
    detections.iter().map(|det| det.bbox).collect()
}
