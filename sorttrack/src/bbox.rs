//! Pixel-space boxes, the filter measurement form `[cx, cy, area, aspect]`
//! and IoU overlap between detections and predicted tracks

use ndarray::prelude::*;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in corner form `(xmin, ymin, xmax, ymax)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bbox<T = f32> {
    pub xmin: T,
    pub ymin: T,
    pub xmax: T,
    pub ymax: T,
}

impl Bbox<f32> {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.xmin + self.xmax) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.ymin + self.ymax) / 2.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), self.center_y())
    }

    /// Euclidean distance between the centers of two boxes
    pub fn center_distance(&self, other: &Bbox<f32>) -> f32 {
        let dx = self.center_x() - other.center_x();
        let dy = self.center_y() - other.center_y();
        (dx * dx + dy * dy).sqrt()
    }

    /// True when every coordinate is neither NaN nor infinite
    pub fn is_finite(&self) -> bool {
        self.to_bounds().iter().all(|v| v.is_finite())
    }

    /// Finite with strictly positive width and height
    pub fn has_area(&self) -> bool {
        self.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }
}

impl Bbox<f32> {
    /// Convert to bounds array [xmin, ymin, xmax, ymax]
    pub fn to_bounds(&self) -> [f32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Convert to measurement form [center_x, center_y, area, aspect_ratio]
    pub fn to_z(&self) -> [f32; 4] {
        let w = self.width();
        let h = self.height();
        let aspect_ratio = if h != 0.0 { w / h } else { 1.0 };
        [self.center_x(), self.center_y(), w * h, aspect_ratio]
    }

    /// Create from measurement form [center_x, center_y, area, aspect_ratio].
    ///
    /// A non-positive `area * aspect_ratio` yields NaN coordinates; callers
    /// check [`Bbox::is_finite`] before using the result.
    pub fn from_z(z: &[f32; 4]) -> Self {
        let [center_x, center_y, area, aspect_ratio] = *z;

        let w = (area * aspect_ratio).sqrt();
        let h = area / w;

        Self {
            xmin: center_x - w / 2.0,
            ymin: center_y - h / 2.0,
            xmax: center_x + w / 2.0,
            ymax: center_y + h / 2.0,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Bbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bbox({}, {}, {}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// Intersection over union of two boxes, in `[0, 1]`.
///
/// Boxes that only touch along an edge, whose union is empty, or that have
/// a non-finite coordinate score 0.
pub fn calculate_iou(a: &Bbox<f32>, b: &Bbox<f32>) -> f32 {
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }

    let overlap_w = a.xmax.min(b.xmax) - a.xmin.max(b.xmin);
    let overlap_h = a.ymax.min(b.ymax) - a.ymin.max(b.ymin);
    if overlap_w <= 0.0 || overlap_h <= 0.0 {
        return 0.0;
    }

    let intersection = overlap_w * overlap_h;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }

    let iou = intersection / union;
    if iou.is_finite() {
        iou.min(1.0)
    } else {
        0.0
    }
}

/// Pairwise IoU, one row per detection and one column per track
pub fn ious(detections: &[Bbox<f32>], tracks: &[Bbox<f32>]) -> Array2<f32> {
    Array2::from_shape_fn((detections.len(), tracks.len()), |(i, j)| {
        calculate_iou(&detections[i], &tracks[j])
    })
}
