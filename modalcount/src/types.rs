//! Type definitions for road-user counting

use crate::error::CounterError;
use serde::{Deserialize, Serialize};
use sorttrack::Bbox;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Road-user classes that can be counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadUserClass {
    Person,
    Bicycle,
    /// Person riding a bicycle, emitted by detectors fine-tuned with a merged label
    Cyclist,
    Car,
    Motorcycle,
    Bus,
    Truck,
}

impl RoadUserClass {
    /// Classes counted with a stock COCO detector
    pub const DEFAULT_CLASSES: [RoadUserClass; 6] = [
        RoadUserClass::Person,
        RoadUserClass::Bicycle,
        RoadUserClass::Car,
        RoadUserClass::Motorcycle,
        RoadUserClass::Bus,
        RoadUserClass::Truck,
    ];

    /// Classes counted with the cyclist fine-tuned detector, in its label order
    pub const CYCLIST_CLASSES: [RoadUserClass; 6] = [
        RoadUserClass::Person,
        RoadUserClass::Cyclist,
        RoadUserClass::Car,
        RoadUserClass::Motorcycle,
        RoadUserClass::Bus,
        RoadUserClass::Truck,
    ];

    /// Map a COCO class id to a road-user class; other COCO classes are ignored
    pub fn from_coco_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Person),
            1 => Some(Self::Bicycle),
            2 => Some(Self::Car),
            3 => Some(Self::Motorcycle),
            5 => Some(Self::Bus),
            7 => Some(Self::Truck),
            _ => None,
        }
    }

    /// Map a class id of the cyclist fine-tuned detector
    pub fn from_cyclist_model_id(id: u32) -> Option<Self> {
        Self::CYCLIST_CLASSES.get(id as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Bicycle => "bicycle",
            Self::Cyclist => "cyclist",
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
            Self::Bus => "bus",
            Self::Truck => "truck",
        }
    }
}

impl fmt::Display for RoadUserClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadUserClass {
    type Err = CounterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        [
            Self::Person,
            Self::Bicycle,
            Self::Cyclist,
            Self::Car,
            Self::Motorcycle,
            Self::Bus,
            Self::Truck,
        ]
        .into_iter()
        .find(|class| class.as_str() == label)
        .ok_or_else(|| CounterError::UnknownClass(s.to_string()))
    }
}

/// Single detection from the upstream detector, valid for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box corners in pixels
    pub bbox: Bbox<f32>,
    /// Detection confidence score (0-1)
    pub confidence: f32,
    pub class: RoadUserClass,
}

impl Detection {
    pub fn new(bbox: Bbox<f32>, confidence: f32, class: RoadUserClass) -> Self {
        Self {
            bbox,
            confidence,
            class,
        }
    }

    /// Build from the detector tuple `(x1, y1, x2, y2, confidence, class)`
    pub fn from_corners(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        confidence: f32,
        class: RoadUserClass,
    ) -> Self {
        Self::new(Bbox::new(x1, y1, x2, y2), confidence, class)
    }
}

/// A track visible in the current frame, with its attributed class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    /// Tracker identity, unique for the lifetime of the engine
    pub track_id: u32,
    /// Filter-smoothed box
    pub bbox: Bbox<f32>,
    /// None only when no class could ever be attributed to the track
    pub class: Option<RoadUserClass>,
    /// 1-based per-class number shown next to the label ("car #3")
    pub display_id: Option<u32>,
}

/// Cumulative per-class counts. Values never decrease within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    counts: BTreeMap<RoadUserClass, u64>,
}

impl ClassCounts {
    /// Zero counts for every class in `classes`
    pub fn new(classes: &[RoadUserClass]) -> Self {
        Self {
            counts: classes.iter().map(|&class| (class, 0)).collect(),
        }
    }

    pub(crate) fn increment(&mut self, class: RoadUserClass) -> u64 {
        let count = self.counts.entry(class).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get(&self, class: RoadUserClass) -> u64 {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoadUserClass, u64)> + '_ {
        self.counts.iter().map(|(&class, &count)| (class, count))
    }
}

/// Formats as `person:3, bicycle:0, car:12`
impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (class, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", class, count)?;
        }
        Ok(())
    }
}

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// 1-based index of the processed frame
    pub frame: u64,
    /// Qualifying tracks visible in this frame
    pub objects: Vec<TrackedObject>,
    /// Cumulative counts after this frame
    pub counts: ClassCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_mapping() {
        assert_eq!(RoadUserClass::from_coco_id(0), Some(RoadUserClass::Person));
        assert_eq!(RoadUserClass::from_coco_id(5), Some(RoadUserClass::Bus));
        assert_eq!(RoadUserClass::from_coco_id(7), Some(RoadUserClass::Truck));
        assert_eq!(RoadUserClass::from_coco_id(4), None);
        assert_eq!(RoadUserClass::from_coco_id(6), None);
    }

    #[test]
    fn test_cyclist_model_mapping() {
        assert_eq!(
            RoadUserClass::from_cyclist_model_id(1),
            Some(RoadUserClass::Cyclist)
        );
        assert_eq!(
            RoadUserClass::from_cyclist_model_id(5),
            Some(RoadUserClass::Truck)
        );
        assert_eq!(RoadUserClass::from_cyclist_model_id(6), None);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("Car".parse::<RoadUserClass>().unwrap(), RoadUserClass::Car);
        assert_eq!(
            " cyclist ".parse::<RoadUserClass>().unwrap(),
            RoadUserClass::Cyclist
        );
        assert!(matches!(
            "tram".parse::<RoadUserClass>(),
            Err(CounterError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_counts_display() {
        let mut counts = ClassCounts::new(&RoadUserClass::DEFAULT_CLASSES);
        counts.increment(RoadUserClass::Car);
        counts.increment(RoadUserClass::Car);
        counts.increment(RoadUserClass::Person);
        assert_eq!(
            counts.to_string(),
            "person:1, bicycle:0, car:2, motorcycle:0, bus:0, truck:0"
        );
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(RoadUserClass::Cyclist), 0);
    }

    #[test]
    fn test_detection_json() {
        let json = r#"{"bbox":{"xmin":0.0,"ymin":0.0,"xmax":10.0,"ymax":10.0},"confidence":0.9,"class":"car"}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(
            det,
            Detection::from_corners(0.0, 0.0, 10.0, 10.0, 0.9, RoadUserClass::Car)
        );
    }
}
