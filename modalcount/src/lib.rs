//! Road-user modal share counting
//!
//! Turns a stream of per-frame detections from a fixed camera into an
//! exactly-once count of distinct pedestrians, cyclists and vehicles per
//! class. Identities come from the `sorttrack` SORT tracker; this crate
//! attributes a class to every reported track and keeps the per-class
//! counting session.
//!
//! Camera capture, detection, display and log-file writing stay with the
//! caller, which feeds [`CountingEngine::process_frame`] one frame at a time.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod tracking_utils;
pub mod types;

pub use aggregator::{attribute_class, ClassAggregator};
pub use config::CounterConfig;
pub use engine::CountingEngine;
pub use error::{CounterError, Result};
pub use sorttrack::Bbox;
pub use types::{ClassCounts, Detection, FrameReport, RoadUserClass, TrackedObject};
