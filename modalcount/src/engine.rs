/// Per-frame counting engine: detections in, tracked objects and counts out
use crate::aggregator::ClassAggregator;
use crate::config::CounterConfig;
use crate::error::Result;
use crate::tracking_utils::{detections_to_tracker_format, filter_detections};
use crate::types::{ClassCounts, Detection, FrameReport};
use sorttrack::{MultiObjectTracker, SortMultiTracker};

/// Owns one tracker and one counting session.
///
/// Frames must be fed strictly in order; every call to
/// [`CountingEngine::process_frame`] completes the whole frame.
pub struct CountingEngine {
    config: CounterConfig,
    tracker: Box<dyn MultiObjectTracker>,
    aggregator: ClassAggregator,
    frame_count: u64,
}

impl CountingEngine {
    pub fn new(config: CounterConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Creating CountingEngine: max_age={}, min_hits={}, iou_threshold={:.3}, min_confidence={:.3}, classes={:?}",
            config.max_age,
            config.min_hits,
            config.iou_threshold,
            config.min_confidence,
            config.classes
        );

        Ok(Self {
            tracker: Self::build_tracker(&config),
            aggregator: ClassAggregator::new(&config.classes),
            config,
            frame_count: 0,
        })
    }

    fn build_tracker(config: &CounterConfig) -> Box<dyn MultiObjectTracker> {
        Box::new(SortMultiTracker::new(
            config.max_age,
            config.min_hits,
            config.iou_threshold,
            config.measurement_noise,
            config.process_noise,
        ))
    }

    /// Track and count one frame of detections
    pub fn process_frame(&mut self, detections: &[Detection]) -> FrameReport {
        self.frame_count += 1;

        let detections = filter_detections(
            detections,
            &self.config.classes,
            self.config.min_confidence,
        );
        let boxes = detections_to_tracker_format(&detections);

        let tracks = self.tracker.update(&boxes);
        let objects = self.aggregator.observe(&tracks, &detections);
        self.aggregator.retain_tracks(&self.tracker.active_ids());

        log::debug!(
            "Frame {}: {} detections, {} reported of {} active tracks, counts [{}]",
            self.frame_count,
            detections.len(),
            objects.len(),
            self.tracker.num_tracklets(),
            self.aggregator.counts()
        );

        FrameReport {
            frame: self.frame_count,
            objects,
            counts: self.aggregator.counts().clone(),
        }
    }

    pub fn counts(&self) -> &ClassCounts {
        self.aggregator.counts()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Tracks held by the tracker, reported or not
    pub fn num_tracks(&self) -> usize {
        self.tracker.num_tracklets()
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Drop all tracks and counts and start a new session
    pub fn reset(&mut self) {
        log::info!("Resetting counting session after {} frames", self.frame_count);
        self.tracker.clear_trackers();
        self.aggregator.reset();
        self.frame_count = 0;
    }

    pub fn log_summary(&self) {
        log::info!("Final modal share counts after {} frames:", self.frame_count);
        for (class, count) in self.counts().iter() {
            log::info!("  {}: {}", class, count);
        }
    }
}
