//! Individual bounding box tracker using a constant-velocity Kalman filter

use crate::bbox::Bbox;
use crate::kalman::{
    ConstantVelocityModel, KalmanState, DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE,
};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct KalmanBoxTrackerParams {
    pub id: u32,
    pub bbox: Bbox<f32>,
    /// Diagonal of the measurement noise covariance matrix
    /// i.e. uncertainties of (x, y, s, r) measurements
    /// default = [1., 1., 10., 10.]
    pub meas_var: Option<[f32; 4]>,
    /// Diagonal of the process noise covariance matrix
    /// i.e. uncertainties of (x, y, s, r, dx, dy, ds) during transition
    /// default = [1., 1., 1., 1., 0.01, 0.01, 0.0001]
    pub proc_var: Option<[f32; 7]>,
}

/// Lifecycle of a track still held in the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Matched this step but not yet matched `min_hits` times
    Tentative,
    /// Matched this step with at least `min_hits` matches
    Confirmed,
    /// Missed at least the latest step, still eligible for re-association
    Lost,
}

#[derive(Debug, Clone)]
pub struct KalmanBoxTracker {
    /// track id
    pub id: u32,
    /// Kalman filter belief over the box state
    kf: KalmanState,
    model: ConstantVelocityModel,
    /// most recent filter-derived box
    last_box: Bbox<f32>,
    /// number of steps tracker has been run for (each predict() is one step)
    pub age: u32,
    /// number of steps with matching detection box
    pub hits: u32,
    /// number of consecutive steps with matched box
    pub hit_streak: u32,
    /// number of consecutive steps predicted without receiving box
    pub time_since_update: u32,
}

impl KalmanBoxTracker {
    /// Create new Kalman filter-based bbox tracker seeded from a detection box
    pub fn new(p: KalmanBoxTrackerParams) -> Self {
        let model = ConstantVelocityModel::new(
            p.meas_var.unwrap_or(DEFAULT_MEASUREMENT_NOISE),
            p.proc_var.unwrap_or(DEFAULT_PROCESS_NOISE),
        );
        let kf = model.initiate(&p.bbox.to_z());

        KalmanBoxTracker {
            id: p.id,
            kf,
            model,
            last_box: Bbox::from_z(&kf.z()),
            age: 0,
            hits: 0,
            hit_streak: 0,
            time_since_update: 0,
        }
    }

    /// Update tracker with its associated detection box.
    ///
    /// Fails, leaving the tracker untouched, when the corrected state is not finite.
    pub fn update(&mut self, bbox: &Bbox<f32>) -> Result<()> {
        let kf = self.model.update(&self.kf, &bbox.to_z())?;
        anyhow::ensure!(kf.is_finite(), "filter diverged after update with {}", bbox);
        self.kf = kf;
        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.last_box = self.get_state();
        Ok(())
    }

    /// Predict box position in next step
    pub fn predict(&mut self) -> Bbox<f32> {
        // Keep the area from being driven non-positive
        if self.kf.x[6] + self.kf.x[2] <= 0.0 {
            self.kf.x[6] = 0.0;
        }

        self.kf = self.model.predict(&self.kf);
        self.age += 1;
        self.time_since_update += 1;

        self.last_box = self.get_state();
        self.last_box
    }

    /// Record that no detection was associated this step
    pub fn mark_missed(&mut self) {
        self.hit_streak = 0;
    }

    /// Current box from the filter state, without advancing time
    pub fn get_state(&self) -> Bbox<f32> {
        Bbox::from_z(&self.kf.z())
    }

    /// Most recent box produced by predict() or update()
    pub fn bbox(&self) -> Bbox<f32> {
        self.last_box
    }

    pub fn state(&self, min_hits: u32) -> TrackState {
        if self.time_since_update > 0 {
            TrackState::Lost
        } else if self.hits >= min_hits {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        }
    }
}
