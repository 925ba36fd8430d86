//! Constant-velocity Kalman filter over bounding-box state
//!
//! State: `[center_x, center_y, area, aspect_ratio, vel_x, vel_y, vel_area]`.
//! Measurement: `[center_x, center_y, area, aspect_ratio]`.
//!
//! The filter is split into a [`KalmanState`] value (mean and covariance,
//! owned by exactly one track) and a [`ConstantVelocityModel`] holding the
//! fixed matrices. Predict and update are pure functions from one state to
//! the next.

use anyhow::Result;
use nalgebra::{SMatrix, SVector};

pub const DIM_X: usize = 7;
pub const DIM_Z: usize = 4;

pub type StateVector = SVector<f32, DIM_X>;
pub type StateCovariance = SMatrix<f32, DIM_X, DIM_X>;
pub type Measurement = SVector<f32, DIM_Z>;

/// Diagonal of the initial state covariance: positions are trusted, the
/// unobserved velocities start very uncertain.
pub const INITIAL_COVARIANCE: [f32; DIM_X] = [10.0, 10.0, 10.0, 10.0, 10000.0, 10000.0, 10000.0];
pub const DEFAULT_MEASUREMENT_NOISE: [f32; DIM_Z] = [1.0, 1.0, 10.0, 10.0];
pub const DEFAULT_PROCESS_NOISE: [f32; DIM_X] = [1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.0001];

/// Gaussian belief over the box state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    /// State mean
    pub x: StateVector,
    /// State covariance
    pub p: StateCovariance,
}

impl KalmanState {
    /// Projection of the mean onto measurement space
    pub fn z(&self) -> [f32; DIM_Z] {
        [self.x[0], self.x[1], self.x[2], self.x[3]]
    }

    pub fn is_finite(&self) -> bool {
        self.x.iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantVelocityModel {
    f: StateCovariance,                 // State transition matrix
    h: SMatrix<f32, DIM_Z, DIM_X>,      // Observation matrix
    r: SMatrix<f32, DIM_Z, DIM_Z>,      // Observation noise covariance
    q: StateCovariance,                 // Process noise covariance
}

impl Default for ConstantVelocityModel {
    fn default() -> Self {
        Self::new(DEFAULT_MEASUREMENT_NOISE, DEFAULT_PROCESS_NOISE)
    }
}

impl ConstantVelocityModel {
    /// Build the model from the diagonals of the measurement and process
    /// noise covariances.
    pub fn new(measurement_noise: [f32; DIM_Z], process_noise: [f32; DIM_X]) -> Self {
        #[rustfmt::skip]
        let f = StateCovariance::from_row_slice(&[
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, // center_x' = center_x + vel_x
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, // center_y' = center_y + vel_y
            0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, // area' = area + vel_area
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, // aspect_ratio' = aspect_ratio
            0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, // vel_x' = vel_x
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, // vel_y' = vel_y
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, // vel_area' = vel_area
        ]);
        #[rustfmt::skip]
        let h = SMatrix::<f32, DIM_Z, DIM_X>::from_row_slice(&[
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
        ]);

        Self {
            f,
            h,
            r: SMatrix::<f32, DIM_Z, DIM_Z>::from_diagonal(&Measurement::from(measurement_noise)),
            q: StateCovariance::from_diagonal(&StateVector::from(process_noise)),
        }
    }

    /// Initial belief for a fresh track: measured position and shape, zero velocity
    pub fn initiate(&self, z: &[f32; DIM_Z]) -> KalmanState {
        KalmanState {
            x: StateVector::from([z[0], z[1], z[2], z[3], 0.0, 0.0, 0.0]),
            p: StateCovariance::from_diagonal(&StateVector::from(INITIAL_COVARIANCE)),
        }
    }

    /// Advance the belief one time step
    pub fn predict(&self, state: &KalmanState) -> KalmanState {
        // x = F * x
        let x = self.f * state.x;
        // P = F * P * F^T + Q
        let p = self.f * state.p * self.f.transpose() + self.q;
        KalmanState { x, p }
    }

    /// Correct the belief with a measurement
    pub fn update(&self, state: &KalmanState, z: &[f32; DIM_Z]) -> Result<KalmanState> {
        // Residual: y = z - H * x
        let y = Measurement::from(*z) - self.h * state.x;

        // Innovation covariance: S = H * P * H^T + R
        let s = self.h * state.p * self.h.transpose() + self.r;

        // Kalman gain: K = P * H^T * S^-1
        let s_inv = s
            .try_inverse()
            .ok_or_else(|| anyhow::anyhow!("Failed to invert innovation covariance matrix"))?;
        let k = state.p * self.h.transpose() * s_inv;

        let x = state.x + k * y;

        // Joseph form: P = (I - K * H) * P * (I - K * H)^T + K * R * K^T
        let i_kh = StateCovariance::identity() - k * self.h;
        let p = i_kh * state.p * i_kh.transpose() + k * self.r * k.transpose();

        Ok(KalmanState { x, p })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_initiate_has_zero_velocity() {
        let model = ConstantVelocityModel::default();
        let state = model.initiate(&[5.0, 6.0, 100.0, 1.0]);
        assert_eq!(state.z(), [5.0, 6.0, 100.0, 1.0]);
        assert_eq!(state.x[4], 0.0);
        assert_eq!(state.x[5], 0.0);
        assert_eq!(state.x[6], 0.0);
    }

    #[test]
    fn test_predict_is_pure() {
        let model = ConstantVelocityModel::default();
        let mut state = model.initiate(&[0.0, 0.0, 100.0, 1.0]);
        state.x[4] = 2.0;
        state.x[5] = -1.0;
        let before = state;

        let next = model.predict(&state);
        assert_eq!(state, before);
        assert_abs_diff_eq!(next.x[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(next.x[1], -1.0, epsilon = 1e-6);
        // aspect ratio has no velocity component
        assert_abs_diff_eq!(next.x[3], 1.0, epsilon = 1e-6);
        // covariance grows
        assert!(next.p[(0, 0)] > state.p[(0, 0)]);
    }

    #[test]
    fn test_update_moves_towards_measurement() {
        let model = ConstantVelocityModel::default();
        let state = model.predict(&model.initiate(&[0.0, 0.0, 100.0, 1.0]));
        let updated = model.update(&state, &[4.0, 0.0, 100.0, 1.0]).unwrap();

        assert!(updated.x[0] > 0.0 && updated.x[0] < 4.0);
        // the unobserved x velocity picks up the motion
        assert!(updated.x[4] > 0.0);
        assert!(updated.p[(0, 0)] < state.p[(0, 0)]);
    }

    #[test]
    fn test_converges_on_constant_velocity() {
        let model = ConstantVelocityModel::default();
        let mut state = model.initiate(&[0.0, 0.0, 400.0, 1.0]);
        for step in 1..=30 {
            state = model.predict(&state);
            state = model
                .update(&state, &[3.0 * step as f32, 0.0, 400.0, 1.0])
                .unwrap();
        }
        assert_abs_diff_eq!(state.x[4], 3.0, epsilon = 0.1);
        let predicted = model.predict(&state);
        assert_abs_diff_eq!(predicted.x[0], 93.0, epsilon = 0.5);
    }
}
