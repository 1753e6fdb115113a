//! 4-Dimensional Kalman core shared by both sensor paths
//!
//! State Vector (4D):
//! [0-1]: Position (px, py) [meters]
//! [2-3]: Velocity (vx, vy) [m/s]
//!
//! Owns the state and its covariance. `predict` propagates them through the
//! motion model; `update` corrects with a linear observation and `update_ekf`
//! with a linearized one.
use nalgebra::SMatrix;

use crate::config::CovarianceUpdate;
use crate::error::{FusionError, FusionResult};
use crate::filters::motion_model::MotionModel;
use crate::filters::observation::normalize_angle;
use crate::sensors::SensorKind;
use crate::types::{RadarJacobian, RadarNoise, RadarVec, StateMat, StateVec};

#[derive(Clone, Debug)]
pub struct KalmanCore {
    /// State vector [4D]
    state: StateVec,

    /// Covariance matrix [4x4]
    covariance: StateMat,

    covariance_update: CovarianceUpdate,
}

impl KalmanCore {
    pub fn new(
        state: StateVec,
        covariance: StateMat,
        covariance_update: CovarianceUpdate,
    ) -> Self {
        Self {
            state,
            covariance,
            covariance_update,
        }
    }

    pub fn state(&self) -> &StateVec {
        &self.state
    }

    pub fn covariance(&self) -> &StateMat {
        &self.covariance
    }

    /// Predict step: x = F * x, P = F * P * F^T + Q
    pub fn predict(&mut self, motion: &MotionModel) {
        let f = &motion.transition;
        self.state = f * self.state;
        let p = f * self.covariance * f.transpose() + motion.process_noise;

        // Force symmetry
        self.covariance = (p + p.transpose()) * 0.5;
    }

    /// Linear update: innovation y = z - H * x
    pub fn update<const M: usize>(
        &mut self,
        z: &SMatrix<f64, M, 1>,
        h: &SMatrix<f64, M, 4>,
        r: &SMatrix<f64, M, M>,
        sensor: SensorKind,
    ) -> FusionResult<()> {
        let innovation = z - h * self.state;
        self.correct(&innovation, h, r, sensor)
    }

    /// Linearized update: innovation y = z - h(x) with the bearing residual
    /// wrapped into (-π, π]. `h_jacobian` must be evaluated at the current state.
    pub fn update_ekf(
        &mut self,
        z: &RadarVec,
        predicted: &RadarVec,
        h_jacobian: &RadarJacobian,
        r: &RadarNoise,
    ) -> FusionResult<()> {
        let mut innovation = z - predicted;
        innovation[1] = normalize_angle(innovation[1]);
        self.correct(&innovation, h_jacobian, r, SensorKind::Radar)
    }

    fn correct<const M: usize>(
        &mut self,
        innovation: &SMatrix<f64, M, 1>,
        h: &SMatrix<f64, M, 4>,
        r: &SMatrix<f64, M, M>,
        sensor: SensorKind,
    ) -> FusionResult<()> {
        let p = &self.covariance;
        let h_t = h.transpose();
        let ph_t = p * h_t;

        // Innovation covariance: S = H * P * H^T + R
        let s = h * ph_t + r;
        let s_inv = s
            .try_inverse()
            .filter(|inv| inv.iter().all(|v| v.is_finite()))
            .ok_or(FusionError::SingularInnovationCovariance { sensor })?;

        // Kalman gain: K = P * H^T * S^-1
        let k = ph_t * s_inv;

        let dx = k * innovation;
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(FusionError::SingularInnovationCovariance { sensor });
        }
        self.state += dx;

        let i_minus_kh = StateMat::identity() - k * h;
        let new_p = match self.covariance_update {
            CovarianceUpdate::Standard => i_minus_kh * p,
            CovarianceUpdate::Joseph => {
                i_minus_kh * p * i_minus_kh.transpose() + k * r * k.transpose()
            }
        };

        // Symmetrize to limit numerical drift
        self.covariance = (new_p + new_p.transpose()) * 0.5;
        Ok(())
    }
}
