//! Constant-velocity motion model
//!
//! State Vector (4D):
//! [0-1]: Position (px, py) [meters]
//! [2-3]: Velocity (vx, vy) [m/s]
//!
//! F couples velocity into position over the elapsed time; Q is the
//! discretized white-noise-acceleration covariance.
use crate::types::StateMat;

#[derive(Clone, Debug, PartialEq)]
pub struct MotionModel {
    /// Elapsed time the matrices were built for [seconds]
    pub dt: f64,

    /// State transition matrix [4x4]
    pub transition: StateMat,

    /// Process noise matrix [4x4]
    pub process_noise: StateMat,
}

impl MotionModel {
    /// F = I with no time coupling, Q = 0
    pub fn identity() -> Self {
        Self {
            dt: 0.0,
            transition: StateMat::identity(),
            process_noise: StateMat::zeros(),
        }
    }

    /// Build F and Q for an elapsed time and the two acceleration noise constants.
    pub fn configure(dt: f64, noise_ax: f64, noise_ay: f64) -> Self {
        let mut f = StateMat::identity();
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;

        Self {
            dt,
            transition: f,
            process_noise: Self::build_process_noise(dt, noise_ax, noise_ay),
        }
    }

    fn build_process_noise(dt: f64, noise_ax: f64, noise_ay: f64) -> StateMat {
        let dt_2 = dt * dt;
        let dt_3 = dt_2 * dt;
        let dt_4 = dt_3 * dt;

        let mut q = StateMat::zeros();

        // Position
        q[(0, 0)] = dt_4 / 4.0 * noise_ax;
        q[(1, 1)] = dt_4 / 4.0 * noise_ay;

        // Position / velocity cross terms
        q[(0, 2)] = dt_3 / 2.0 * noise_ax;
        q[(2, 0)] = dt_3 / 2.0 * noise_ax;
        q[(1, 3)] = dt_3 / 2.0 * noise_ay;
        q[(3, 1)] = dt_3 / 2.0 * noise_ay;

        // Velocity
        q[(2, 2)] = dt_2 * noise_ax;
        q[(3, 3)] = dt_2 * noise_ay;

        q
    }
}

/// Memoizes the motion model on the last elapsed time.
///
/// Rebuilding only when dt changes is an optimization; `MotionModel::configure`
/// is pure, so a miss and a hit produce the same matrices.
#[derive(Clone, Debug)]
pub struct MotionModelCache {
    model: MotionModel,
    cached_dt: Option<f64>,
    noise_ax: f64,
    noise_ay: f64,
    rebuilds: u64,
}

impl MotionModelCache {
    pub fn new(noise_ax: f64, noise_ay: f64) -> Self {
        Self {
            model: MotionModel::identity(),
            cached_dt: None,
            noise_ax,
            noise_ay,
            rebuilds: 0,
        }
    }

    /// Model for `dt`, rebuilt only when `dt` differs from the cached one.
    pub fn model_for(&mut self, dt: f64) -> &MotionModel {
        if self.cached_dt != Some(dt) {
            self.model = MotionModel::configure(dt, self.noise_ax, self.noise_ay);
            self.cached_dt = Some(dt);
            self.rebuilds += 1;
            log::debug!("Motion model rebuilt for dt={:.6}s", dt);
        }
        &self.model
    }

    pub fn cached_dt(&self) -> Option<f64> {
        self.cached_dt
    }

    pub fn model(&self) -> &MotionModel {
        &self.model
    }

    /// Number of times F and Q were recomputed
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
