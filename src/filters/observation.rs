//! Radar observation model: h(x), its Jacobian, and angle wrapping.
//!
//! h(x) = [range, bearing, range_rate] with
//! - range      = sqrt(px² + py²)
//! - bearing    = atan2(py, px)
//! - range_rate = (px·vx + py·vy) / range
//!
//! Both h(x) and its Jacobian divide by the range, so states closer to the
//! sensor origin than `min_range` are rejected with `DegenerateGeometry`.

use std::f64::consts::{PI, TAU};

use crate::error::{FusionError, FusionResult};
use crate::types::{RadarJacobian, RadarVec, StateVec};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservationLinearizer {
    /// Ranges below this are treated as degenerate [meters]
    pub min_range: f64,
}

impl ObservationLinearizer {
    pub fn new(min_range: f64) -> Self {
        Self { min_range }
    }

    fn range_of(&self, x: &StateVec) -> FusionResult<f64> {
        let range = x[0].hypot(x[1]);
        if range.is_nan() || range < self.min_range {
            return Err(FusionError::DegenerateGeometry { range });
        }
        Ok(range)
    }

    /// Predicted radar measurement h(x)
    pub fn observe(&self, x: &StateVec) -> FusionResult<RadarVec> {
        let range = self.range_of(x)?;
        let (px, py, vx, vy) = (x[0], x[1], x[2], x[3]);

        Ok(RadarVec::new(
            range,
            py.atan2(px),
            (px * vx + py * vy) / range,
        ))
    }

    /// 3×4 Jacobian of h with respect to (px, py, vx, vy), evaluated at `x`
    pub fn jacobian(&self, x: &StateVec) -> FusionResult<RadarJacobian> {
        let c2 = self.range_of(x)?;
        let (px, py, vx, vy) = (x[0], x[1], x[2], x[3]);
        let c1 = c2 * c2;
        let c3 = c1 * c2;

        Ok(RadarJacobian::new(
            px / c2,
            py / c2,
            0.0,
            0.0,
            -py / c1,
            px / c1,
            0.0,
            0.0,
            py * (vx * py - vy * px) / c3,
            px * (vy * px - vx * py) / c3,
            px / c2,
            py / c2,
        ))
    }
}

/// Wrap an angle into (-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}
