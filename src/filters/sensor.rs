//! Sensor adapters: each sensor path hands its own (H or linearizer, R)
//! pair to the Kalman core.

use crate::error::{FusionError, FusionResult};
use crate::filters::kalman::KalmanCore;
use crate::filters::observation::ObservationLinearizer;
use crate::sensors::{Observation, SensorKind};
use crate::types::{LaserMatrix, LaserNoise, LaserVec, RadarNoise, RadarVec};

/// Measurement correction for one sensor kind.
pub trait SensorAdapter {
    fn kind(&self) -> SensorKind;

    /// Correct the core with one observation of this sensor's kind.
    fn correct(&self, core: &mut KalmanCore, observation: &Observation) -> FusionResult<()>;
}

fn mismatched(adapter: SensorKind, observation: &Observation) -> FusionError {
    FusionError::MalformedPacket(format!(
        "{:?} adapter received a {:?} observation",
        adapter,
        observation.kind()
    ))
}

/// Linear position sensor: z = H * x with constant H
#[derive(Clone, Debug)]
pub struct LaserSensor {
    pub h: LaserMatrix,
    pub r: LaserNoise,
}

impl LaserSensor {
    pub fn new(r: LaserNoise) -> Self {
        Self {
            h: LaserMatrix::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            r,
        }
    }

    pub fn update(&self, core: &mut KalmanCore, z: &LaserVec) -> FusionResult<()> {
        core.update(z, &self.h, &self.r, SensorKind::Laser)
    }
}

impl SensorAdapter for LaserSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Laser
    }

    fn correct(&self, core: &mut KalmanCore, observation: &Observation) -> FusionResult<()> {
        match observation {
            Observation::Laser(z) => self.update(core, z),
            other => Err(mismatched(self.kind(), other)),
        }
    }
}

/// Polar sensor: z = h(x), linearized at the current state on every update
#[derive(Clone, Debug)]
pub struct RadarSensor {
    pub linearizer: ObservationLinearizer,
    pub r: RadarNoise,
}

impl RadarSensor {
    pub fn new(r: RadarNoise, min_range: f64) -> Self {
        Self {
            linearizer: ObservationLinearizer::new(min_range),
            r,
        }
    }

    pub fn update(&self, core: &mut KalmanCore, z: &RadarVec) -> FusionResult<()> {
        let x = *core.state();
        let predicted = self.linearizer.observe(&x)?;
        let h_jacobian = self.linearizer.jacobian(&x)?;
        core.update_ekf(z, &predicted, &h_jacobian, &self.r)
    }
}

impl SensorAdapter for RadarSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Radar
    }

    fn correct(&self, core: &mut KalmanCore, observation: &Observation) -> FusionResult<()> {
        match observation {
            Observation::Radar(z) => self.update(core, z),
            other => Err(mismatched(self.kind(), other)),
        }
    }
}
