// sensor_fusion.rs: orchestration layer for the laser/radar EKF
//
// Everything in this module is independent of:
//   - how packets are transported or parsed
//   - file I/O, logging sinks, output formatting
//
// It takes validated measurement packets in and keeps one state estimate.
// Each tracked object needs its own `FusionEkf`; nothing here is shared.

use crate::config::{FusionConfig, TimestampPolicy};
use crate::error::{FusionError, FusionResult};
use crate::filters::{
    KalmanCore, LaserSensor, MotionModel, MotionModelCache, RadarSensor, SensorAdapter,
};
use crate::sensors::{MeasurementPackage, Observation, SensorKind};
use crate::types::{FusionSnapshot, StateMat, StateVec};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

// ─── The main fusion struct ──────────────────────────────────────────────────

pub struct FusionEkf {
    config: FusionConfig,

    // `None` until the first packet arrives
    core: Option<KalmanCore>,

    motion: MotionModelCache,
    laser: LaserSensor,
    radar: RadarSensor,

    previous_timestamp: i64,

    // Counters
    laser_updates: u64,
    radar_updates: u64,
    skipped_updates: u64,
}

impl FusionEkf {
    pub fn new(config: FusionConfig) -> FusionResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: FusionConfig) -> Self {
        Self {
            motion: MotionModelCache::new(config.process_noise_ax, config.process_noise_ay),
            laser: LaserSensor::new(config.laser_noise_matrix()),
            radar: RadarSensor::new(config.radar_noise_matrix(), config.min_range),
            core: None,
            previous_timestamp: 0,
            laser_updates: 0,
            radar_updates: 0,
            skipped_updates: 0,
            config,
        }
    }

    /// Run one packet through the filter.
    ///
    /// Packets with non-finite values are rejected before anything changes.
    /// The first valid packet only initializes the state. Every later packet runs
    /// one predict and one sensor update. When the update is skipped
    /// (degenerate geometry, singular innovation covariance) the state is held
    /// at its predicted value, the timestamp is still consumed, and the error is
    /// returned.
    pub fn process_measurement(&mut self, pkg: &MeasurementPackage) -> FusionResult<()> {
        if let Err(err) = pkg.validate() {
            log::warn!("Rejected packet at {} us: {}", pkg.timestamp, err);
            return Err(err);
        }

        let core = match self.core.as_mut() {
            Some(core) => core,
            None => {
                self.initialize(pkg);
                return Ok(());
            }
        };

        let dt = match elapsed_seconds(
            self.previous_timestamp,
            pkg.timestamp,
            self.config.timestamp_policy,
        ) {
            Ok(dt) => dt,
            Err(err) => {
                log::warn!("Rejected packet: {}", err);
                return Err(err);
            }
        };

        core.predict(self.motion.model_for(dt));

        let kind = pkg.sensor_kind();
        let adapter: &dyn SensorAdapter = match kind {
            SensorKind::Laser => &self.laser,
            SensorKind::Radar => &self.radar,
        };
        let result = adapter.correct(core, &pkg.observation);

        self.previous_timestamp = match self.config.timestamp_policy {
            TimestampPolicy::Clamp => self.previous_timestamp.max(pkg.timestamp),
            _ => pkg.timestamp,
        };

        match result {
            Ok(()) => {
                match kind {
                    SensorKind::Laser => self.laser_updates += 1,
                    SensorKind::Radar => self.radar_updates += 1,
                }
                Ok(())
            }
            Err(err) => {
                self.skipped_updates += 1;
                log::warn!(
                    "Skipped {:?} update at {} us (state held at prediction): {}",
                    kind,
                    pkg.timestamp,
                    err
                );
                Err(err)
            }
        }
    }

    fn initialize(&mut self, pkg: &MeasurementPackage) {
        let state = match &pkg.observation {
            Observation::Radar(z) => {
                let (rho, phi, rho_dot) = (z[0], z[1], z[2]);
                StateVec::new(
                    rho * phi.cos(),
                    rho * phi.sin(),
                    rho_dot * phi.cos(),
                    rho_dot * phi.sin(),
                )
            }
            Observation::Laser(z) => {
                let (vx, vy) = self.config.initial_velocity_prior;
                StateVec::new(z[0], z[1], vx, vy)
            }
        };

        log::debug!(
            "EKF initialized from {:?} packet at {} us: [{:.3}, {:.3}, {:.3}, {:.3}]",
            pkg.sensor_kind(),
            pkg.timestamp,
            state[0],
            state[1],
            state[2],
            state[3]
        );

        self.core = Some(KalmanCore::new(
            state,
            self.config.initial_covariance(),
            self.config.covariance_update,
        ));
        self.previous_timestamp = pkg.timestamp;
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Current state [px, py, vx, vy], once initialized
    pub fn state(&self) -> Option<&StateVec> {
        self.core.as_ref().map(KalmanCore::state)
    }

    pub fn covariance(&self) -> Option<&StateMat> {
        self.core.as_ref().map(KalmanCore::covariance)
    }

    pub fn previous_timestamp(&self) -> i64 {
        self.previous_timestamp
    }

    /// Elapsed time the motion model was last built for
    pub fn cached_dt(&self) -> Option<f64> {
        self.motion.cached_dt()
    }

    pub fn motion_model(&self) -> &MotionModel {
        self.motion.model()
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Option<FusionSnapshot> {
        let core = self.core.as_ref()?;
        let x = core.state();
        Some(FusionSnapshot {
            timestamp: self.previous_timestamp,
            position: (x[0], x[1]),
            velocity: (x[2], x[3]),
            covariance_trace: core.covariance().trace(),
            laser_updates: self.laser_updates,
            radar_updates: self.radar_updates,
            skipped_updates: self.skipped_updates,
        })
    }
}

impl Default for FusionEkf {
    fn default() -> Self {
        Self::build(FusionConfig::default())
    }
}

/// Seconds between two microsecond timestamps, with the ordering policy applied.
fn elapsed_seconds(previous: i64, current: i64, policy: TimestampPolicy) -> FusionResult<f64> {
    let delta = current.saturating_sub(previous);
    if delta < 0 {
        match policy {
            TimestampPolicy::Accept => {}
            TimestampPolicy::Reject => {
                return Err(FusionError::OutOfOrderTimestamp { previous, current });
            }
            TimestampPolicy::Clamp => return Ok(0.0),
        }
    }
    Ok(delta as f64 / MICROS_PER_SECOND)
}
