//! Laser/radar fusion with an Extended Kalman Filter.
//!
//! A [`FusionEkf`] consumes timestamped [`MeasurementPackage`]s from a linear
//! position sensor (laser) and a polar range/bearing/range-rate sensor (radar)
//! and keeps a constant-velocity estimate of one object's 2D position and
//! velocity together with its covariance.
//!
//! ```
//! use fusion_tracker_rs::{FusionEkf, MeasurementPackage};
//!
//! let mut ekf = FusionEkf::default();
//! ekf.process_measurement(&MeasurementPackage::laser(1.0, 2.0, 1_000_000)).unwrap();
//! ekf.process_measurement(&MeasurementPackage::radar(2.3, 1.1, 0.5, 1_050_000)).unwrap();
//!
//! let x = ekf.state().unwrap();
//! assert!(x.iter().all(|v| v.is_finite()));
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod sensor_fusion;
pub mod sensors;
pub mod types;

pub use config::{CovarianceUpdate, FusionConfig, TimestampPolicy};
pub use error::{FusionError, FusionResult};
pub use sensor_fusion::FusionEkf;
pub use sensors::{MeasurementPackage, Observation, SensorKind};
pub use types::FusionSnapshot;
