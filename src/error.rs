use thiserror::Error;

use crate::sensors::SensorKind;

/// Fusion filter error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Degenerate geometry: range {range:.3e} too close to the sensor origin")]
    DegenerateGeometry { range: f64 },

    #[error("Innovation covariance is singular ({sensor:?} update)")]
    SingularInnovationCovariance { sensor: SensorKind },

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    #[error("Out-of-order timestamp: {current} us arrived after {previous} us")]
    OutOfOrderTimestamp { previous: i64, current: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FusionError {
    /// True for numerical conditions where only the current update is skipped
    /// and the filter keeps running.
    pub fn is_skipped_update(&self) -> bool {
        matches!(
            self,
            FusionError::DegenerateGeometry { .. }
                | FusionError::SingularInnovationCovariance { .. }
        )
    }
}

/// Result type for filter operations
pub type FusionResult<T> = Result<T, FusionError>;
