pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Serializable view of the filter after a processed packet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusionSnapshot {
    /// Timestamp of the last processed packet [microseconds]
    pub timestamp: i64,

    /// Position (px, py) [meters]
    pub position: (f64, f64),

    /// Velocity (vx, vy) [m/s]
    pub velocity: (f64, f64),

    /// Covariance trace for uncertainty
    pub covariance_trace: f64,

    /// Update counters
    pub laser_updates: u64,
    pub radar_updates: u64,
    pub skipped_updates: u64,
}
