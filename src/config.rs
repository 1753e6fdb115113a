use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};
use crate::types::{LaserNoise, RadarNoise, StateMat, StateVec};

/// What to do with a packet whose timestamp precedes the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Let the negative elapsed time flow into the motion model
    Accept,
    /// Return `OutOfOrderTimestamp` and leave the filter untouched
    #[default]
    Reject,
    /// Treat the packet as simultaneous with the previous one (dt = 0)
    Clamp,
}

/// Covariance correction form used by both update paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceUpdate {
    /// P = (I - K*H) * P
    #[default]
    Standard,
    /// P = (I - K*H) * P * (I - K*H)^T + K * R * K^T
    Joseph,
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    // ── Motion model ──
    pub process_noise_ax: f64,
    pub process_noise_ay: f64,

    // ── Initialization ──
    /// (vx, vy) installed when the first packet is a laser packet
    pub initial_velocity_prior: (f64, f64),
    pub initial_covariance_diag: [f64; 4],

    // ── Measurement noise ──
    pub laser_noise: [[f64; 2]; 2],
    pub radar_noise: [[f64; 3]; 3],

    // ── Numerical guards ──
    /// Ranges below this are degenerate for the radar model [meters]
    pub min_range: f64,
    pub covariance_update: CovarianceUpdate,

    // ── Packet ordering ──
    pub timestamp_policy: TimestampPolicy,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            process_noise_ax: 9.0,
            process_noise_ay: 9.0,
            initial_velocity_prior: (5.0, 0.0),
            initial_covariance_diag: [1.0, 1.0, 1.0, 1.0],
            laser_noise: [[0.0225, 0.0], [0.0, 0.0225]],
            radar_noise: [[0.09, 0.0, 0.0], [0.0, 0.0009, 0.0], [0.0, 0.0, 0.09]],
            min_range: 1e-4,
            covariance_update: CovarianceUpdate::Standard,
            timestamp_policy: TimestampPolicy::Reject,
        }
    }
}

impl FusionConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> FusionResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FusionError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: FusionConfig = serde_json::from_str(&text)
            .map_err(|e| FusionError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FusionResult<()> {
        for (name, value) in [
            ("process_noise_ax", self.process_noise_ax),
            ("process_noise_ay", self.process_noise_ay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FusionError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        let (vx, vy) = self.initial_velocity_prior;
        if !vx.is_finite() || !vy.is_finite() {
            return Err(FusionError::InvalidConfig(
                "initial_velocity_prior must be finite".to_string(),
            ));
        }

        if self
            .initial_covariance_diag
            .iter()
            .any(|v| !v.is_finite() || *v <= 0.0)
        {
            return Err(FusionError::InvalidConfig(
                "initial_covariance_diag entries must be positive".to_string(),
            ));
        }

        if !self.min_range.is_finite() || self.min_range <= 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "min_range must be positive, got {}",
                self.min_range
            )));
        }

        check_noise("laser_noise", &self.laser_noise_matrix())?;
        check_noise("radar_noise", &self.radar_noise_matrix())?;
        Ok(())
    }

    pub fn laser_noise_matrix(&self) -> LaserNoise {
        LaserNoise::from_fn(|r, c| self.laser_noise[r][c])
    }

    pub fn radar_noise_matrix(&self) -> RadarNoise {
        RadarNoise::from_fn(|r, c| self.radar_noise[r][c])
    }

    pub fn initial_covariance(&self) -> StateMat {
        StateMat::from_diagonal(&StateVec::from(self.initial_covariance_diag))
    }
}

fn check_noise<const M: usize>(
    name: &str,
    r: &nalgebra::SMatrix<f64, M, M>,
) -> FusionResult<()> {
    if r.iter().any(|v| !v.is_finite()) {
        return Err(FusionError::InvalidConfig(format!("{} has non-finite entries", name)));
    }
    for i in 0..M {
        if r[(i, i)] < 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "{} diagonal entry {} is negative",
                name, i
            )));
        }
    }
    if (r - r.transpose()).abs().max() > 1e-12 {
        return Err(FusionError::InvalidConfig(format!("{} must be symmetric", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FusionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_covariance(), StateMat::identity());
        assert_eq!(config.radar_noise_matrix()[(1, 1)], 0.0009);
        assert_eq!(config.laser_noise_matrix()[(0, 0)], 0.0225);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = FusionConfig::default();
        config.min_range = 0.0;
        assert!(matches!(config.validate(), Err(FusionError::InvalidConfig(_))));

        let mut config = FusionConfig::default();
        config.process_noise_ax = -1.0;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.radar_noise[0][1] = 0.5;
        assert!(config.validate().is_err());

        let mut config = FusionConfig::default();
        config.initial_covariance_diag[2] = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: FusionConfig =
            serde_json::from_str(r#"{"process_noise_ax": 4.0, "timestamp_policy": "clamp"}"#)
                .unwrap();
        assert_eq!(config.process_noise_ax, 4.0);
        assert_eq!(config.process_noise_ay, 9.0);
        assert_eq!(config.timestamp_policy, TimestampPolicy::Clamp);
        assert_eq!(config.covariance_update, CovarianceUpdate::Standard);
    }
}
