//! Measurement packets and the ingestion boundary.
//!
//! The observation variant fixes a packet's length to its sensor kind.
//! `MeasurementPackage::new`, the serde wire form and the log parsers also
//! reject non-finite values. The `laser`/`radar` shorthands do not, so
//! `FusionEkf` runs `validate` on every packet before it touches the state.

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};
use crate::types::{LaserVec, RadarVec, MEASURE_DIM_LASER, MEASURE_DIM_RADAR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Linear position sensor (lidar): [px, py]
    #[serde(rename = "L")]
    Laser,
    /// Nonlinear polar sensor: [range, bearing, range_rate]
    #[serde(rename = "R")]
    Radar,
}

impl SensorKind {
    /// Number of values a raw observation of this kind carries
    pub fn measurement_dim(self) -> usize {
        match self {
            SensorKind::Laser => MEASURE_DIM_LASER,
            SensorKind::Radar => MEASURE_DIM_RADAR,
        }
    }

    /// Parse the single-letter tag used in recorded logs
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "L" | "l" => Some(SensorKind::Laser),
            "R" | "r" => Some(SensorKind::Radar),
            _ => None,
        }
    }
}

/// A typed observation. The variant fixes the vector dimension.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    Laser(LaserVec),
    Radar(RadarVec),
}

impl Observation {
    pub fn kind(&self) -> SensorKind {
        match self {
            Observation::Laser(_) => SensorKind::Laser,
            Observation::Radar(_) => SensorKind::Radar,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            Observation::Laser(z) => z.iter().copied().collect(),
            Observation::Radar(z) => z.iter().copied().collect(),
        }
    }
}

/// Wire form of a packet: `{"sensor": "L", "values": [px, py], "timestamp": 1477010443000000}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawPackage {
    pub sensor: SensorKind,
    pub values: Vec<f64>,
    /// Microseconds
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPackage", into = "RawPackage")]
pub struct MeasurementPackage {
    /// Microseconds
    pub timestamp: i64,
    pub observation: Observation,
}

impl MeasurementPackage {
    /// Validate a raw observation against its declared sensor kind.
    pub fn new(sensor: SensorKind, values: &[f64], timestamp: i64) -> FusionResult<Self> {
        let expected = sensor.measurement_dim();
        if values.len() != expected {
            return Err(FusionError::MalformedPacket(format!(
                "{:?} packet needs {} values, got {}",
                sensor,
                expected,
                values.len()
            )));
        }

        let observation = match sensor {
            SensorKind::Laser => Observation::Laser(LaserVec::from_column_slice(values)),
            SensorKind::Radar => Observation::Radar(RadarVec::from_column_slice(values)),
        };

        let pkg = Self {
            timestamp,
            observation,
        };
        pkg.validate()?;
        Ok(pkg)
    }

    /// Reject observations carrying NaN or infinite values.
    pub fn validate(&self) -> FusionResult<()> {
        let finite = match &self.observation {
            Observation::Laser(z) => z.iter().all(|v| v.is_finite()),
            Observation::Radar(z) => z.iter().all(|v| v.is_finite()),
        };
        if finite {
            return Ok(());
        }
        Err(FusionError::MalformedPacket(format!(
            "{:?} packet contains non-finite values {:?}",
            self.sensor_kind(),
            self.observation.values()
        )))
    }

    /// Unchecked shorthand; see `validate`.
    pub fn laser(px: f64, py: f64, timestamp: i64) -> Self {
        Self {
            timestamp,
            observation: Observation::Laser(LaserVec::new(px, py)),
        }
    }

    /// Unchecked shorthand; see `validate`.
    pub fn radar(range: f64, bearing: f64, range_rate: f64, timestamp: i64) -> Self {
        Self {
            timestamp,
            observation: Observation::Radar(RadarVec::new(range, bearing, range_rate)),
        }
    }

    pub fn sensor_kind(&self) -> SensorKind {
        self.observation.kind()
    }
}

impl TryFrom<RawPackage> for MeasurementPackage {
    type Error = FusionError;

    fn try_from(raw: RawPackage) -> Result<Self, Self::Error> {
        MeasurementPackage::new(raw.sensor, &raw.values, raw.timestamp)
    }
}

impl From<MeasurementPackage> for RawPackage {
    fn from(pkg: MeasurementPackage) -> Self {
        RawPackage {
            sensor: pkg.sensor_kind(),
            values: pkg.observation.values(),
            timestamp: pkg.timestamp,
        }
    }
}

/// Parse one line of the tab/space separated text log.
///
/// Laser: `L px py timestamp [ground truth...]`
/// Radar: `R rho phi rho_dot timestamp [ground truth...]`
///
/// Trailing columns after the timestamp are ignored.
pub fn parse_line(line: &str) -> FusionResult<MeasurementPackage> {
    let mut fields = line.split_whitespace();
    let tag = fields
        .next()
        .ok_or_else(|| FusionError::Parse("empty line".to_string()))?;
    let sensor = SensorKind::from_tag(tag)
        .ok_or_else(|| FusionError::Parse(format!("unknown sensor tag '{}'", tag)))?;

    let dim = sensor.measurement_dim();
    let mut values = Vec::with_capacity(dim);
    for _ in 0..dim {
        let field = fields.next().ok_or_else(|| {
            FusionError::MalformedPacket(format!(
                "{:?} line has fewer than {} values",
                sensor, dim
            ))
        })?;
        let value = field
            .parse::<f64>()
            .map_err(|e| FusionError::Parse(format!("bad value '{}': {}", field, e)))?;
        values.push(value);
    }

    let ts_field = fields
        .next()
        .ok_or_else(|| {
            FusionError::MalformedPacket(format!("{:?} line has no timestamp", sensor))
        })?;
    let timestamp = ts_field
        .parse::<i64>()
        .map_err(|e| FusionError::Parse(format!("bad timestamp '{}': {}", ts_field, e)))?;

    MeasurementPackage::new(sensor, &values, timestamp)
}

/// Parse one JSON line in the `RawPackage` wire form.
pub fn parse_json_line(line: &str) -> FusionResult<MeasurementPackage> {
    serde_json::from_str(line).map_err(|e| FusionError::Parse(e.to_string()))
}
