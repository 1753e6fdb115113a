pub mod kalman;
pub mod motion_model;
pub mod observation;
pub mod sensor;

pub use kalman::KalmanCore;
pub use motion_model::{MotionModel, MotionModelCache};
pub use observation::{normalize_angle, ObservationLinearizer};
pub use sensor::{LaserSensor, RadarSensor, SensorAdapter};
