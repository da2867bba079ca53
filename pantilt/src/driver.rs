use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::position::{Direction, MAX_PERCENT};

/// Servo channel addressed by the driver.
pub type Axis = Direction;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriverError {
    #[error("failed writing {axis} pulse {pulse}: {reason}")]
    Write {
        axis: Axis,
        pulse: u16,
        reason: String,
    },
    #[error("actuator device unavailable: {0}")]
    Unavailable(String),
}

/// Low level servo output, e.g. a PWM controller on an I2C bus.
///
/// Only the [`Mechanism`](crate::Mechanism) calls this.
#[async_trait]
pub trait ActuatorDriver: Send + Sync {
    async fn set_pulse(&self, axis: Axis, pulse: u16) -> Result<(), DriverError>;
}

/// Linear mapping from percentage of travel to a servo pulse value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoCalibration {
    pub min_pulse: u16,
    pub max_pulse: u16,
}

impl ServoCalibration {
    pub fn new(min_pulse: u16, max_pulse: u16) -> Self {
        Self {
            min_pulse,
            max_pulse,
        }
    }

    /// Pulse for a percentage in `[0, 100]`.
    pub fn pulse_for(&self, percent: f64) -> u16 {
        let span = self.max_pulse as f64 - self.min_pulse as f64;
        let pulse = self.min_pulse as f64 + span * (percent / MAX_PERCENT);
        pulse.round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Default for ServoCalibration {
    /// 12-bit PWM counts at 50Hz covering roughly 0.7ms to 2.9ms.
    fn default() -> Self {
        Self::new(150, 600)
    }
}

/// Driver used when no hardware is attached. It only logs.
#[derive(Clone, Debug, Default)]
pub struct LoggingDriver;

#[async_trait]
impl ActuatorDriver for LoggingDriver {
    async fn set_pulse(&self, axis: Axis, pulse: u16) -> Result<(), DriverError> {
        info!(%axis, pulse, "fake actuator pulse");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_endpoints() {
        let cal = ServoCalibration::default();
        assert_eq!(cal.pulse_for(0.0), 150);
        assert_eq!(cal.pulse_for(100.0), 600);
        assert_eq!(cal.pulse_for(50.0), 375);
    }

    #[test]
    fn inverted_calibration() {
        let cal = ServoCalibration::new(600, 200);
        assert_eq!(cal.pulse_for(0.0), 600);
        assert_eq!(cal.pulse_for(25.0), 500);
    }

    #[tokio::test]
    async fn logging_driver_accepts_everything() {
        assert!(LoggingDriver.set_pulse(Axis::Pan, 375).await.is_ok());
    }
}
