//! Tracking options and session setup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::controller::TrackingController;
use crate::geometry::{FrameGeometry, Region};
use crate::mechanism::SharedMechanism;
use crate::safety::validate_roi;
use crate::strategy::{ManualStrategy, MoveStrategy, Orientation, ProportionalStrategy};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown tracking strategy {0:?}, expected colour, face or manual")]
    UnknownStrategy(String),
    #[error("gain must be a positive finite number, got {0}")]
    InvalidGain(f64),
    #[error("max step must lie in (0, 100], got {0}")]
    InvalidMaxStep(f64),
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
}

/// Which tracking policy drives the mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[serde(alias = "color")]
    Colour,
    Face,
    Manual,
}

impl StrategyKind {
    /// Whether this mode is driven by camera frames rather than a timer.
    pub fn needs_camera(&self) -> bool {
        !matches!(self, StrategyKind::Manual)
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "colour" | "color" => Ok(StrategyKind::Colour),
            "face" => Ok(StrategyKind::Face),
            "manual" | "joystick" => Ok(StrategyKind::Manual),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StrategyKind::Colour => "colour",
            StrategyKind::Face => "face",
            StrategyKind::Manual => "manual",
        })
    }
}

/// What a run loop does when the actuator reports a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Stop,
    Continue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub strategy: StrategyKind,
    /// Proportional constant applied to the normalized offset.
    pub gain: f64,
    /// Largest change in percentage points per cycle.
    pub max_step: f64,
    /// Pixel tolerance around the centre treated as centred.
    pub deadband: u32,
    pub roi: Region,
    pub orientation: Orientation,
    pub timer_period_ms: u64,
    pub frame_timeout_ms: u64,
    pub on_actuator_failure: FailurePolicy,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Colour,
            gain: 1.0,
            max_step: 5.0,
            deadband: 0,
            roi: Region::EMPTY,
            orientation: Orientation::default(),
            timer_period_ms: 100,
            frame_timeout_ms: 2000,
            on_actuator_failure: FailurePolicy::Stop,
        }
    }
}

impl TrackingConfig {
    pub fn timer_period(&self) -> Duration {
        Duration::from_millis(self.timer_period_ms)
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    /// Reject option values that cannot drive the mount safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(ConfigError::InvalidGain(self.gain));
        }
        if !self.max_step.is_finite() || self.max_step <= 0.0 || self.max_step > 100.0 {
            return Err(ConfigError::InvalidMaxStep(self.max_step));
        }
        if self.timer_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod("timer period"));
        }
        if self.frame_timeout_ms == 0 {
            return Err(ConfigError::ZeroPeriod("frame timeout"));
        }
        Ok(())
    }

    pub fn build_strategy(&self) -> Box<dyn MoveStrategy> {
        match self.strategy {
            StrategyKind::Manual => Box::new(ManualStrategy),
            kind => Box::new(
                ProportionalStrategy::new(kind.to_string(), self.gain, self.max_step)
                    .with_deadband(self.deadband)
                    .with_orientation(self.orientation),
            ),
        }
    }
}

/// A validated configuration bound to one capture session.
pub struct Session {
    pub config: TrackingConfig,
    pub geometry: FrameGeometry,
    pub strategy: Box<dyn MoveStrategy>,
    pub warnings: Vec<String>,
}

impl Session {
    pub fn into_controller(self, mechanism: SharedMechanism) -> TrackingController {
        TrackingController::new(self.strategy, mechanism, self.geometry)
    }
}

/// Validate `config` for frames of `geometry` and build its strategy.
///
/// An oversized region of interest is corrected with a warning; anything
/// else invalid fails before a loop can start.
pub fn configure(mut config: TrackingConfig, geometry: FrameGeometry) -> Result<Session, ConfigError> {
    config.validate()?;
    let mut warnings = Vec::new();
    let check = validate_roi(config.roi, geometry);
    config.roi = check.region;
    warnings.extend(check.warning);
    let strategy = config.build_strategy();
    info!(
        strategy = %config.strategy,
        gain = config.gain,
        max_step = config.max_step,
        deadband = config.deadband,
        roi = %config.roi,
        %geometry,
        "tracking configured"
    );
    Ok(Session {
        config,
        geometry,
        strategy,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_names() {
        assert_eq!("Colour".parse::<StrategyKind>().unwrap(), StrategyKind::Colour);
        assert_eq!("color".parse::<StrategyKind>().unwrap(), StrategyKind::Colour);
        assert_eq!(" face ".parse::<StrategyKind>().unwrap(), StrategyKind::Face);
        assert_eq!("manual".parse::<StrategyKind>().unwrap(), StrategyKind::Manual);
    }

    #[test]
    fn unknown_strategy_fails() {
        assert_eq!(
            "servosort".parse::<StrategyKind>(),
            Err(ConfigError::UnknownStrategy("servosort".into()))
        );
    }

    #[test]
    fn default_config_is_valid() {
        assert!(TrackingConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: TrackingConfig =
            serde_json::from_str(r#"{"strategy":"face","gain":0.5}"#).unwrap();
        assert_eq!(config.strategy, StrategyKind::Face);
        assert_eq!(config.gain, 0.5);
        assert_eq!(config.max_step, 5.0);
    }
}
