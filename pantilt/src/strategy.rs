//! Policies turning one cycle's cue into the next desired position.
//!
//! Strategies are pure: they never touch the mechanism. The controller decides
//! whether the returned position warrants a move.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{FrameGeometry, Point};
use crate::position::{PanTiltDelta, PanTiltSetting};

/// What one cycle has to react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cue {
    /// A detector found the target at this pixel.
    Target(Point),
    /// A manual move was requested.
    Command(PanTiltDelta),
    /// Nothing detected and nothing requested.
    Nothing,
}

impl Cue {
    pub fn target(&self) -> Option<Point> {
        match self {
            Cue::Target(p) => Some(*p),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<PanTiltDelta> {
        match self {
            Cue::Command(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<Option<Point>> for Cue {
    fn from(target: Option<Point>) -> Self {
        target.map_or(Cue::Nothing, Cue::Target)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StrategyError {
    #[error("frame geometry {0} is unknown, cannot locate centre")]
    IndeterminateGeometry(FrameGeometry),
}

/// Maps the current position and a cue to the next desired position.
pub trait MoveStrategy: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn next_position(
        &self,
        current: PanTiltSetting,
        cue: &Cue,
        geometry: FrameGeometry,
    ) -> Result<PanTiltSetting, StrategyError>;
}

/// How screen offsets map onto servo travel for a particular mounting.
///
/// A sign of `1.0` means a target right of (or below) centre increases pan
/// (or tilt); `-1.0` reverses that axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pan_sign: f64,
    pub tilt_sign: f64,
}

impl Orientation {
    pub fn new(pan_sign: f64, tilt_sign: f64) -> Self {
        let unit = |s: f64| if s < 0.0 { -1.0 } else { 1.0 };
        Self {
            pan_sign: unit(pan_sign),
            tilt_sign: unit(tilt_sign),
        }
    }
}

impl Default for Orientation {
    /// Servo horns facing the camera: tilt travel runs opposite to image rows.
    fn default() -> Self {
        Self::new(1.0, -1.0)
    }
}

/// Proportional step toward a detected target, used for colour and face
/// tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct ProportionalStrategy {
    label: String,
    pub gain: f64,
    pub max_step: f64,
    pub deadband: u32,
    pub orientation: Orientation,
}

impl ProportionalStrategy {
    pub fn new(label: impl Into<String>, gain: f64, max_step: f64) -> Self {
        Self {
            label: label.into(),
            gain,
            max_step,
            deadband: 0,
            orientation: Orientation::default(),
        }
    }

    pub fn with_deadband(mut self, deadband: u32) -> Self {
        self.deadband = deadband;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Step in percentage points for a pixel offset along an axis of `extent`
    /// pixels.
    fn step(&self, offset: i64, extent: u32, sign: f64) -> f64 {
        if offset.unsigned_abs() <= u64::from(self.deadband) {
            return 0.0;
        }
        let half = extent as f64 / 2.0;
        let normalized = (offset as f64 / half).clamp(-1.0, 1.0);
        (normalized * self.gain).clamp(-1.0, 1.0) * self.max_step * sign
    }
}

impl MoveStrategy for ProportionalStrategy {
    fn name(&self) -> &str {
        &self.label
    }

    fn next_position(
        &self,
        current: PanTiltSetting,
        cue: &Cue,
        geometry: FrameGeometry,
    ) -> Result<PanTiltSetting, StrategyError> {
        let Cue::Target(target) = cue else {
            return Ok(current);
        };
        let centre = geometry
            .centre()
            .ok_or(StrategyError::IndeterminateGeometry(geometry))?;
        let delta = PanTiltDelta::new(
            self.step(
                i64::from(target.x) - i64::from(centre.x),
                geometry.width,
                self.orientation.pan_sign,
            ),
            self.step(
                i64::from(target.y) - i64::from(centre.y),
                geometry.height,
                self.orientation.tilt_sign,
            ),
        );
        if delta.is_zero() {
            return Ok(current);
        }
        Ok(current.offset_by(delta))
    }
}

/// Joystick style control: applies the commanded delta and ignores targets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualStrategy;

impl MoveStrategy for ManualStrategy {
    fn name(&self) -> &str {
        "manual"
    }

    fn next_position(
        &self,
        current: PanTiltSetting,
        cue: &Cue,
        _geometry: FrameGeometry,
    ) -> Result<PanTiltSetting, StrategyError> {
        Ok(match cue {
            Cue::Command(delta) => current.offset_by(*delta),
            _ => current,
        })
    }
}
