use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest legal percentage for either axis.
pub const MIN_PERCENT: f64 = 0.0;
/// Highest legal percentage for either axis.
pub const MAX_PERCENT: f64 = 100.0;
/// Percentage the mount starts at on both axes.
pub const CENTRE_PERCENT: f64 = 50.0;

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return CENTRE_PERCENT;
    }
    value.clamp(MIN_PERCENT, MAX_PERCENT)
}

/// Pan and tilt of the mount expressed as percentages of travel.
///
/// Both fields always lie in `[0, 100]`. Values are clamped on the way in, so
/// there is no way to hold an out-of-range setting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSetting", into = "RawSetting")]
pub struct PanTiltSetting {
    pan: f64,
    tilt: f64,
}

#[derive(Serialize, Deserialize)]
struct RawSetting {
    pan: f64,
    tilt: f64,
}

impl From<RawSetting> for PanTiltSetting {
    fn from(raw: RawSetting) -> Self {
        Self::new(raw.pan, raw.tilt)
    }
}

impl From<PanTiltSetting> for RawSetting {
    fn from(setting: PanTiltSetting) -> Self {
        Self {
            pan: setting.pan,
            tilt: setting.tilt,
        }
    }
}

impl PanTiltSetting {
    /// Both axes at mid travel.
    pub const CENTRE: Self = Self {
        pan: CENTRE_PERCENT,
        tilt: CENTRE_PERCENT,
    };

    /// Create a setting, clamping each axis into `[0, 100]`.
    ///
    /// `NaN` is treated as the centre of travel.
    pub fn new(pan: f64, tilt: f64) -> Self {
        Self {
            pan: clamp_percent(pan),
            tilt: clamp_percent(tilt),
        }
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Percentage on the given axis.
    pub fn on(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Pan => self.pan,
            Direction::Tilt => self.tilt,
        }
    }

    /// Return a new setting moved by `delta`, clamped into range.
    pub fn offset_by(self, delta: PanTiltDelta) -> Self {
        Self::new(self.pan + delta.pan, self.tilt + delta.tilt)
    }
}

impl Default for PanTiltSetting {
    fn default() -> Self {
        Self::CENTRE
    }
}

impl fmt::Display for PanTiltSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pan={:.1}%, Tilt={:.1}%", self.pan, self.tilt)
    }
}

/// One of the two axes of the mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Pan,
    Tilt,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Pan => f.write_str("pan"),
            Direction::Tilt => f.write_str("tilt"),
        }
    }
}

/// Relative move in percentage points, e.g. from a joystick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PanTiltDelta {
    pub pan: f64,
    pub tilt: f64,
}

impl PanTiltDelta {
    pub fn new(pan: f64, tilt: f64) -> Self {
        Self { pan, tilt }
    }

    /// Move of `units` along a single axis.
    pub fn along(direction: Direction, units: f64) -> Self {
        match direction {
            Direction::Pan => Self::new(units, 0.0),
            Direction::Tilt => Self::new(0.0, units),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.pan == 0.0 && self.tilt == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_into_range() {
        let s = PanTiltSetting::new(-20.0, 250.0);
        assert_eq!(s.pan(), 0.0);
        assert_eq!(s.tilt(), 100.0);
    }

    #[test]
    fn extreme_inputs_stay_in_range() {
        for v in [f64::NEG_INFINITY, -1e12, -0.0, 0.0, 42.5, 100.0, 1e12, f64::INFINITY, f64::NAN] {
            let s = PanTiltSetting::new(v, v);
            assert!((0.0..=100.0).contains(&s.pan()), "pan {v}");
            assert!((0.0..=100.0).contains(&s.tilt()), "tilt {v}");
        }
    }

    #[test]
    fn nan_means_centre() {
        assert_eq!(PanTiltSetting::new(f64::NAN, 10.0).pan(), 50.0);
    }

    #[test]
    fn offset_leaves_original_untouched() {
        let start = PanTiltSetting::CENTRE;
        let moved = start.offset_by(PanTiltDelta::new(10.0, -10.0));
        assert_eq!(start, PanTiltSetting::new(50.0, 50.0));
        assert_eq!(moved, PanTiltSetting::new(60.0, 40.0));
    }

    #[test]
    fn offset_saturates_at_bounds() {
        let moved = PanTiltSetting::new(95.0, 5.0).offset_by(PanTiltDelta::new(10.0, -10.0));
        assert_eq!(moved, PanTiltSetting::new(100.0, 0.0));
    }

    #[test]
    fn deserialization_clamps() {
        let s: PanTiltSetting = serde_json::from_str(r#"{"pan":120.0,"tilt":-3.0}"#).unwrap();
        assert_eq!(s, PanTiltSetting::new(100.0, 0.0));
    }

    #[test]
    fn delta_along_axis() {
        assert_eq!(PanTiltDelta::along(Direction::Tilt, -5.0), PanTiltDelta::new(0.0, -5.0));
        assert!(PanTiltDelta::default().is_zero());
    }
}
