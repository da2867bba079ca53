//! Closed-loop pan/tilt control from visual feedback.
//!
//! A [`Mechanism`] owns where the mount is pointing and is the only thing
//! allowed to talk to the [`ActuatorDriver`]. Each cycle a
//! [`TrackingController`] asks its [`MoveStrategy`] where the mount should go
//! next given a detected [`Point`] (or a manual [`PanTiltDelta`]) and records a
//! [`TrackingOutcome`]. A [`RunLoop`] drives the controller per captured frame
//! or on a fixed timer.
//!
//! ```
//! use pantilt::{PanTiltSetting, PanTiltDelta};
//!
//! let start = PanTiltSetting::new(95.0, 5.0);
//! let next = start.offset_by(PanTiltDelta::new(10.0, -10.0));
//! assert_eq!(next, PanTiltSetting::new(100.0, 0.0));
//! ```

pub mod capture;
pub mod config;
pub mod controller;
pub mod driver;
pub mod geometry;
pub mod mechanism;
pub mod position;
pub mod run_loop;
pub mod safety;
pub mod strategy;
pub mod telemetry;

pub use capture::{CaptureError, CaptureSource, DetectError, Detector};
pub use config::{configure, ConfigError, FailurePolicy, Session, StrategyKind, TrackingConfig};
pub use controller::{OutcomeHandle, TrackingController, TrackingError, TrackingInput, TrackingOutcome};
pub use driver::{ActuatorDriver, Axis, DriverError, LoggingDriver, ServoCalibration};
pub use geometry::{Frame, FrameGeometry, Point, Region};
pub use mechanism::{ConfirmedPosition, Mechanism, MechanismError, MechanismLease, SharedMechanism};
pub use position::{Direction, PanTiltDelta, PanTiltSetting};
pub use run_loop::{
    CommandQueue, LoopError, RunLoop, RunSummary, RunningLoop, Schedule, StopHandle, StopReason,
};
pub use safety::{validate_roi, RoiCheck};
pub use strategy::{Cue, ManualStrategy, MoveStrategy, Orientation, ProportionalStrategy, StrategyError};
pub use telemetry::{NoopTelemetry, TelemetrySink};
