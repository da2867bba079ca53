use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::{Frame, FrameGeometry, Point};
use crate::mechanism::{MechanismError, SharedMechanism};
use crate::position::{PanTiltDelta, PanTiltSetting};
use crate::strategy::{Cue, MoveStrategy};
use crate::telemetry::TelemetrySink;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Mechanism(#[from] MechanismError),
}

/// Everything one control cycle reacts to.
#[derive(Clone, Debug)]
pub struct TrackingInput {
    pub cue: Cue,
    pub frame: Option<Frame>,
    /// When work on this cycle began. The outcome's `elapsed` counts from here.
    pub started: Instant,
}

impl TrackingInput {
    /// Result of running a detector; `None` when it found nothing.
    pub fn detection(target: Option<Point>) -> Self {
        Self {
            cue: Cue::from(target),
            frame: None,
            started: Instant::now(),
        }
    }

    pub fn command(delta: PanTiltDelta) -> Self {
        Self {
            cue: Cue::Command(delta),
            frame: None,
            started: Instant::now(),
        }
    }

    pub fn nothing() -> Self {
        Self {
            cue: Cue::Nothing,
            frame: None,
            started: Instant::now(),
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Count the cycle from `started`, e.g. before detection ran.
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

/// Record of a single control cycle.
///
/// `prior` and `now` are copies, so later moves never rewrite history.
#[derive(Clone, Debug, Serialize)]
pub struct TrackingOutcome {
    pub at: DateTime<Utc>,
    pub strategy: String,
    pub prior: PanTiltSetting,
    pub now: PanTiltSetting,
    pub target: Option<Point>,
    pub command: Option<PanTiltDelta>,
    pub moved: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    #[serde(skip)]
    pub frame: Option<Frame>,
}

impl fmt::Display for TrackingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionPrior={}, ", self.prior)?;
        match (self.target, self.command) {
            (Some(t), _) => write!(f, "Target={t}, ")?,
            (None, Some(c)) => write!(f, "Command=({:+.1}, {:+.1}), ", c.pan, c.tilt)?,
            (None, None) => f.write_str("Target=none, ")?,
        }
        write!(f, "PositionNow={}", self.now)
    }
}

/// Shared read-only view of the most recent outcome.
#[derive(Clone, Default)]
pub struct OutcomeHandle(Arc<RwLock<Option<TrackingOutcome>>>);

impl OutcomeHandle {
    pub fn latest(&self) -> Option<TrackingOutcome> {
        self.0.read().ok().and_then(|o| o.clone())
    }

    fn store(&self, outcome: TrackingOutcome) {
        if let Ok(mut slot) = self.0.write() {
            *slot = Some(outcome);
        }
    }
}

/// Applies one strategy to a mechanism, one cycle at a time.
pub struct TrackingController {
    strategy: Box<dyn MoveStrategy>,
    mechanism: SharedMechanism,
    geometry: FrameGeometry,
    sinks: Vec<Arc<dyn TelemetrySink>>,
    last: OutcomeHandle,
    keep_frames: bool,
    cycles: u64,
}

impl TrackingController {
    pub fn new(
        strategy: Box<dyn MoveStrategy>,
        mechanism: SharedMechanism,
        geometry: FrameGeometry,
    ) -> Self {
        debug!(centre = ?geometry.centre(), %geometry, "controller created");
        Self {
            strategy,
            mechanism,
            geometry,
            sinks: Vec::new(),
            last: OutcomeHandle::default(),
            keep_frames: false,
            cycles: 0,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Attach each cycle's frame to its outcome for image streaming.
    pub fn keep_frames(mut self, keep: bool) -> Self {
        self.keep_frames = keep;
        self
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn mechanism(&self) -> &SharedMechanism {
        &self.mechanism
    }

    /// Cycles processed successfully.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_outcome(&self) -> Option<TrackingOutcome> {
        self.last.latest()
    }

    pub fn outcome_handle(&self) -> OutcomeHandle {
        self.last.clone()
    }

    /// Run one control cycle.
    ///
    /// A missing target or unknown geometry holds position and still yields an
    /// outcome. Only an actuator failure is an error.
    pub async fn process(&mut self, input: TrackingInput) -> Result<TrackingOutcome, TrackingError> {
        let (prior, now, moved) = {
            let mut mechanism = self.mechanism.lock().await;
            let prior = mechanism.current_position();
            let unconfirmed = mechanism.confirmed().setting().is_none();
            match self
                .strategy
                .next_position(prior, &input.cue, self.geometry)
            {
                Ok(next) if next != prior || unconfirmed => {
                    let moved = mechanism.move_to(next).await?;
                    (prior, mechanism.current_position(), moved)
                }
                Ok(_) => (prior, prior, false),
                Err(e) => {
                    warn!(error = %e, strategy = self.strategy.name(), "holding position");
                    (prior, prior, false)
                }
            }
        };

        let outcome = TrackingOutcome {
            at: Utc::now(),
            strategy: self.strategy.name().to_string(),
            prior,
            now,
            target: input.cue.target(),
            command: input.cue.command(),
            moved,
            elapsed: input.started.elapsed(),
            frame: if self.keep_frames { input.frame } else { None },
        };
        self.cycles += 1;
        debug!(%outcome, elapsed = ?outcome.elapsed, "cycle complete");

        let lines = match (outcome.target, outcome.command) {
            (Some(t), _) => Some(format!("Target {t}")),
            (None, Some(c)) => Some(format!("Command pan {:+.1} tilt {:+.1}", c.pan, c.tilt)),
            (None, None) => None,
        }
        .map(|cue_line| [cue_line, outcome.now.to_string()]);
        for sink in &self.sinks {
            for line in lines.iter().flatten() {
                sink.line(line);
            }
            sink.outcome(&outcome);
        }
        self.last.store(outcome.clone());
        Ok(outcome)
    }
}
