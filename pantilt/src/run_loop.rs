//! Scheduling of control cycles: per captured frame, or on a fixed timer for
//! manual control.
//!
//! Stopping is cooperative. The stop flag is checked between cycles, never
//! during one, so the mechanism is not left half way through a move. Neither
//! loop re-centres the mount on exit.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::capture::{CaptureSource, Detector};
use crate::config::FailurePolicy;
use crate::controller::{OutcomeHandle, TrackingController, TrackingInput};
use crate::mechanism::MechanismLease;
use crate::position::{PanTiltDelta, PanTiltSetting};

const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("mechanism is already driven by another run loop")]
    MechanismBusy,
    #[error("run loop task failed: {0}")]
    Task(String),
}

/// Cooperative stop flag shared with a running loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Pending manual moves for the timer driven loop.
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<PanTiltDelta>,
}

impl CommandQueue {
    /// Create a queue and the sender feeding it.
    pub fn channel() -> (mpsc::UnboundedSender<PanTiltDelta>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Take the most recent pending command, discarding older ones.
    pub fn latest(&mut self) -> Option<PanTiltDelta> {
        let mut latest = None;
        while let Ok(delta) = self.rx.try_recv() {
            latest = Some(delta);
        }
        latest
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    EndOfStream,
    ActuatorFailure,
    CaptureFailure,
}

/// Totals reported when a loop ends.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub moves: u64,
    pub errors: u64,
    pub reason: StopReason,
    pub final_position: PanTiltSetting,
}

/// How cycles are triggered.
pub enum Schedule {
    /// One cycle per captured frame; waits on the camera.
    Frames {
        capture: Box<dyn CaptureSource>,
        detector: Arc<dyn Detector>,
        timeout: Duration,
    },
    /// One cycle per period, applying the latest manual command.
    Timer {
        period: Duration,
        commands: CommandQueue,
    },
}

pub struct RunLoop {
    controller: TrackingController,
    schedule: Schedule,
    policy: FailurePolicy,
    stop: StopHandle,
}

impl RunLoop {
    pub fn frames(
        controller: TrackingController,
        capture: Box<dyn CaptureSource>,
        detector: Arc<dyn Detector>,
    ) -> Self {
        Self::new(
            controller,
            Schedule::Frames {
                capture,
                detector,
                timeout: DEFAULT_FRAME_TIMEOUT,
            },
        )
    }

    pub fn timer(controller: TrackingController, period: Duration, commands: CommandQueue) -> Self {
        Self::new(controller, Schedule::Timer { period, commands })
    }

    pub fn new(controller: TrackingController, schedule: Schedule) -> Self {
        Self {
            controller,
            schedule,
            policy: FailurePolicy::default(),
            stop: StopHandle::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Longest wait for a frame before re-checking the stop flag.
    pub fn with_frame_timeout(mut self, limit: Duration) -> Self {
        if let Schedule::Frames { timeout, .. } = &mut self.schedule {
            *timeout = limit;
        }
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn outcome_handle(&self) -> OutcomeHandle {
        self.controller.outcome_handle()
    }

    /// Spawn the loop on the current tokio runtime.
    pub fn start(self) -> Result<RunningLoop, LoopError> {
        let lease = self
            .controller
            .mechanism()
            .claim()
            .ok_or(LoopError::MechanismBusy)?;
        let stop = self.stop.clone();
        let outcomes = self.controller.outcome_handle();
        let handle = tokio::spawn(self.drive(lease));
        Ok(RunningLoop {
            stop,
            outcomes,
            handle,
        })
    }

    /// Run the loop to completion on the current task.
    pub async fn run(self) -> Result<RunSummary, LoopError> {
        let lease = self
            .controller
            .mechanism()
            .claim()
            .ok_or(LoopError::MechanismBusy)?;
        Ok(self.drive(lease).await)
    }

    async fn drive(self, _lease: MechanismLease) -> RunSummary {
        let RunLoop {
            mut controller,
            schedule,
            policy,
            stop,
        } = self;
        let mut tally = Tally::default();
        info!(strategy = controller.strategy_name(), "run loop starting");
        let reason = match schedule {
            Schedule::Frames {
                capture,
                detector,
                timeout,
            } => {
                frame_loop(&mut controller, capture, detector, timeout, policy, &stop, &mut tally).await
            }
            Schedule::Timer { period, commands } => {
                timer_loop(&mut controller, period, commands, policy, &stop, &mut tally).await
            }
        };
        let final_position = controller.mechanism().current_position().await;
        info!(?reason, cycles = tally.cycles, moves = tally.moves, %final_position, "run loop stopped");
        RunSummary {
            cycles: tally.cycles,
            moves: tally.moves,
            errors: tally.errors,
            reason,
            final_position,
        }
    }
}

#[derive(Default)]
struct Tally {
    cycles: u64,
    moves: u64,
    errors: u64,
}

/// Run one cycle. Returns a stop reason when the policy says to quit.
async fn cycle(
    controller: &mut TrackingController,
    input: TrackingInput,
    policy: FailurePolicy,
    tally: &mut Tally,
) -> Option<StopReason> {
    match controller.process(input).await {
        Ok(outcome) => {
            tally.cycles += 1;
            if outcome.moved {
                tally.moves += 1;
            }
            None
        }
        Err(e) => {
            tally.errors += 1;
            error!(error = %e, "tracking cycle failed");
            match policy {
                FailurePolicy::Stop => Some(StopReason::ActuatorFailure),
                FailurePolicy::Continue => None,
            }
        }
    }
}

async fn frame_loop(
    controller: &mut TrackingController,
    mut capture: Box<dyn CaptureSource>,
    detector: Arc<dyn Detector>,
    timeout: Duration,
    policy: FailurePolicy,
    stop: &StopHandle,
    tally: &mut Tally,
) -> StopReason {
    loop {
        if stop.is_stopped() {
            return StopReason::Requested;
        }
        let frame = match time::timeout(timeout, capture.next_frame()).await {
            Err(_) => {
                warn!(?timeout, "no frame captured in time");
                continue;
            }
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => return StopReason::EndOfStream,
            Ok(Err(e)) => {
                error!(error = %e, "capture failed");
                return StopReason::CaptureFailure;
            }
        };

        let started = Instant::now();
        let worker = detector.clone();
        let job = frame.clone();
        let target = match tokio::task::spawn_blocking(move || worker.detect(&job)).await {
            Ok(Ok(target)) => target,
            Ok(Err(e)) => {
                warn!(error = %e, detector = detector.name(), "detection failed");
                None
            }
            Err(e) => {
                error!(error = %e, detector = detector.name(), "detector task failed");
                None
            }
        };

        let input = TrackingInput::detection(target)
            .with_frame(frame)
            .started_at(started);
        if let Some(reason) = cycle(controller, input, policy, tally).await {
            return reason;
        }
    }
}

async fn timer_loop(
    controller: &mut TrackingController,
    period: Duration,
    mut commands: CommandQueue,
    policy: FailurePolicy,
    stop: &StopHandle,
    tally: &mut Tally,
) -> StopReason {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if stop.is_stopped() {
            return StopReason::Requested;
        }
        let input = match commands.latest() {
            Some(delta) => TrackingInput::command(delta),
            None => TrackingInput::nothing(),
        };
        if let Some(reason) = cycle(controller, input, policy, tally).await {
            return reason;
        }
    }
}

/// A loop spawned with [`RunLoop::start`].
pub struct RunningLoop {
    stop: StopHandle,
    outcomes: OutcomeHandle,
    handle: JoinHandle<RunSummary>,
}

impl RunningLoop {
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn outcome_handle(&self) -> OutcomeHandle {
        self.outcomes.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the loop to stop after its current cycle and wait for it.
    pub async fn stop(self) -> Result<RunSummary, LoopError> {
        self.stop.stop();
        self.join().await
    }

    /// Wait for the loop to end on its own.
    pub async fn join(self) -> Result<RunSummary, LoopError> {
        self.handle
            .await
            .map_err(|e| LoopError::Task(e.to_string()))
    }
}
