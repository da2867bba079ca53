use crate::controller::TrackingOutcome;

/// Receives what the tracking core produces for remote display.
///
/// Transport is the implementor's concern; calls must not block.
pub trait TelemetrySink: Send + Sync {
    fn outcome(&self, outcome: &TrackingOutcome);

    /// A console line for the remote screen.
    fn line(&self, _text: &str) {}
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn outcome(&self, _outcome: &TrackingOutcome) {}
}
