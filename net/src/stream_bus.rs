use pantilt::{PanTiltDelta, PanTiltSetting, Point, TelemetrySink, TrackingOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Serializable view of a [`TrackingOutcome`] without the captured frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OutcomeReport {
    pub strategy: String,
    pub prior: PanTiltSetting,
    pub now: PanTiltSetting,
    pub target: Option<Point>,
    pub command: Option<PanTiltDelta>,
    pub moved: bool,
    pub elapsed_ms: f64,
}

impl From<&TrackingOutcome> for OutcomeReport {
    fn from(o: &TrackingOutcome) -> Self {
        Self {
            strategy: o.strategy.clone(),
            prior: o.prior,
            now: o.now,
            target: o.target,
            command: o.command,
            moved: o.moved,
            elapsed_ms: o.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

/// Events pushed to remote viewers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum StreamEvent {
    /// Result of one control cycle.
    Outcome(OutcomeReport),
    /// Line for the mirrored console.
    ScreenLine { text: String },
    ScreenClear,
    /// Short notification.
    Toast { text: String },
    /// Base64 encoded JPEG of a captured frame.
    ImageReady { base64: String },
}

/// Broadcast channel for streaming events.
pub struct StreamBus {
    tx: broadcast::Sender<StreamEvent>,
}

impl StreamBus {
    /// Create a new bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn send(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }

    pub fn toast(&self, text: impl Into<String>) {
        self.send(StreamEvent::Toast { text: text.into() });
    }

    pub fn clear_screen(&self) {
        self.send(StreamEvent::ScreenClear);
    }

    pub fn sender(&self) -> broadcast::Sender<StreamEvent> {
        self.tx.clone()
    }
}

impl Default for StreamBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl TelemetrySink for StreamBus {
    fn outcome(&self, outcome: &TrackingOutcome) {
        self.send(StreamEvent::Outcome(outcome.into()));
    }

    fn line(&self, text: &str) {
        self.send(StreamEvent::ScreenLine {
            text: text.to_string(),
        });
    }
}
