use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use pantilt::{Frame, TelemetrySink, TrackingOutcome};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::stream_bus::{StreamBus, StreamEvent};

/// Default gap between two transmitted images.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(600);

struct State {
    period: Duration,
    enabled: bool,
    last_sent: Option<Instant>,
}

/// Streams captured frames to viewers, at most one per period.
pub struct ImageSender {
    bus: Arc<StreamBus>,
    state: Mutex<State>,
}

impl ImageSender {
    pub fn new(bus: Arc<StreamBus>) -> Self {
        Self {
            bus,
            state: Mutex::new(State {
                period: DEFAULT_PERIOD,
                enabled: true,
                last_sent: None,
            }),
        }
    }

    pub fn set_period(&self, period: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.period = period;
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.enabled = enabled;
        }
    }

    pub fn period(&self) -> Duration {
        self.state.lock().map(|s| s.period).unwrap_or(DEFAULT_PERIOD)
    }

    fn due(&self) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if !state.enabled {
            return false;
        }
        let now = Instant::now();
        match state.last_sent {
            Some(last) if now.duration_since(last) < state.period => false,
            _ => {
                state.last_sent = Some(now);
                true
            }
        }
    }
}

/// JPEG encode a frame as base64.
pub fn encode_frame(frame: &Frame) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf).encode_image(frame.image.as_ref())?;
    Ok(BASE64.encode(buf))
}

impl TelemetrySink for ImageSender {
    fn outcome(&self, outcome: &TrackingOutcome) {
        let Some(frame) = &outcome.frame else {
            return;
        };
        if !self.due() {
            return;
        }
        match encode_frame(frame) {
            Ok(base64) => self.bus.send(StreamEvent::ImageReady { base64 }),
            Err(e) => warn!(error = %e, "could not encode frame for viewers"),
        }
    }
}
