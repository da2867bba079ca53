use async_trait::async_trait;
use pantilt::{CaptureError, CaptureSource, Frame, FrameGeometry};
use tokio::sync::mpsc;
use tracing::warn;

use crate::{decode_frame, fit_frame};

/// Frames pushed as encoded images through a channel.
///
/// Frames whose size differs from the session geometry are scaled to it, so
/// the geometry stays fixed for the session. Undecodable frames are skipped.
pub struct ChannelCapture {
    rx: mpsc::Receiver<Vec<u8>>,
    geometry: FrameGeometry,
}

impl ChannelCapture {
    /// Create a source and the sender feeding it. The stream ends once every
    /// sender is dropped.
    pub fn channel(capacity: usize, geometry: FrameGeometry) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx, geometry })
    }
}

#[async_trait]
impl CaptureSource for ChannelCapture {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        while let Some(bytes) = self.rx.recv().await {
            let frame = match decode_frame(&bytes) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "dropping undecodable frame");
                    continue;
                }
            };
            return Ok(Some(fit_frame(frame, self.geometry)));
        }
        Ok(None)
    }
}
