//! Seams to the camera and the vision algorithms.

use async_trait::async_trait;
use thiserror::Error;

use crate::geometry::{Frame, FrameGeometry, Point};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device error: {0}")]
    Device(String),
    #[error("could not decode frame: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detector model unavailable: {0}")]
    Model(String),
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Source of frames for the frame driven loop.
#[async_trait]
pub trait CaptureSource: Send {
    /// Geometry of the frames this source yields for the whole session.
    fn geometry(&self) -> FrameGeometry;

    /// Wait for the next frame. `Ok(None)` means the stream has ended.
    async fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

/// Locates the target in a frame.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when nothing was found.
    fn detect(&self, frame: &Frame) -> Result<Option<Point>, DetectError>;
}
