//! Frame sources for the tracking loop.
//!
//! Both sources implement [`pantilt::CaptureSource`]: [`FileCapture`] replays
//! images from disk at a fixed frame rate and [`ChannelCapture`] decodes
//! frames pushed from elsewhere, such as a browser webcam.

pub mod channel;
pub mod eye;

pub use channel::ChannelCapture;
pub use eye::FileCapture;

use image::imageops::{self, FilterType};
use pantilt::{CaptureError, Frame, FrameGeometry};

/// Decode an encoded image (JPEG, PNG) into an RGB frame.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CaptureError> {
    let image = image::load_from_memory(bytes).map_err(|e| CaptureError::Decode(e.to_string()))?;
    Ok(Frame::new(image.to_rgb8()))
}

/// Scale `frame` to the session geometry so the frame centre never moves
/// within a session. Frames already at that size, or sessions of unknown size,
/// pass through untouched.
pub fn fit_frame(frame: Frame, geometry: FrameGeometry) -> Frame {
    if frame.geometry == geometry || !geometry.is_known() {
        return frame;
    }
    let scaled = imageops::resize(
        frame.image.as_ref(),
        geometry.width,
        geometry.height,
        FilterType::Triangle,
    );
    Frame::new(scaled)
}
